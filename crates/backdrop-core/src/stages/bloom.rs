use super::{check_resolution, expect_float, unknown, ParamMap, ParamValue, Stage, StageContext, StageKind};
use crate::constants::{BLOOM_BLUR_WEIGHTS, BLOOM_INTENSITY, BLOOM_LUMINANCE_SMOOTHING, BLOOM_LUMINANCE_THRESHOLD};
use crate::error::StageError;
use crate::frame::{luminance, smoothstep, Frame};
use glam::Vec3;

/// Bright-pass extraction at half resolution, separable blur, additive
/// composite. Same pass structure as the GPU path (bright, blur h, blur v,
/// composite).
#[derive(Clone, Debug)]
pub struct Bloom {
    pub enabled: bool,
    pub intensity: f32,
    pub luminance_threshold: f32,
    pub luminance_smoothing: f32,
}

impl Default for Bloom {
    fn default() -> Self {
        Self {
            enabled: true,
            intensity: BLOOM_INTENSITY,
            luminance_threshold: BLOOM_LUMINANCE_THRESHOLD,
            luminance_smoothing: BLOOM_LUMINANCE_SMOOTHING,
        }
    }
}

impl Bloom {
    pub fn effective_intensity(&self) -> f32 {
        if self.enabled {
            self.intensity.max(0.0)
        } else {
            0.0
        }
    }

    fn bright(&self, c: Vec3) -> Vec3 {
        let lo = self.luminance_threshold;
        let hi = lo + self.luminance_smoothing.max(0.0);
        c * smoothstep(lo, hi, luminance(c))
    }

    fn bright_half(&self, input: &Frame) -> Frame {
        let w = (input.width() / 2).max(1);
        let h = (input.height() / 2).max(1);
        let mut out = Frame::new(w, h);
        for y in 0..h {
            for x in 0..w {
                let (sx, sy) = (x as i64 * 2, y as i64 * 2);
                let sum = self.bright(input.fetch(sx, sy))
                    + self.bright(input.fetch(sx + 1, sy))
                    + self.bright(input.fetch(sx, sy + 1))
                    + self.bright(input.fetch(sx + 1, sy + 1));
                out.set(x, y, sum * 0.25);
            }
        }
        out
    }
}

fn blur(src: &Frame, horizontal: bool) -> Frame {
    let mut out = Frame::new(src.width(), src.height());
    for y in 0..src.height() {
        for x in 0..src.width() {
            let (x, y) = (x as i64, y as i64);
            let mut acc = src.fetch(x, y) * BLOOM_BLUR_WEIGHTS[0];
            for (i, w) in BLOOM_BLUR_WEIGHTS.iter().enumerate().skip(1) {
                let o = i as i64;
                let (a, b) = if horizontal {
                    (src.fetch(x + o, y), src.fetch(x - o, y))
                } else {
                    (src.fetch(x, y + o), src.fetch(x, y - o))
                };
                acc += (a + b) * *w;
            }
            out.set(x as u32, y as u32, acc);
        }
    }
    out
}

impl Stage for Bloom {
    fn kind(&self) -> StageKind {
        StageKind::Bloom
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn params(&self) -> ParamMap {
        let mut m = ParamMap::default();
        m.insert("intensity", ParamValue::Float(self.intensity));
        m.insert("luminanceThreshold", ParamValue::Float(self.luminance_threshold));
        m.insert("luminanceSmoothing", ParamValue::Float(self.luminance_smoothing));
        m
    }

    fn set_param(&mut self, name: &str, value: ParamValue) -> Result<(), StageError> {
        let kind = self.kind();
        match name {
            "intensity" => self.intensity = expect_float(kind, name, value)?,
            "luminanceThreshold" => self.luminance_threshold = expect_float(kind, name, value)?,
            "luminanceSmoothing" => self.luminance_smoothing = expect_float(kind, name, value)?,
            _ => return Err(unknown(kind, name)),
        }
        Ok(())
    }

    fn packed(&self) -> [[f32; 4]; 3] {
        [
            [
                self.effective_intensity(),
                self.luminance_threshold,
                self.luminance_smoothing.max(0.0),
                0.0,
            ],
            [0.0; 4],
            [0.0; 4],
        ]
    }

    fn apply(&self, input: &Frame, ctx: &StageContext) -> Result<Frame, StageError> {
        check_resolution(self.kind(), input, 2, ctx)?;
        let intensity = self.effective_intensity();
        if intensity == 0.0 {
            return Ok(input.clone());
        }
        let bloom = blur(&blur(&self.bright_half(input), true), false);
        Ok(input.map_uv(|uv, _, c| c + bloom.sample(uv) * intensity))
    }
}
