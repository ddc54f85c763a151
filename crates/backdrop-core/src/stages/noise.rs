use super::{check_resolution, expect_float, unknown, ParamMap, ParamValue, Stage, StageContext, StageKind};
use crate::constants::{NOISE_OPACITY, NOISE_SEED};
use crate::error::StageError;
use crate::frame::Frame;
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Additive monochrome grain. The generator is reseeded from the frame index,
/// so a frame renders identically when replayed.
#[derive(Clone, Debug)]
pub struct Noise {
    pub enabled: bool,
    pub opacity: f32,
}

impl Default for Noise {
    fn default() -> Self {
        Self {
            enabled: true,
            opacity: NOISE_OPACITY,
        }
    }
}

impl Noise {
    pub fn effective_opacity(&self) -> f32 {
        if self.enabled {
            self.opacity.max(0.0)
        } else {
            0.0
        }
    }
}

impl Stage for Noise {
    fn kind(&self) -> StageKind {
        StageKind::Noise
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn params(&self) -> ParamMap {
        let mut m = ParamMap::default();
        m.insert("opacity", ParamValue::Float(self.opacity));
        m
    }

    fn set_param(&mut self, name: &str, value: ParamValue) -> Result<(), StageError> {
        match name {
            "opacity" => self.opacity = expect_float(self.kind(), name, value)?,
            _ => return Err(unknown(self.kind(), name)),
        }
        Ok(())
    }

    fn packed(&self) -> [[f32; 4]; 3] {
        [[self.effective_opacity(), 0.0, 0.0, 0.0], [0.0; 4], [0.0; 4]]
    }

    fn apply(&self, input: &Frame, ctx: &StageContext) -> Result<Frame, StageError> {
        check_resolution(self.kind(), input, 1, ctx)?;
        let opacity = self.effective_opacity();
        if opacity == 0.0 {
            return Ok(input.clone());
        }
        let mut rng = StdRng::seed_from_u64(NOISE_SEED ^ ctx.frame_index);
        let mut out = input.clone();
        for p in out.pixels_mut() {
            *p += Vec3::splat(rng.gen::<f32>() * opacity);
        }
        Ok(out)
    }
}
