use super::{check_resolution, expect_color, expect_float, unknown, ParamMap, ParamValue, Stage, StageContext, StageKind};
use crate::distortion::DistortionParams;
use crate::error::StageError;
use crate::frame::Frame;
use glam::{Vec2, Vec3};

/// Remaps sampling coordinates through [`DistortionParams::forward`]: the
/// output pixel at centered position `p` shows the input at `forward(p)`.
/// Samples that land outside the source are left as `fill`; later stages
/// (vignette, frame mask) hide them.
#[derive(Clone, Debug)]
pub struct BarrelDistortion {
    pub enabled: bool,
    pub params: DistortionParams,
    pub fill: Vec3,
}

impl Default for BarrelDistortion {
    fn default() -> Self {
        Self {
            enabled: true,
            params: DistortionParams::default(),
            fill: Vec3::ZERO,
        }
    }
}

impl BarrelDistortion {
    pub fn effective(&self) -> DistortionParams {
        if self.enabled && !self.params.is_identity() {
            self.params
        } else {
            DistortionParams::IDENTITY
        }
    }
}

#[inline]
fn inside_unit(uv: Vec2) -> bool {
    (0.0..=1.0).contains(&uv.x) && (0.0..=1.0).contains(&uv.y)
}

impl Stage for BarrelDistortion {
    fn kind(&self) -> StageKind {
        StageKind::BarrelDistortion
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn params(&self) -> ParamMap {
        let mut m = ParamMap::default();
        m.insert("distortion", ParamValue::Float(self.params.distortion));
        m.insert("scale", ParamValue::Float(self.params.scale));
        m.insert("fill", ParamValue::Color(self.fill));
        m
    }

    fn set_param(&mut self, name: &str, value: ParamValue) -> Result<(), StageError> {
        let kind = self.kind();
        match name {
            "distortion" => self.params.distortion = expect_float(kind, name, value)?,
            "scale" => self.params.scale = expect_float(kind, name, value)?,
            "fill" => self.fill = expect_color(kind, name, value)?,
            _ => return Err(unknown(kind, name)),
        }
        Ok(())
    }

    fn packed(&self) -> [[f32; 4]; 3] {
        let p = self.effective();
        [
            [p.distortion, p.scale, 0.0, 0.0],
            [self.fill.x, self.fill.y, self.fill.z, 0.0],
            [0.0; 4],
        ]
    }

    fn apply(&self, input: &Frame, ctx: &StageContext) -> Result<Frame, StageError> {
        check_resolution(self.kind(), input, 1, ctx)?;
        let params = self.effective();
        if params.is_identity() {
            return Ok(input.clone());
        }
        Ok(input.map_uv(|_, centered, _| {
            let src = params.forward(centered) * 0.5 + Vec2::splat(0.5);
            if inside_unit(src) {
                input.sample(src)
            } else {
                self.fill
            }
        }))
    }
}
