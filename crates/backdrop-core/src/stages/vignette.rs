use super::{check_resolution, expect_float, unknown, ParamMap, ParamValue, Stage, StageContext, StageKind};
use crate::constants::{VIGNETTE_DARKNESS, VIGNETTE_OFFSET};
use crate::error::StageError;
use crate::frame::{smoothstep, Frame};
use std::f32::consts::SQRT_2;

/// Radial darkening. Distance is normalized so the corners sit at 1; the
/// falloff starts at `offset` and reaches `darkness` at the corners.
#[derive(Clone, Debug)]
pub struct Vignette {
    pub enabled: bool,
    pub offset: f32,
    pub darkness: f32,
}

impl Default for Vignette {
    fn default() -> Self {
        Self {
            enabled: true,
            offset: VIGNETTE_OFFSET,
            darkness: VIGNETTE_DARKNESS,
        }
    }
}

impl Vignette {
    pub fn effective_darkness(&self) -> f32 {
        if self.enabled {
            self.darkness.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

impl Stage for Vignette {
    fn kind(&self) -> StageKind {
        StageKind::Vignette
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn params(&self) -> ParamMap {
        let mut m = ParamMap::default();
        m.insert("offset", ParamValue::Float(self.offset));
        m.insert("darkness", ParamValue::Float(self.darkness));
        m
    }

    fn set_param(&mut self, name: &str, value: ParamValue) -> Result<(), StageError> {
        let kind = self.kind();
        match name {
            "offset" => self.offset = expect_float(kind, name, value)?,
            "darkness" => self.darkness = expect_float(kind, name, value)?,
            _ => return Err(unknown(kind, name)),
        }
        Ok(())
    }

    fn packed(&self) -> [[f32; 4]; 3] {
        [[self.offset, self.effective_darkness(), 0.0, 0.0], [0.0; 4], [0.0; 4]]
    }

    fn apply(&self, input: &Frame, ctx: &StageContext) -> Result<Frame, StageError> {
        check_resolution(self.kind(), input, 1, ctx)?;
        let darkness = self.effective_darkness();
        if darkness == 0.0 {
            return Ok(input.clone());
        }
        Ok(input.map_uv(|_, centered, c| {
            let d = centered.length() / SQRT_2;
            c * (1.0 - darkness * smoothstep(self.offset, 1.0, d))
        }))
    }
}
