use super::{check_resolution, expect_float, unknown, ParamMap, ParamValue, Stage, StageContext, StageKind};
use crate::constants::{FRAME_BORDER_RADIUS, FRAME_BORDER_SOFTNESS, FRAME_MASK_DISABLED_RADIUS, FRAME_MASK_EXPONENT};
use crate::error::StageError;
use crate::frame::{smoothstep, Frame};
use glam::{Vec2, Vec3};

/// Rounded-rectangle mask, always the last stage. Pixels whose
/// `|x|^2.5 + |y|^2.5` exceeds the radius are forced to black whatever the
/// upstream stages wrote; a band of width `softness` inside the radius fades.
#[derive(Clone, Debug)]
pub struct FrameMask {
    pub enabled: bool,
    pub border_radius: f32,
    pub border_softness: f32,
}

impl Default for FrameMask {
    fn default() -> Self {
        Self {
            enabled: true,
            border_radius: FRAME_BORDER_RADIUS,
            border_softness: FRAME_BORDER_SOFTNESS,
        }
    }
}

/// Superellipse distance over centered coordinates.
#[inline]
pub fn frame_distance(centered: Vec2) -> f32 {
    centered.x.abs().powf(FRAME_MASK_EXPONENT) + centered.y.abs().powf(FRAME_MASK_EXPONENT)
}

impl FrameMask {
    pub fn effective_radius(&self) -> f32 {
        if self.enabled {
            self.border_radius
        } else {
            FRAME_MASK_DISABLED_RADIUS
        }
    }

    /// Coverage in [0, 1] at a centered position; exactly 0 past the radius.
    pub fn coverage(&self, centered: Vec2) -> f32 {
        let radius = self.effective_radius();
        let dist = frame_distance(centered);
        if dist > radius {
            return 0.0;
        }
        let softness = self.border_softness.max(0.0);
        1.0 - smoothstep(radius - softness, radius, dist)
    }
}

impl Stage for FrameMask {
    fn kind(&self) -> StageKind {
        StageKind::FrameMask
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn params(&self) -> ParamMap {
        let mut m = ParamMap::default();
        m.insert("borderRadius", ParamValue::Float(self.border_radius));
        m.insert("borderSoftness", ParamValue::Float(self.border_softness));
        m
    }

    fn set_param(&mut self, name: &str, value: ParamValue) -> Result<(), StageError> {
        let kind = self.kind();
        match name {
            "borderRadius" => self.border_radius = expect_float(kind, name, value)?,
            "borderSoftness" => self.border_softness = expect_float(kind, name, value)?,
            _ => return Err(unknown(kind, name)),
        }
        Ok(())
    }

    fn packed(&self) -> [[f32; 4]; 3] {
        [
            [self.effective_radius(), self.border_softness.max(0.0), FRAME_MASK_EXPONENT, 0.0],
            [0.0; 4],
            [0.0; 4],
        ]
    }

    fn apply(&self, input: &Frame, ctx: &StageContext) -> Result<Frame, StageError> {
        check_resolution(self.kind(), input, 1, ctx)?;
        Ok(input.map_uv(|_, centered, c| {
            let coverage = self.coverage(centered);
            if coverage == 0.0 {
                Vec3::ZERO
            } else {
                c * coverage
            }
        }))
    }
}
