use super::{check_resolution, expect_vector, unknown, ParamMap, ParamValue, Stage, StageContext, StageKind};
use crate::constants::CHROMATIC_OFFSET;
use crate::error::StageError;
use crate::frame::Frame;
use glam::{Vec2, Vec3};

/// Samples red at `uv + offset`, green at `uv`, blue at `uv - offset`.
#[derive(Clone, Debug)]
pub struct ChromaticAberration {
    pub enabled: bool,
    pub offset: Vec2,
}

impl Default for ChromaticAberration {
    fn default() -> Self {
        Self {
            enabled: true,
            offset: CHROMATIC_OFFSET,
        }
    }
}

impl ChromaticAberration {
    pub fn effective_offset(&self) -> Vec2 {
        if self.enabled {
            self.offset
        } else {
            Vec2::ZERO
        }
    }
}

impl Stage for ChromaticAberration {
    fn kind(&self) -> StageKind {
        StageKind::ChromaticAberration
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn params(&self) -> ParamMap {
        let mut m = ParamMap::default();
        m.insert("offset", ParamValue::Vector(self.offset));
        m
    }

    fn set_param(&mut self, name: &str, value: ParamValue) -> Result<(), StageError> {
        match name {
            "offset" => self.offset = expect_vector(self.kind(), name, value)?,
            _ => return Err(unknown(self.kind(), name)),
        }
        Ok(())
    }

    fn packed(&self) -> [[f32; 4]; 3] {
        let o = self.effective_offset();
        [[o.x, o.y, 0.0, 0.0], [0.0; 4], [0.0; 4]]
    }

    fn apply(&self, input: &Frame, ctx: &StageContext) -> Result<Frame, StageError> {
        check_resolution(self.kind(), input, 1, ctx)?;
        let offset = self.effective_offset();
        if offset == Vec2::ZERO {
            return Ok(input.clone());
        }
        Ok(input.map_uv(|uv, _, c| {
            let r = input.sample(uv + offset).x;
            let b = input.sample(uv - offset).z;
            Vec3::new(r, c.y, b)
        }))
    }
}
