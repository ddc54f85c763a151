use super::{check_resolution, expect_color, expect_float, unknown, ParamMap, ParamValue, Stage, StageContext, StageKind};
use crate::constants::{
    PHOSPHOR_BLUR_RADIUS_PX, PHOSPHOR_GATE_HIGH, PHOSPHOR_GATE_LOW, PHOSPHOR_GLOW_COLOR, PHOSPHOR_INTENSITY,
    PHOSPHOR_KERNEL, PHOSPHOR_TINT_MIX,
};
use crate::error::StageError;
use crate::frame::{luminance, smoothstep, Frame};
use glam::{Vec2, Vec3};

/// Phosphor persistence glow: 3x3 weighted blur, luminance-gated blend toward
/// the glow color, additive composite, then a slight tint toward the glow.
#[derive(Clone, Debug)]
pub struct PhosphorGlow {
    pub enabled: bool,
    pub glow_color: Vec3,
    pub intensity: f32,
    pub blur_radius_px: f32,
}

impl Default for PhosphorGlow {
    fn default() -> Self {
        Self {
            enabled: true,
            glow_color: PHOSPHOR_GLOW_COLOR,
            intensity: PHOSPHOR_INTENSITY,
            blur_radius_px: PHOSPHOR_BLUR_RADIUS_PX,
        }
    }
}

impl PhosphorGlow {
    pub fn effective_intensity(&self) -> f32 {
        if self.enabled {
            self.intensity.max(0.0)
        } else {
            0.0
        }
    }

    fn shade(&self, color: Vec3, blurred: Vec3, intensity: f32) -> Vec3 {
        let lum = luminance(blurred);
        let gate = smoothstep(PHOSPHOR_GATE_LOW, PHOSPHOR_GATE_HIGH, lum);
        let glow = blurred.lerp(self.glow_color * lum, gate) * gate * intensity;
        let lit = color + glow;
        lit.lerp(lit * self.glow_color, PHOSPHOR_TINT_MIX * intensity.min(1.0))
    }
}

impl Stage for PhosphorGlow {
    fn kind(&self) -> StageKind {
        StageKind::PhosphorGlow
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn params(&self) -> ParamMap {
        let mut m = ParamMap::default();
        m.insert("glowColor", ParamValue::Color(self.glow_color));
        m.insert("intensity", ParamValue::Float(self.intensity));
        m.insert("blurRadiusPx", ParamValue::Float(self.blur_radius_px));
        m
    }

    fn set_param(&mut self, name: &str, value: ParamValue) -> Result<(), StageError> {
        let kind = self.kind();
        match name {
            "glowColor" => self.glow_color = expect_color(kind, name, value)?,
            "intensity" => self.intensity = expect_float(kind, name, value)?,
            "blurRadiusPx" => self.blur_radius_px = expect_float(kind, name, value)?.max(0.0),
            _ => return Err(unknown(kind, name)),
        }
        Ok(())
    }

    fn packed(&self) -> [[f32; 4]; 3] {
        let c = self.glow_color;
        [
            [c.x, c.y, c.z, self.effective_intensity()],
            [self.blur_radius_px, PHOSPHOR_TINT_MIX, PHOSPHOR_GATE_LOW, PHOSPHOR_GATE_HIGH],
            [0.0; 4],
        ]
    }

    fn apply(&self, input: &Frame, ctx: &StageContext) -> Result<Frame, StageError> {
        check_resolution(self.kind(), input, 1, ctx)?;
        let intensity = self.effective_intensity();
        if intensity == 0.0 {
            return Ok(input.clone());
        }
        let texel = Vec2::new(1.0 / input.width() as f32, 1.0 / input.height() as f32) * self.blur_radius_px;
        Ok(input.map_uv(|uv, _, c| {
            let mut blurred = Vec3::ZERO;
            for (i, w) in PHOSPHOR_KERNEL.iter().enumerate() {
                let dx = (i % 3) as f32 - 1.0;
                let dy = (i / 3) as f32 - 1.0;
                blurred += input.sample(uv + Vec2::new(dx, dy) * texel) * *w;
            }
            self.shade(c, blurred, intensity)
        }))
    }
}
