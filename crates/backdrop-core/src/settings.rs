//! Theme/settings record consumed by the composer and pointer correction.
//!
//! Values arrive from the host's key/value settings store as strings with
//! camelCase keys (`enableBloom=true`, `crtDistortion=0.15`,
//! `phosphorGlowColor=#00ffcc`).

use crate::constants::*;
use crate::distortion::DistortionParams;
use crate::error::SettingsError;
use crate::pointer::CorrectionMode;
use crate::quality::QualityLevel;
use crate::stages::StageKind;
use glam::{Vec2, Vec3};

#[derive(Clone, Debug, PartialEq)]
pub struct EffectSettings {
    pub enable_bloom: bool,
    pub bloom_intensity: f32,
    pub bloom_luminance_threshold: f32,
    pub bloom_luminance_smoothing: f32,

    pub enable_chromatic_aberration: bool,
    pub chromatic_offset: Vec2,

    pub enable_crt_distortion: bool,
    pub crt_distortion: f32,
    pub crt_distortion_scale: f32,

    pub enable_phosphor_glow: bool,
    pub phosphor_glow_color: Vec3,
    pub phosphor_glow_intensity: f32,
    pub phosphor_glow_blur_radius: f32,

    pub enable_vignette: bool,
    pub vignette_offset: f32,
    pub vignette_darkness: f32,

    pub enable_noise: bool,
    pub noise_opacity: f32,

    pub enable_frame_mask: bool,
    pub frame_border_radius: f32,
    pub frame_border_softness: f32,

    pub enable_pointer_correction: bool,
    pub pointer_correction_mode: CorrectionMode,

    /// `None` when the stored level is not recognized.
    pub quality: Option<QualityLevel>,
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            enable_bloom: true,
            bloom_intensity: BLOOM_INTENSITY,
            bloom_luminance_threshold: BLOOM_LUMINANCE_THRESHOLD,
            bloom_luminance_smoothing: BLOOM_LUMINANCE_SMOOTHING,
            enable_chromatic_aberration: true,
            chromatic_offset: CHROMATIC_OFFSET,
            enable_crt_distortion: true,
            crt_distortion: DEFAULT_DISTORTION,
            crt_distortion_scale: DEFAULT_DISTORTION_SCALE,
            enable_phosphor_glow: true,
            phosphor_glow_color: PHOSPHOR_GLOW_COLOR,
            phosphor_glow_intensity: PHOSPHOR_INTENSITY,
            phosphor_glow_blur_radius: PHOSPHOR_BLUR_RADIUS_PX,
            enable_vignette: true,
            vignette_offset: VIGNETTE_OFFSET,
            vignette_darkness: VIGNETTE_DARKNESS,
            enable_noise: true,
            noise_opacity: NOISE_OPACITY,
            enable_frame_mask: true,
            frame_border_radius: FRAME_BORDER_RADIUS,
            frame_border_softness: FRAME_BORDER_SOFTNESS,
            enable_pointer_correction: true,
            pointer_correction_mode: CorrectionMode::Forward,
            quality: Some(QualityLevel::default()),
        }
    }
}

impl EffectSettings {
    /// Every stage switched off; the chain becomes a pass-through.
    pub fn all_disabled() -> Self {
        let mut s = Self::default();
        for kind in StageKind::ORDER {
            s.set_stage_enabled(kind, false);
        }
        s
    }

    pub fn stage_enabled(&self, kind: StageKind) -> bool {
        match kind {
            StageKind::Bloom => self.enable_bloom,
            StageKind::ChromaticAberration => self.enable_chromatic_aberration,
            StageKind::BarrelDistortion => self.enable_crt_distortion,
            StageKind::PhosphorGlow => self.enable_phosphor_glow,
            StageKind::Vignette => self.enable_vignette,
            StageKind::Noise => self.enable_noise,
            StageKind::FrameMask => self.enable_frame_mask,
        }
    }

    pub fn set_stage_enabled(&mut self, kind: StageKind, enabled: bool) {
        let flag = match kind {
            StageKind::Bloom => &mut self.enable_bloom,
            StageKind::ChromaticAberration => &mut self.enable_chromatic_aberration,
            StageKind::BarrelDistortion => &mut self.enable_crt_distortion,
            StageKind::PhosphorGlow => &mut self.enable_phosphor_glow,
            StageKind::Vignette => &mut self.enable_vignette,
            StageKind::Noise => &mut self.enable_noise,
            StageKind::FrameMask => &mut self.enable_frame_mask,
        };
        *flag = enabled;
    }

    /// Flips one stage's toggle and returns the new state.
    pub fn toggle_stage(&mut self, kind: StageKind) -> bool {
        let enabled = !self.stage_enabled(kind);
        self.set_stage_enabled(kind, enabled);
        enabled
    }

    pub fn distortion_params(&self) -> DistortionParams {
        DistortionParams::new(self.crt_distortion, self.crt_distortion_scale)
    }

    /// Applies one stored setting. Unknown quality names are accepted and
    /// fall back to the default DPR later.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        if let Some(kind) = StageKind::ORDER.into_iter().find(|k| k.toggle_key() == key) {
            self.set_stage_enabled(kind, parse_bool(key, value)?);
            return Ok(());
        }
        match key {
            "bloomIntensity" => self.bloom_intensity = parse_f32(key, value)?,
            "bloomLuminanceThreshold" => self.bloom_luminance_threshold = parse_f32(key, value)?,
            "bloomLuminanceSmoothing" => self.bloom_luminance_smoothing = parse_f32(key, value)?,
            "chromaticAberrationOffset" => self.chromatic_offset = parse_vec2(key, value)?,
            "crtDistortion" => self.crt_distortion = parse_f32(key, value)?,
            "crtDistortionScale" => self.crt_distortion_scale = parse_f32(key, value)?,
            "phosphorGlowColor" => self.phosphor_glow_color = parse_color(key, value)?,
            "phosphorGlowIntensity" => self.phosphor_glow_intensity = parse_f32(key, value)?,
            "phosphorGlowBlurRadius" => self.phosphor_glow_blur_radius = parse_f32(key, value)?,
            "vignetteOffset" => self.vignette_offset = parse_f32(key, value)?,
            "vignetteDarkness" => self.vignette_darkness = parse_f32(key, value)?,
            "noiseOpacity" => self.noise_opacity = parse_f32(key, value)?,
            "frameBorderRadius" => self.frame_border_radius = parse_f32(key, value)?,
            "frameBorderSoftness" => self.frame_border_softness = parse_f32(key, value)?,
            "enablePointerCorrection" => self.enable_pointer_correction = parse_bool(key, value)?,
            "pointerCorrectionMode" => {
                self.pointer_correction_mode = match value.trim() {
                    "forward" => CorrectionMode::Forward,
                    "inverse" => CorrectionMode::Inverse,
                    _ => return Err(invalid(key, value)),
                }
            }
            "quality" => {
                self.quality = value.parse().ok();
                if self.quality.is_none() {
                    log::warn!("[settings] unknown quality `{}`, using fallback DPR", value);
                }
            }
            _ => return Err(SettingsError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// Builds a record from `key=value` strings applied over the defaults.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = &'a str>) -> Result<Self, SettingsError> {
        let mut s = Self::default();
        for pair in pairs {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| SettingsError::MalformedPair(pair.to_string()))?;
            s.apply(key.trim(), value.trim())?;
        }
        Ok(s)
    }
}

fn invalid(key: &str, value: &str) -> SettingsError {
    SettingsError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, SettingsError> {
    match value.trim() {
        "true" | "1" | "on" => Ok(true),
        "false" | "0" | "off" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

fn parse_f32(key: &str, value: &str) -> Result<f32, SettingsError> {
    value
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(key, value))
}

fn parse_vec2(key: &str, value: &str) -> Result<Vec2, SettingsError> {
    let mut parts = value.split(',');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(x), Some(y), None) => Ok(Vec2::new(parse_f32(key, x)?, parse_f32(key, y)?)),
        _ => Err(invalid(key, value)),
    }
}

/// `#rrggbb` hex or `r,g,b` floats.
fn parse_color(key: &str, value: &str) -> Result<Vec3, SettingsError> {
    let v = value.trim();
    if let Some(hex) = v.strip_prefix('#') {
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid(key, value));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map(|c| c as f32 / 255.0)
                .map_err(|_| invalid(key, value))
        };
        return Ok(Vec3::new(channel(0)?, channel(2)?, channel(4)?));
    }
    let parts: Vec<&str> = v.split(',').collect();
    if parts.len() != 3 {
        return Err(invalid(key, value));
    }
    Ok(Vec3::new(
        parse_f32(key, parts[0])?,
        parse_f32(key, parts[1])?,
        parse_f32(key, parts[2])?,
    ))
}

/// Digit keys pick a stage in chain order.
#[inline]
pub fn stage_for_digit(key: &str) -> Option<StageKind> {
    match key {
        "1" => Some(StageKind::Bloom),
        "2" => Some(StageKind::ChromaticAberration),
        "3" => Some(StageKind::BarrelDistortion),
        "4" => Some(StageKind::PhosphorGlow),
        "5" => Some(StageKind::Vignette),
        "6" => Some(StageKind::Noise),
        "7" => Some(StageKind::FrameMask),
        _ => None,
    }
}
