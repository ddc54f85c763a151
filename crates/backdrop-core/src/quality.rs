//! Quality level to device-pixel-ratio policy.

use std::fmt;
use std::str::FromStr;

/// DPR used when the configured level is not recognized.
pub const FALLBACK_DPR: f32 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum QualityLevel {
    Performance,
    Balanced,
    #[default]
    High,
    Ultra,
    Maximum,
}

impl QualityLevel {
    pub const ALL: [QualityLevel; 5] = [
        QualityLevel::Performance,
        QualityLevel::Balanced,
        QualityLevel::High,
        QualityLevel::Ultra,
        QualityLevel::Maximum,
    ];

    pub fn name(self) -> &'static str {
        match self {
            QualityLevel::Performance => "performance",
            QualityLevel::Balanced => "balanced",
            QualityLevel::High => "high",
            QualityLevel::Ultra => "ultra",
            QualityLevel::Maximum => "maximum",
        }
    }

    /// Render DPR for this level, capped by what the device offers.
    pub fn device_pixel_ratio(self, device_dpr: f32) -> f32 {
        match self {
            QualityLevel::Performance => 1.0,
            QualityLevel::Balanced => device_dpr.min(1.5),
            QualityLevel::High => device_dpr.min(2.0),
            QualityLevel::Ultra => device_dpr.min(3.0),
            QualityLevel::Maximum => device_dpr,
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QualityLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QualityLevel::ALL
            .into_iter()
            .find(|q| q.name().eq_ignore_ascii_case(s.trim()))
            .ok_or(())
    }
}

/// DPR for an optional level; `None` stands for an unrecognized setting.
pub fn device_pixel_ratio(level: Option<QualityLevel>, device_dpr: f32) -> f32 {
    match level {
        Some(q) => q.device_pixel_ratio(device_dpr),
        None => FALLBACK_DPR,
    }
}

/// DPR for a quality name as stored in settings.
pub fn dpr_for_name(name: &str, device_dpr: f32) -> f32 {
    device_pixel_ratio(name.parse().ok(), device_dpr)
}
