//! Screen-space stage programs.
//!
//! Each stage maps the previous image to a new image of the same size. A
//! disabled stage stays in the chain and collapses its parameters to no-op
//! values; it is never removed.

use crate::error::StageError;
use crate::frame::Frame;
use fnv::FnvHashMap;
use glam::{Vec2, Vec3};
use std::fmt;

mod barrel;
mod bloom;
mod chromatic;
mod frame_mask;
mod noise;
mod phosphor;
mod vignette;

pub use barrel::BarrelDistortion;
pub use bloom::Bloom;
pub use chromatic::ChromaticAberration;
pub use frame_mask::{frame_distance, FrameMask};
pub use noise::Noise;
pub use phosphor::PhosphorGlow;
pub use vignette::Vignette;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StageKind {
    Bloom,
    ChromaticAberration,
    BarrelDistortion,
    PhosphorGlow,
    Vignette,
    Noise,
    FrameMask,
}

impl StageKind {
    /// Fixed execution order. Barrel distortion precedes vignette so the
    /// vignette darkens the warped edges; the frame mask is always last.
    pub const ORDER: [StageKind; 7] = [
        StageKind::Bloom,
        StageKind::ChromaticAberration,
        StageKind::BarrelDistortion,
        StageKind::PhosphorGlow,
        StageKind::Vignette,
        StageKind::Noise,
        StageKind::FrameMask,
    ];

    pub fn order_index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            StageKind::Bloom => "bloom",
            StageKind::ChromaticAberration => "chromatic_aberration",
            StageKind::BarrelDistortion => "barrel_distortion",
            StageKind::PhosphorGlow => "phosphor_glow",
            StageKind::Vignette => "vignette",
            StageKind::Noise => "noise",
            StageKind::FrameMask => "frame_mask",
        }
    }

    /// Settings key of the stage's global toggle.
    pub fn toggle_key(self) -> &'static str {
        match self {
            StageKind::Bloom => "enableBloom",
            StageKind::ChromaticAberration => "enableChromaticAberration",
            StageKind::BarrelDistortion => "enableCrtDistortion",
            StageKind::PhosphorGlow => "enablePhosphorGlow",
            StageKind::Vignette => "enableVignette",
            StageKind::Noise => "enableNoise",
            StageKind::FrameMask => "enableFrameMask",
        }
    }

    /// Fragment entry point in the stage shader module.
    pub fn entry_point(self) -> &'static str {
        match self {
            StageKind::Bloom => "fs_bloom_composite",
            StageKind::ChromaticAberration => "fs_chromatic",
            StageKind::BarrelDistortion => "fs_barrel",
            StageKind::PhosphorGlow => "fs_phosphor",
            StageKind::Vignette => "fs_vignette",
            StageKind::Noise => "fs_noise",
            StageKind::FrameMask => "fs_frame_mask",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value of a named stage parameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamValue {
    Float(f32),
    Vector(Vec2),
    Color(Vec3),
}

pub type ParamMap = FnvHashMap<&'static str, ParamValue>;

/// Per-frame inputs shared by all stages.
#[derive(Clone, Copy, Debug)]
pub struct StageContext {
    pub time: f32,
    pub frame_index: u64,
    /// Largest dimension a stage may allocate intermediates for.
    pub max_dimension: u32,
}

impl Default for StageContext {
    fn default() -> Self {
        Self {
            time: 0.0,
            frame_index: 0,
            max_dimension: 8192,
        }
    }
}

/// Uniform block handed to the GPU stage shader. Layout is shared by every
/// entry point in `stages.wgsl`; the meaning of `params` depends on the stage.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StageUniforms {
    pub resolution: [f32; 2],
    pub time: f32,
    pub frame: f32,
    pub params: [[f32; 4]; 3],
}

pub trait Stage {
    fn kind(&self) -> StageKind;
    fn enabled(&self) -> bool;
    fn set_enabled(&mut self, enabled: bool);

    /// Current configured parameters, independent of the enabled flag.
    fn params(&self) -> ParamMap;
    fn set_param(&mut self, name: &str, value: ParamValue) -> Result<(), StageError>;

    /// Effective parameters packed for the GPU. Disabled stages pack their
    /// no-op values.
    fn packed(&self) -> [[f32; 4]; 3];

    fn apply(&self, input: &Frame, ctx: &StageContext) -> Result<Frame, StageError>;
}

pub(crate) fn check_resolution(
    kind: StageKind,
    input: &Frame,
    min: u32,
    ctx: &StageContext,
) -> Result<(), StageError> {
    let (w, h) = (input.width(), input.height());
    if w < min || h < min || w > ctx.max_dimension || h > ctx.max_dimension {
        return Err(StageError::UnsupportedResolution {
            kind,
            width: w,
            height: h,
        });
    }
    Ok(())
}

pub(crate) fn expect_float(kind: StageKind, name: &str, value: ParamValue) -> Result<f32, StageError> {
    match value {
        ParamValue::Float(v) => Ok(finite_or_zero(v)),
        _ => Err(StageError::ParameterType {
            kind,
            name: name.to_string(),
            expected: "float",
        }),
    }
}

pub(crate) fn expect_vector(kind: StageKind, name: &str, value: ParamValue) -> Result<Vec2, StageError> {
    match value {
        ParamValue::Vector(v) => Ok(Vec2::new(finite_or_zero(v.x), finite_or_zero(v.y))),
        _ => Err(StageError::ParameterType {
            kind,
            name: name.to_string(),
            expected: "vector",
        }),
    }
}

pub(crate) fn expect_color(kind: StageKind, name: &str, value: ParamValue) -> Result<Vec3, StageError> {
    match value {
        ParamValue::Color(c) => Ok(Vec3::new(
            finite_or_zero(c.x),
            finite_or_zero(c.y),
            finite_or_zero(c.z),
        )),
        _ => Err(StageError::ParameterType {
            kind,
            name: name.to_string(),
            expected: "color",
        }),
    }
}

pub(crate) fn unknown(kind: StageKind, name: &str) -> StageError {
    StageError::UnknownParameter {
        kind,
        name: name.to_string(),
    }
}

#[inline]
fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Builds every stage with default parameters, in execution order.
pub fn default_chain() -> Vec<Box<dyn Stage>> {
    StageKind::ORDER
        .iter()
        .map(|kind| -> Box<dyn Stage> {
            match kind {
                StageKind::Bloom => Box::new(Bloom::default()),
                StageKind::ChromaticAberration => Box::new(ChromaticAberration::default()),
                StageKind::BarrelDistortion => Box::new(BarrelDistortion::default()),
                StageKind::PhosphorGlow => Box::new(PhosphorGlow::default()),
                StageKind::Vignette => Box::new(Vignette::default()),
                StageKind::Noise => Box::new(Noise::default()),
                StageKind::FrameMask => Box::new(FrameMask::default()),
            }
        })
        .collect()
}
