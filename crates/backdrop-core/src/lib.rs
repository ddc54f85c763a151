pub mod camera;
pub mod composer;
pub mod constants;
pub mod distortion;
pub mod environment;
pub mod error;
pub mod frame;
pub mod pointer;
pub mod quality;
pub mod scheduler;
pub mod settings;
pub mod stages;

pub use camera::*;
pub use composer::*;
pub use constants::*;
pub use distortion::DistortionParams;
pub use environment::*;
pub use error::*;
pub use frame::Frame;
pub use pointer::*;
pub use quality::*;
pub use scheduler::*;
pub use settings::*;
pub use stages::{ParamValue, Stage, StageContext, StageKind};

// Shaders bundled as string constants
pub static SCENE_WGSL: &str = include_str!("../shaders/scene.wgsl");
pub static STAGES_WGSL: &str = include_str!("../shaders/stages.wgsl");

/// Full source of the stage shader module: the generated barrel transform
/// followed by the hand-written stage entry points.
pub fn stages_shader_source() -> String {
    format!("{}\n{}", distortion::wgsl_function(), STAGES_WGSL)
}

/// Full source of the scene shader module: the generated scene constants
/// followed by the raycast entry points.
pub fn scene_shader_source() -> String {
    format!("{}\n{}", environment::wgsl_constants(), SCENE_WGSL)
}
