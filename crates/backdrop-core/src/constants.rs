use glam::{Vec2, Vec3};

// Shared tuning constants for the CRT backdrop. Defaults describe the shipped
// cyberpunk theme; settings override them at runtime.

// Barrel distortion
pub const DEFAULT_DISTORTION: f32 = 0.15;
pub const DEFAULT_DISTORTION_SCALE: f32 = 0.94;
pub const DISTORTION_QUARTIC_WEIGHT: f32 = 0.5; // weight of the r^4 term
pub const INVERSE_MAX_ITERATIONS: u32 = 12;
pub const INVERSE_TOLERANCE: f32 = 1e-6;

// Bloom
pub const BLOOM_INTENSITY: f32 = 1.2;
pub const BLOOM_LUMINANCE_THRESHOLD: f32 = 0.2;
pub const BLOOM_LUMINANCE_SMOOTHING: f32 = 0.9;
pub const BLOOM_BLUR_WEIGHTS: [f32; 5] = [0.227_027, 0.194_594_6, 0.121_621_6, 0.054_054, 0.016_216];

// Chromatic aberration (uv units)
pub const CHROMATIC_OFFSET: Vec2 = Vec2::new(0.002, 0.002);

// Phosphor glow
pub const PHOSPHOR_GLOW_COLOR: Vec3 = Vec3::new(0.0, 1.0, 0.8);
pub const PHOSPHOR_INTENSITY: f32 = 0.5;
pub const PHOSPHOR_BLUR_RADIUS_PX: f32 = 2.0;
pub const PHOSPHOR_KERNEL: [f32; 9] = [
    0.0625, 0.125, 0.0625, //
    0.125, 0.25, 0.125, //
    0.0625, 0.125, 0.0625,
];
pub const PHOSPHOR_GATE_LOW: f32 = 0.2;
pub const PHOSPHOR_GATE_HIGH: f32 = 0.8;
pub const PHOSPHOR_TINT_MIX: f32 = 0.1; // slight pull of the result toward the glow color

// Rec. 601 luma
pub const LUMA_WEIGHTS: Vec3 = Vec3::new(0.299, 0.587, 0.114);

// Vignette
pub const VIGNETTE_OFFSET: f32 = 0.3;
pub const VIGNETTE_DARKNESS: f32 = 0.8;

// Noise
pub const NOISE_OPACITY: f32 = 0.05;
pub const NOISE_SEED: u64 = 0x6e6f_6973_655f_6772;

// Frame mask, in |x|^2.5 + |y|^2.5 units over centered coordinates
pub const FRAME_MASK_EXPONENT: f32 = 2.5;
pub const FRAME_BORDER_RADIUS: f32 = 1.0;
pub const FRAME_BORDER_SOFTNESS: f32 = 0.02;
pub const FRAME_MASK_DISABLED_RADIUS: f32 = 1.0e4; // never reached inside the viewport

// Scene environment
pub const BACKGROUND_COLOR: Vec3 = Vec3::new(0.02, 0.0, 0.05);
pub const FOG_NEAR: f32 = 6.0;
pub const FOG_FAR: f32 = 40.0;
pub const AMBIENT_LIGHT: Vec3 = Vec3::new(0.08, 0.04, 0.12);
pub const MAX_LIGHTS: usize = 4;

// Camera
pub const CAMERA_EYE: Vec3 = Vec3::new(0.0, 1.2, 6.0);
pub const CAMERA_FOVY: f32 = std::f32::consts::FRAC_PI_4;
pub const CAMERA_ZNEAR: f32 = 0.1;
pub const CAMERA_ZFAR: f32 = 100.0;

// Interaction
pub const PICK_SPHERE_RADIUS: f32 = 0.6;
pub const MAX_MARKERS: usize = 8;

// Frame clock clamps (seconds)
pub const FRAME_DT_MIN: f32 = 0.0001;
pub const FRAME_DT_MAX: f32 = 0.25;

// Scene content
pub const FLOOR_Y: f32 = -1.0;
pub const GRID_SPACING: f32 = 1.0;
pub const GRID_LINE_WIDTH: f32 = 0.04;
pub const GRID_COLOR: Vec3 = Vec3::new(1.0, 0.0, 0.6);
pub const FLOOR_COLOR: Vec3 = Vec3::new(0.03, 0.0, 0.06);
pub const MARKER_RING_RADIUS: f32 = 2.6;
pub const MARKER_COLOR: Vec3 = Vec3::new(0.1, 0.9, 1.0);
pub const HOVER_BOOST: f32 = 1.8;
