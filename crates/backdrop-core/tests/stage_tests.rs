// Host-side tests for the individual stage programs.

use backdrop_core::stages::{BarrelDistortion, Bloom, ChromaticAberration, FrameMask, Noise, PhosphorGlow, Vignette};
use backdrop_core::{Frame, ParamValue, Stage, StageContext, StageError, StageKind};
use glam::{Vec2, Vec3};

fn white(size: u32) -> Frame {
    Frame::filled(size, size, Vec3::ONE)
}

#[test]
fn frame_mask_blacks_out_exterior_and_keeps_interior() {
    let mask = FrameMask::default();
    let input = Frame::filled(64, 64, Vec3::new(3.0, 2.0, 5.0));
    let out = mask.apply(&input, &StageContext::default()).unwrap();
    // corner: |x|^2.5 + |y|^2.5 ~ 1.92, outside radius 1
    assert_eq!(out.get(0, 0), Vec3::ZERO);
    assert_eq!(out.get(63, 63), Vec3::ZERO);
    assert_eq!(out.get(32, 32), input.get(32, 32));
}

#[test]
fn frame_mask_distance_is_superellipse() {
    let d = backdrop_core::stages::frame_distance(Vec2::new(-1.0, 0.0));
    assert!((d - 1.0).abs() < 1e-6);
    let d = backdrop_core::stages::frame_distance(Vec2::new(0.5, 0.5));
    assert!((d - 2.0 * 0.5f32.powf(2.5)).abs() < 1e-6);
}

#[test]
fn disabled_frame_mask_never_triggers() {
    let mut mask = FrameMask::default();
    mask.set_enabled(false);
    let input = white(16);
    let out = mask.apply(&input, &StageContext::default()).unwrap();
    assert_eq!(out, input);
    assert!(mask.packed()[0][0] >= 1.0e3);
}

#[test]
fn barrel_leaves_out_of_range_samples_as_fill() {
    let mut barrel = BarrelDistortion::default();
    barrel.set_param("fill", ParamValue::Color(Vec3::new(1.0, 0.0, 0.0))).unwrap();
    let input = Frame::filled(32, 32, Vec3::new(0.0, 0.0, 1.0));
    let out = barrel.apply(&input, &StageContext::default()).unwrap();
    assert_eq!(out.get(0, 0), Vec3::new(1.0, 0.0, 0.0));
    assert_eq!(out.get(16, 16), Vec3::new(0.0, 0.0, 1.0));
}

#[test]
fn disabled_barrel_packs_identity() {
    let mut barrel = BarrelDistortion::default();
    barrel.set_enabled(false);
    assert_eq!(&barrel.packed()[0][..2], &[0.0, 1.0]);
    let input = white(8);
    assert_eq!(barrel.apply(&input, &StageContext::default()).unwrap(), input);
}

#[test]
fn bloom_spreads_bright_pixels() {
    let mut input = Frame::new(16, 16);
    for (x, y) in [(8, 8), (9, 8), (8, 9), (9, 9)] {
        input.set(x, y, Vec3::ONE);
    }
    let bloom = Bloom::default();
    let out = bloom.apply(&input, &StageContext::default()).unwrap();
    assert!(out.get(5, 8).length() > 0.0, "no glow next to the bright block");
    assert!(out.get(8, 8).x > 1.0);

    let mut off = Bloom::default();
    off.set_enabled(false);
    assert_eq!(off.apply(&input, &StageContext::default()).unwrap(), input);
    assert_eq!(off.packed()[0][0], 0.0);
}

#[test]
fn bloom_rejects_tiny_frames() {
    let err = Bloom::default().apply(&Frame::new(1, 1), &StageContext::default());
    assert!(matches!(err, Err(StageError::UnsupportedResolution { kind: StageKind::Bloom, .. })));
}

#[test]
fn chromatic_aberration_keeps_green() {
    let mut input = Frame::new(16, 16);
    for y in 0..16 {
        for x in 0..16 {
            input.set(x, y, Vec3::new(x as f32 / 15.0, 0.5, y as f32 / 15.0));
        }
    }
    let mut ca = ChromaticAberration::default();
    ca.set_param("offset", ParamValue::Vector(Vec2::new(0.1, 0.0))).unwrap();
    let out = ca.apply(&input, &StageContext::default()).unwrap();
    assert_eq!(out.get(8, 8).y, 0.5);
    assert!(out.get(8, 8).x > input.get(8, 8).x, "red should sample further right");

    ca.set_enabled(false);
    assert_eq!(ca.apply(&input, &StageContext::default()).unwrap(), input);
}

#[test]
fn phosphor_pushes_bright_pixels_toward_glow_color() {
    let glow = PhosphorGlow::default();
    let out = glow.apply(&white(8), &StageContext::default()).unwrap();
    let c = out.get(4, 4);
    assert!(c.y > 1.0, "green glow missing: {c:?}");
    assert!(c.x < 1.0, "tint should pull red toward the glow color: {c:?}");
}

#[test]
fn vignette_darkens_corners_only() {
    let out = Vignette::default().apply(&white(32), &StageContext::default()).unwrap();
    assert_eq!(out.get(16, 16), Vec3::ONE);
    assert!(out.get(0, 0).x < 0.3, "corner {:?}", out.get(0, 0));
}

#[test]
fn noise_is_deterministic_per_frame() {
    let noise = Noise::default();
    let input = Frame::new(8, 8);
    let ctx = |frame_index| StageContext {
        frame_index,
        ..StageContext::default()
    };
    let a = noise.apply(&input, &ctx(3)).unwrap();
    let b = noise.apply(&input, &ctx(3)).unwrap();
    let c = noise.apply(&input, &ctx(4)).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert!(a.pixels().iter().all(|p| p.x >= 0.0 && p.x <= 0.05 && p.x == p.y && p.y == p.z));
}

#[test]
fn parameter_errors_are_typed() {
    let mut vignette = Vignette::default();
    assert!(matches!(
        vignette.set_param("radius", ParamValue::Float(1.0)),
        Err(StageError::UnknownParameter { .. })
    ));
    assert!(matches!(
        vignette.set_param("offset", ParamValue::Color(Vec3::ONE)),
        Err(StageError::ParameterType { expected: "float", .. })
    ));
    vignette.set_param("offset", ParamValue::Float(0.5)).unwrap();
    assert_eq!(vignette.params().get("offset"), Some(&ParamValue::Float(0.5)));
}

#[test]
fn non_finite_parameters_are_zeroed() {
    let mut barrel = BarrelDistortion::default();
    barrel.set_param("scale", ParamValue::Float(f32::NAN)).unwrap();
    let input = white(8);
    assert_eq!(barrel.apply(&input, &StageContext::default()).unwrap(), input);
}
