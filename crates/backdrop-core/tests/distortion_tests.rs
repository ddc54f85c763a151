// Host-side tests for the barrel distortion transform.

use backdrop_core::distortion::{forward, wgsl_function};
use backdrop_core::DistortionParams;
use glam::Vec2;

fn grid() -> Vec<Vec2> {
    let mut pts = Vec::new();
    for i in -5..=5 {
        for j in -5..=5 {
            pts.push(Vec2::new(i as f32 * 0.2, j as f32 * 0.2));
        }
    }
    pts
}

#[test]
fn zero_distortion_or_scale_is_identity() {
    for p in grid() {
        for (d, s) in [(0.0, 0.94), (0.0, 0.0), (0.15, 0.0), (-0.3, 0.0), (0.0, 5.0)] {
            assert_eq!(forward(p.x, p.y, d, s), (p.x, p.y), "d={d} s={s} p={p:?}");
        }
    }
}

#[test]
fn non_finite_parameters_fall_back_to_identity() {
    let p = Vec2::new(0.4, -0.7);
    for params in [
        DistortionParams::new(f32::NAN, 0.94),
        DistortionParams::new(0.15, f32::INFINITY),
        DistortionParams::new(f32::NEG_INFINITY, f32::NAN),
    ] {
        assert_eq!(params.forward(p), p);
        assert_eq!(params.inverse(p), p);
    }
}

#[test]
fn forward_is_origin_symmetric() {
    for p in grid() {
        for (d, s) in [(0.15, 0.94), (-0.2, 1.1), (0.3, 0.5)] {
            let (ax, ay) = forward(p.x, p.y, d, s);
            let (bx, by) = forward(-p.x, -p.y, d, s);
            assert_eq!((bx, by), (-ax, -ay), "asymmetric at {p:?} d={d} s={s}");
        }
    }
}

#[test]
fn forward_is_radially_monotonic_in_unit_disk() {
    let distortions = [-0.15, -0.1, -0.05, 0.05, 0.1, 0.15, 0.2, 0.25, 0.3];
    let directions = [Vec2::X, Vec2::Y, Vec2::new(1.0, 1.0).normalize(), Vec2::new(-0.6, 0.8)];
    for d in distortions {
        for s in [0.5, 0.94, 1.2] {
            let params = DistortionParams::new(d, s);
            for dir in directions {
                let mut last = 0.0f32;
                for step in 1..=100 {
                    let r = step as f32 / 100.0;
                    let out = params.forward(dir * r).length();
                    assert!(out > last, "fold at r={r} d={d} s={s}: {out} <= {last}");
                    last = out;
                }
            }
        }
    }
}

#[test]
fn strong_pincushion_folds_inside_unit_disk() {
    // the radial map stops being monotonic once 1 + 3d + 2.5d < 0 at r = 1
    let params = DistortionParams::new(-0.3, 1.0);
    let inner = params.forward(Vec2::new(0.8, 0.0)).x;
    let rim = params.forward(Vec2::new(1.0, 0.0)).x;
    assert!(rim < inner, "expected fold: rim {rim} inner {inner}");
}

#[test]
fn fold_radius_only_for_pincushion() {
    assert_eq!(DistortionParams::new(0.15, 0.94).fold_radius(), None);
    assert_eq!(DistortionParams::new(-0.3, 0.0).fold_radius(), None);
    let params = DistortionParams::new(-0.3, 1.0);
    let fold = params.fold_radius().unwrap();
    assert!((fold - 0.8374).abs() < 1e-3, "fold {fold}");
    let u = fold * fold;
    let slope = 1.0 + 3.0 * params.distortion * u + 2.5 * params.distortion * u * u;
    assert!(slope.abs() < 1e-4, "slope at fold {slope}");
    let before = params.forward(Vec2::new(fold - 0.05, 0.0)).x;
    let at = params.forward(Vec2::new(fold, 0.0)).x;
    let after = params.forward(Vec2::new(fold + 0.05, 0.0)).x;
    assert!(before < at && after < at);
}

#[test]
fn inverse_handles_negative_scale() {
    let params = DistortionParams::new(0.15, -0.94);
    let p = Vec2::new(0.4, -0.3);
    let back = params.inverse(params.forward(p));
    assert!((back - p).length() < 1e-4, "back={back:?}");
}

#[test]
fn edge_points_are_pushed_outward() {
    let (x, y) = forward(0.9, 0.9, 0.15, 0.94);
    assert!(x > 0.9 && y > 0.9, "got ({x}, {y})");
    assert!((x - 1.2181).abs() < 1e-3, "got {x}");
    assert_eq!(forward(0.0, 0.0, 0.15, 0.94), (0.0, 0.0));
}

#[test]
fn free_function_matches_params() {
    let params = DistortionParams::default();
    for p in grid() {
        let out = params.forward(p);
        assert_eq!(forward(p.x, p.y, params.distortion, params.scale), (out.x, out.y));
    }
}

#[test]
fn inverse_undoes_forward() {
    for (d, s) in [(0.15, 0.94), (0.3, 1.0), (0.05, 1.3), (-0.1, 0.94)] {
        let params = DistortionParams::new(d, s);
        for p in grid().into_iter().filter(|p| p.length() <= 1.0) {
            let back = params.inverse(params.forward(p));
            assert!((back - p).length() < 1e-4, "d={d} s={s} p={p:?} back={back:?}");
        }
    }
}

#[test]
fn generated_wgsl_carries_the_formula() {
    let src = wgsl_function();
    assert!(src.contains("fn barrel_forward(p: vec2<f32>, distortion: f32, scale: f32) -> vec2<f32>"));
    assert!(src.contains("distortion == 0.0 || scale == 0.0"));
    assert!(src.contains("r4 * distortion * 0.5"), "quartic weight missing:\n{src}");
    assert!(src.contains("return p * amount * scale;"));
}

#[test]
fn stage_shader_source_includes_generated_function() {
    let src = backdrop_core::stages_shader_source();
    assert!(src.starts_with("fn barrel_forward"));
    for kind in backdrop_core::StageKind::ORDER {
        assert!(src.contains(&format!("fn {}(", kind.entry_point())), "missing {}", kind.entry_point());
    }
}
