//! Barrel/pincushion distortion shared by the barrel stage and pointer
//! correction.
//!
//! Both call sites go through [`DistortionParams::forward`]; the GPU stage
//! shader is generated from the same constants by [`wgsl_function`]. Any change
//! to the formula must happen here and nowhere else, otherwise the image and
//! the pointer drift apart near the screen edges.

use crate::constants::{DISTORTION_QUARTIC_WEIGHT, INVERSE_MAX_ITERATIONS, INVERSE_TOLERANCE};
use glam::Vec2;

/// Strength and edge-compensating scale of the radial warp.
///
/// `distortion > 0` bulges (barrel), `distortion < 0` pinches (pincushion).
/// A zero distortion or zero scale is the identity mapping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistortionParams {
    pub distortion: f32,
    pub scale: f32,
}

impl Default for DistortionParams {
    fn default() -> Self {
        Self {
            distortion: crate::constants::DEFAULT_DISTORTION,
            scale: crate::constants::DEFAULT_DISTORTION_SCALE,
        }
    }
}

impl DistortionParams {
    pub const IDENTITY: Self = Self {
        distortion: 0.0,
        scale: 1.0,
    };

    pub fn new(distortion: f32, scale: f32) -> Self {
        Self { distortion, scale }
    }

    /// True when the mapping must leave coordinates untouched. Non-finite
    /// parameters are treated as degenerate rather than propagated.
    #[inline]
    pub fn is_identity(&self) -> bool {
        self.distortion == 0.0
            || self.scale == 0.0
            || !self.distortion.is_finite()
            || !self.scale.is_finite()
    }

    /// Radial gain `1 + r2*d + r4*d*0.5` before scaling.
    #[inline]
    pub fn amount(&self, r2: f32) -> f32 {
        let r4 = r2 * r2;
        1.0 + r2 * self.distortion + r4 * self.distortion * DISTORTION_QUARTIC_WEIGHT
    }

    /// Forward map over centered coordinates in [-1, 1].
    #[inline]
    pub fn forward(&self, p: Vec2) -> Vec2 {
        if self.is_identity() {
            return p;
        }
        p * self.amount(p.length_squared()) * self.scale
    }

    /// Radius at which the radial map stops growing. Only pincushion
    /// (`distortion < 0`) folds; barrel distortion is monotonic everywhere.
    ///
    /// Root of `g'(r) = s*(1 + 3*d*r^2 + 5*w*d*r^4)` in `r^2`, with `w` the
    /// quartic weight.
    pub fn fold_radius(&self) -> Option<f32> {
        if self.is_identity() || self.distortion > 0.0 {
            return None;
        }
        let d = self.distortion;
        let a = 5.0 * DISTORTION_QUARTIC_WEIGHT * d;
        let b = 3.0 * d;
        // a < 0 and c = 1, so exactly one root in r^2 is positive
        let u = (-b - (b * b - 4.0 * a).sqrt()) / (2.0 * a);
        Some(u.sqrt())
    }

    /// Numeric inverse of [`forward`](Self::forward) along the radius.
    ///
    /// The map is radial, so only `|p|` has to be solved:
    /// `g(r) = |s|*r*(1 + d*r^2 + 0.5*d*r^4) = |p|`, by Newton iteration
    /// starting from `|p| / |s|`. The estimate is held in `[0, fold]`, so a
    /// radius beyond the reach of a folding pincushion resolves to the fold
    /// radius in the direction of `p`, never to the opposite side. A negative
    /// scale flips the result through the origin, as `forward` does.
    pub fn inverse(&self, p: Vec2) -> Vec2 {
        if self.is_identity() {
            return p;
        }
        let target = p.length();
        if target == 0.0 {
            return p;
        }
        let d = self.distortion;
        let gain = self.scale.abs();
        let limit = self.fold_radius().unwrap_or(f32::INFINITY);
        let mut r = (target / gain).min(limit);
        for _ in 0..INVERSE_MAX_ITERATIONS {
            let r2 = r * r;
            let g = gain * r * self.amount(r2) - target;
            let dg = gain * (1.0 + 3.0 * d * r2 + 5.0 * DISTORTION_QUARTIC_WEIGHT * d * r2 * r2);
            if dg.abs() <= f32::EPSILON {
                break;
            }
            let next = (r - g / dg).clamp(0.0, limit);
            let moved = (next - r).abs();
            r = next;
            if moved < INVERSE_TOLERANCE {
                break;
            }
        }
        p * (r.copysign(self.scale) / target)
    }
}

/// Free-function form used by callers that carry raw components.
#[inline]
pub fn forward(x: f32, y: f32, distortion: f32, scale: f32) -> (f32, f32) {
    let out = DistortionParams { distortion, scale }.forward(Vec2::new(x, y));
    (out.x, out.y)
}

/// WGSL rendition of [`DistortionParams::forward`], with the quartic weight
/// baked in from the Rust constant.
pub fn wgsl_function() -> String {
    format!(
        "fn barrel_forward(p: vec2<f32>, distortion: f32, scale: f32) -> vec2<f32> {{
    if (distortion == 0.0 || scale == 0.0) {{
        return p;
    }}
    let r2 = dot(p, p);
    let r4 = r2 * r2;
    let amount = 1.0 + r2 * distortion + r4 * distortion * {weight:?};
    return p * amount * scale;
}}
",
        weight = DISTORTION_QUARTIC_WEIGHT
    )
}
