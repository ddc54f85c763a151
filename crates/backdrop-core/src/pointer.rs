//! Pointer correction.
//!
//! The barrel stage shows, at screen position `p`, the scene content found at
//! `forward(p)`. Hit-testing therefore has to cast its ray through
//! `forward(p)` rather than `p`, or clicks near the edges select whatever sits
//! under the undistorted position.
//!
//! Two integrations produce the same corrected value:
//! - a frame hook ([`install_frame_hook`]) that rewrites the shared
//!   [`PointerState`] at [`priority::POINTER_CORRECTION`], ahead of any reader;
//! - direct derivation at ray-construction time ([`PointerCorrection::event_ray`])
//!   from the raw event position and the surface rectangle. This is the
//!   preferred path since it does not depend on callback ordering.

use crate::camera::{Camera, Ray};
use crate::distortion::DistortionParams;
use crate::quality::{device_pixel_ratio, QualityLevel};
use crate::scheduler::{priority, CallbackId, FrameScheduler};
use crate::settings::EffectSettings;
use glam::Vec2;
use std::cell::RefCell;
use std::rc::Rc;

/// Logical viewport size plus the DPR used to convert physical pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportGeometry {
    pub width_px: f32,
    pub height_px: f32,
    pub device_pixel_ratio: f32,
}

impl ViewportGeometry {
    pub fn new(width_px: f32, height_px: f32, device_pixel_ratio: f32) -> Self {
        Self {
            width_px,
            height_px,
            device_pixel_ratio,
        }
    }

    /// Backing-store size in physical pixels (at least 1x1).
    pub fn physical_size(&self) -> (u32, u32) {
        let dpr = self.device_pixel_ratio.max(f32::MIN_POSITIVE);
        (
            ((self.width_px * dpr).round() as u32).max(1),
            ((self.height_px * dpr).round() as u32).max(1),
        )
    }

    /// Offscreen render size under a quality level: the logical size at the
    /// policy DPR for this device, each axis capped at `max`. Re-evaluated
    /// whenever the surface is reconfigured, since the device DPR follows the
    /// monitor.
    pub fn render_size(&self, quality: Option<QualityLevel>, max: u32) -> (u32, u32) {
        let dpr = device_pixel_ratio(quality, self.device_pixel_ratio);
        let (w, h) = ViewportGeometry::new(self.width_px, self.height_px, dpr).physical_size();
        (w.min(max), h.min(max))
    }

    pub fn aspect(&self) -> f32 {
        self.width_px / self.height_px.max(1.0)
    }

    /// Logical pixel position (origin top-left) to NDC with y up.
    pub fn ndc_from_logical(&self, pos: Vec2) -> Vec2 {
        let w = self.width_px.max(1.0);
        let h = self.height_px.max(1.0);
        Vec2::new(2.0 * pos.x / w - 1.0, 1.0 - 2.0 * pos.y / h)
    }

    pub fn ndc_from_physical(&self, pos: Vec2) -> Vec2 {
        let dpr = self.device_pixel_ratio.max(f32::MIN_POSITIVE);
        self.ndc_from_logical(pos / dpr)
    }

    pub fn logical_from_ndc(&self, ndc: Vec2) -> Vec2 {
        Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.width_px,
            (1.0 - ndc.y) * 0.5 * self.height_px,
        )
    }
}

/// Rectangle of the render surface in the coordinate space of input events.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl ViewportRect {
    pub fn from_size(width: f32, height: f32) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width,
            height,
        }
    }

    /// NDC (y up) of an event position; `None` for an empty rectangle.
    pub fn ndc_of(&self, client: Vec2) -> Option<Vec2> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        let x = (client.x - self.left) / self.width;
        let y = (client.y - self.top) / self.height;
        Some(Vec2::new(x * 2.0 - 1.0, 1.0 - y * 2.0))
    }
}

/// How raw pointer coordinates are mapped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CorrectionMode {
    /// Reapply the forward transform, matching the barrel stage's sampling.
    #[default]
    Forward,
    /// Solve the forward transform numerically for the source position.
    Inverse,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerSample {
    pub raw_ndc: Vec2,
    pub corrected_ndc: Vec2,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PointerCorrection {
    pub enabled: bool,
    pub params: DistortionParams,
    pub mode: CorrectionMode,
}

impl Default for PointerCorrection {
    fn default() -> Self {
        Self::new(DistortionParams::default())
    }
}

impl PointerCorrection {
    pub fn new(params: DistortionParams) -> Self {
        Self {
            enabled: true,
            params,
            mode: CorrectionMode::Forward,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn from_settings(s: &EffectSettings) -> Self {
        let mut c = Self::default();
        c.apply_settings(s);
        c
    }

    /// Correction follows the barrel stage: with the stage off there is
    /// nothing to correct for.
    pub fn apply_settings(&mut self, s: &EffectSettings) {
        self.enabled = s.enable_pointer_correction && s.enable_crt_distortion;
        self.params = s.distortion_params();
        self.mode = s.pointer_correction_mode;
    }

    /// Corrected NDC. Disabled correction returns the input untouched,
    /// without running the transform.
    pub fn correct(&self, raw: Vec2) -> Vec2 {
        if !self.enabled {
            return raw;
        }
        match self.mode {
            CorrectionMode::Forward => self.params.forward(raw),
            CorrectionMode::Inverse => self.params.inverse(raw),
        }
    }

    pub fn sample(&self, raw_ndc: Vec2) -> PointerSample {
        PointerSample {
            raw_ndc,
            corrected_ndc: self.correct(raw_ndc),
        }
    }

    /// Event position to corrected NDC, computed directly from the surface
    /// rectangle.
    pub fn event_sample(&self, client: Vec2, rect: &ViewportRect) -> Option<PointerSample> {
        rect.ndc_of(client).map(|ndc| self.sample(ndc))
    }

    /// Event position to a world ray through the corrected coordinate.
    pub fn event_ray(&self, client: Vec2, rect: &ViewportRect, camera: &Camera) -> Option<(PointerSample, Ray)> {
        let sample = self.event_sample(client, rect)?;
        Some((sample, camera.ray_through(sample.corrected_ndc)))
    }
}

/// Pointer state shared between input handling, the correction hook and
/// hit-testing. `ndc` is what hit-testing reads.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerState {
    pub raw_ndc: Vec2,
    pub ndc: Vec2,
    pub inside: bool,
    pub down: bool,
}

impl PointerState {
    /// Records a raw position. `ndc` mirrors it until the correction hook
    /// runs.
    pub fn set_raw(&mut self, raw_ndc: Vec2) {
        self.raw_ndc = raw_ndc;
        self.ndc = raw_ndc;
        self.inside = raw_ndc.x.abs() <= 1.0 && raw_ndc.y.abs() <= 1.0;
    }
}

/// Registers the per-frame correction hook at
/// [`priority::POINTER_CORRECTION`]. The hook always derives from `raw_ndc`,
/// so running it twice in a frame cannot double-correct.
pub fn install_frame_hook(
    scheduler: &mut FrameScheduler,
    correction: Rc<RefCell<PointerCorrection>>,
    pointer: Rc<RefCell<PointerState>>,
) -> CallbackId {
    scheduler.register("pointer_correction", priority::POINTER_CORRECTION, move |_| {
        let c = correction.borrow();
        let mut p = pointer.borrow_mut();
        p.ndc = c.correct(p.raw_ndc);
    })
}
