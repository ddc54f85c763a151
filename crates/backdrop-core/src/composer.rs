//! Ordered stage chain.
//!
//! The composer owns one instance of every stage in [`StageKind::ORDER`] for
//! the lifetime of the render surface. Settings changes update the stages in
//! place; the chain itself is never rebuilt or reordered.

use crate::error::StageError;
use crate::frame::Frame;
use crate::settings::EffectSettings;
use crate::stages::{default_chain, ParamMap, ParamValue, Stage, StageContext, StageKind, StageUniforms};
use smallvec::SmallVec;

#[derive(Clone, Debug, PartialEq)]
pub enum StageStatus {
    Applied,
    PassThrough(StageError),
}

#[derive(Clone, Debug, PartialEq)]
pub struct StageOutcome {
    pub kind: StageKind,
    pub enabled: bool,
    pub status: StageStatus,
}

/// One entry of the GPU execution plan.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlannedStage {
    pub kind: StageKind,
    pub enabled: bool,
    pub params: [[f32; 4]; 3],
}

impl PlannedStage {
    pub fn uniforms(&self, width: u32, height: u32, ctx: &StageContext) -> StageUniforms {
        StageUniforms {
            resolution: [width as f32, height as f32],
            time: ctx.time,
            frame: (ctx.frame_index % 65_536) as f32,
            params: self.params,
        }
    }
}

struct StageSlot {
    stage: Box<dyn Stage>,
    // last reported failure, so a failing stage logs once instead of per frame
    reported: Option<StageError>,
}

pub struct EffectComposer {
    slots: SmallVec<[StageSlot; 7]>,
}

impl Default for EffectComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectComposer {
    pub fn new() -> Self {
        let slots = default_chain()
            .into_iter()
            .map(|stage| StageSlot {
                stage,
                reported: None,
            })
            .collect();
        Self { slots }
    }

    pub fn from_settings(settings: &EffectSettings) -> Self {
        let mut c = Self::new();
        c.apply_settings(settings);
        c
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn kinds(&self) -> impl Iterator<Item = StageKind> + '_ {
        self.slots.iter().map(|s| s.stage.kind())
    }

    fn slot_mut(&mut self, kind: StageKind) -> &mut StageSlot {
        // slots are built from StageKind::ORDER, indexed by order_index
        &mut self.slots[kind.order_index()]
    }

    pub fn stage(&self, kind: StageKind) -> &dyn Stage {
        self.slots[kind.order_index()].stage.as_ref()
    }

    pub fn params(&self, kind: StageKind) -> ParamMap {
        self.stage(kind).params()
    }

    pub fn set_stage_enabled(&mut self, kind: StageKind, enabled: bool) {
        self.slot_mut(kind).stage.set_enabled(enabled);
    }

    pub fn set_param(&mut self, kind: StageKind, name: &str, value: ParamValue) -> Result<(), StageError> {
        let slot = self.slot_mut(kind);
        let before = slot.stage.params().get(name).copied();
        slot.stage.set_param(name, value)?;
        // a changed value may clear or alter the failure, so report again
        if before != Some(value) {
            slot.reported = None;
        }
        Ok(())
    }

    /// Failure already logged for `kind`, if the stage is passing through.
    pub fn reported_failure(&self, kind: StageKind) -> Option<&StageError> {
        self.slots[kind.order_index()].reported.as_ref()
    }

    /// Pushes a settings record into the running stages.
    pub fn apply_settings(&mut self, s: &EffectSettings) {
        use ParamValue::*;
        let updates: [(StageKind, &str, ParamValue); 14] = [
            (StageKind::Bloom, "intensity", Float(s.bloom_intensity)),
            (StageKind::Bloom, "luminanceThreshold", Float(s.bloom_luminance_threshold)),
            (StageKind::Bloom, "luminanceSmoothing", Float(s.bloom_luminance_smoothing)),
            (StageKind::ChromaticAberration, "offset", Vector(s.chromatic_offset)),
            (StageKind::BarrelDistortion, "distortion", Float(s.crt_distortion)),
            (StageKind::BarrelDistortion, "scale", Float(s.crt_distortion_scale)),
            (StageKind::PhosphorGlow, "glowColor", Color(s.phosphor_glow_color)),
            (StageKind::PhosphorGlow, "intensity", Float(s.phosphor_glow_intensity)),
            (StageKind::PhosphorGlow, "blurRadiusPx", Float(s.phosphor_glow_blur_radius)),
            (StageKind::Vignette, "offset", Float(s.vignette_offset)),
            (StageKind::Vignette, "darkness", Float(s.vignette_darkness)),
            (StageKind::Noise, "opacity", Float(s.noise_opacity)),
            (StageKind::FrameMask, "borderRadius", Float(s.frame_border_radius)),
            (StageKind::FrameMask, "borderSoftness", Float(s.frame_border_softness)),
        ];
        for (kind, name, value) in updates {
            if let Err(e) = self.set_param(kind, name, value) {
                log::error!("[composer] settings update rejected: {}", e);
            }
        }
        for kind in StageKind::ORDER {
            self.set_stage_enabled(kind, s.stage_enabled(kind));
        }
        log::debug!("[composer] settings applied");
    }

    /// Runs the full chain over one rasterized scene image.
    pub fn render(&mut self, scene: &Frame, ctx: &StageContext) -> Frame {
        self.render_traced(scene, ctx).0
    }

    /// Like [`render`](Self::render), also reporting what each stage did.
    /// A failing stage passes its input through and the chain continues.
    pub fn render_traced(
        &mut self,
        scene: &Frame,
        ctx: &StageContext,
    ) -> (Frame, SmallVec<[StageOutcome; 7]>) {
        let mut current = scene.clone();
        let mut outcomes = SmallVec::new();
        for slot in self.slots.iter_mut() {
            let kind = slot.stage.kind();
            let status = match slot.stage.apply(&current, ctx) {
                Ok(next) => {
                    current = next;
                    slot.reported = None;
                    StageStatus::Applied
                }
                Err(e) => {
                    if slot.reported.as_ref() != Some(&e) {
                        log::warn!("[composer] {} passed through: {}", kind, e);
                        slot.reported = Some(e.clone());
                    }
                    StageStatus::PassThrough(e)
                }
            };
            outcomes.push(StageOutcome {
                kind,
                enabled: slot.stage.enabled(),
                status,
            });
        }
        (current, outcomes)
    }

    /// Ordered stage list with effective GPU parameters for this frame.
    pub fn plan(&self) -> SmallVec<[PlannedStage; 7]> {
        self.slots
            .iter()
            .map(|slot| PlannedStage {
                kind: slot.stage.kind(),
                enabled: slot.stage.enabled(),
                params: slot.stage.packed(),
            })
            .collect()
    }
}
