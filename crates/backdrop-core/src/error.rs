use crate::stages::StageKind;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Failure of a single stage for one frame. The composer never propagates
/// these; the stage is passed through instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StageError {
    #[error("{kind} cannot run at {width}x{height}")]
    UnsupportedResolution {
        kind: StageKind,
        width: u32,
        height: u32,
    },
    #[error("{kind} has no parameter named `{name}`")]
    UnknownParameter { kind: StageKind, name: String },
    #[error("{kind} parameter `{name}` expects a {expected}")]
    ParameterType {
        kind: StageKind,
        name: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    #[error("unknown setting `{0}`")]
    UnknownKey(String),
    #[error("invalid value `{value}` for setting `{key}`")]
    InvalidValue { key: String, value: String },
    #[error("malformed setting pair `{0}` (expected key=value)")]
    MalformedPair(String),
}

/// Errors surfaced to the hosting surface. `ContextLost` is fatal: the host
/// must rebuild the composer and its GPU resources.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("rendering context lost: {0}")]
    ContextLost(String),
    #[error("surface error: {0}")]
    Surface(String),
    #[error("stage {kind} unavailable: {reason}")]
    UnsupportedStage { kind: StageKind, reason: String },
}

impl RenderError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, RenderError::ContextLost(_))
    }
}

/// Shared record of an asynchronous context loss.
///
/// Device callbacks run outside the frame loop, so they record the reason
/// here and the next frame turns it into [`RenderError::ContextLost`]. The
/// first reason wins; later ones are usually consequences of it.
#[derive(Debug, Clone, Default)]
pub struct ContextLoss(Arc<Mutex<Option<String>>>);

impl ContextLoss {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, reason: impl Into<String>) {
        let reason = reason.into();
        match self.0.lock() {
            Ok(mut slot) => {
                if slot.is_none() {
                    log::error!("[gpu] context lost: {}", reason);
                    *slot = Some(reason);
                }
            }
            Err(poisoned) => {
                poisoned.into_inner().get_or_insert(reason);
            }
        }
    }

    pub fn is_lost(&self) -> bool {
        self.reason().is_some()
    }

    pub fn reason(&self) -> Option<String> {
        match self.0.lock() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// `Err(ContextLost)` once any loss has been recorded.
    pub fn check(&self) -> Result<(), RenderError> {
        match self.reason() {
            Some(reason) => Err(RenderError::ContextLost(reason)),
            None => Ok(()),
        }
    }
}
