//! Error types for behaviors, controllers and their collaborators

use crate::ids::ControllerId;

/// Errors raised while loading behaviors or driving controllers.
///
/// Runtime resolution misses (unknown image or animation ids, empty frame
/// lists) are not errors: they are logged and degrade to "nothing to show".
/// Superseded switches and cancelled jobs resolve to `false` instead.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum BehaviorError {
    /// Malformed behavior descriptor
    #[error("Invalid descriptor: {reason}")]
    InvalidDescriptor { reason: String },

    /// Repetition descriptor of an unsupported shape
    #[error("Invalid repetition descriptor: {descriptor}")]
    InvalidRepetition { descriptor: String },

    /// Registry entry that cannot resolve animations
    #[error("Registry named {name} is not a registry")]
    InvalidRegistry { name: String },

    /// `start` called while a job is still live
    #[error("Controller {id} is already working")]
    AlreadyWorking { id: ControllerId },

    /// Controller used after tear-down
    #[error("Controller {id} has been torn down")]
    TornDown { id: ControllerId },

    /// Frame stepper requested for an empty frame list
    #[error("Frame stepper needs at least one frame")]
    EmptyStepper,

    /// Host executor refused a task
    #[error("Failed to spawn task: {reason}")]
    Spawn { reason: String },
}

impl BehaviorError {
    /// Shorthand for [`BehaviorError::InvalidDescriptor`].
    pub fn descriptor(reason: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            reason: reason.into(),
        }
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidDescriptor { .. } | Self::InvalidRepetition { .. } => "construction",
            Self::InvalidRegistry { .. } => "registry",
            Self::AlreadyWorking { .. } | Self::TornDown { .. } => "contract",
            Self::EmptyStepper | Self::Spawn { .. } => "runtime",
        }
    }
}

impl From<serde_json::Error> for BehaviorError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidDescriptor {
            reason: err.to_string(),
        }
    }
}
