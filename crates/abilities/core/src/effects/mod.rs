//! Effect lifecycle: templates, applications and the per-agent container.
//!
//! # Lifecycle
//!
//! ```text
//! apply ──► "applied" cue ──► modifiers / timers
//!   │
//!   ├─ Instant ──► execute once ──► retired (no further cues)
//!   ├─ Periodic ─► execute on each period tick ──┐
//!   └─ Duration / Infinite ─► live modifiers ────┤
//!                                                ├─► expire  ──► "expired" cue
//!                                                └─► remove  ──► "removed" cue
//! ```
//!
//! Timers are always cancelled before the instance is torn down, and a
//! handle that is no longer live is silently ignored by every operation.

pub mod container;
pub mod context;
pub mod handle;
pub mod instance;
pub mod magnitude;
pub mod spec;

use crate::attributes::AttributeError;
use crate::error::{ErrorSeverity, GameError};

pub use container::{ApplyRequest, EffectContainer, EffectTarget};
pub use context::EffectContext;
pub use handle::{EffectHandle, EffectId, EffectKey, HandleGenerator};
pub use instance::{EffectCallbacks, EffectInstance, EffectSummary};
pub use magnitude::{AttributeBased, AttributeSource, CustomMagnitude, Magnitude, MagnitudeContext};
pub use spec::{EffectKind, EffectSpec, EffectTiming, ModifierSpec, Stacking};

/// Reasons an effect application is rejected.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum EffectError {
    /// The template is structurally unusable.
    #[error("invalid effect spec: {0}")]
    InvalidSpec(String),

    /// The context names no target, or the target is gone.
    #[error("invalid effect context: {0}")]
    InvalidContext(&'static str),

    /// An explicit handle names a live effect built from another template.
    #[error("cannot refresh '{live}' with '{requested}'")]
    SpecMismatch { live: String, requested: String },

    #[error(transparent)]
    Attribute(#[from] AttributeError),

    /// The target already holds the configured maximum of live effects.
    #[error("agent already holds {limit} live effects")]
    CapacityExceeded { limit: usize },
}

impl GameError for EffectError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            EffectError::InvalidSpec(_)
            | EffectError::InvalidContext(_)
            | EffectError::SpecMismatch { .. } => ErrorSeverity::Validation,
            EffectError::Attribute(err) => err.severity(),
            EffectError::CapacityExceeded { .. } => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            EffectError::InvalidSpec(_) => "EFFECT_INVALID_SPEC",
            EffectError::InvalidContext(_) => "EFFECT_INVALID_CONTEXT",
            EffectError::SpecMismatch { .. } => "EFFECT_SPEC_MISMATCH",
            EffectError::Attribute(err) => err.error_code(),
            EffectError::CapacityExceeded { .. } => "EFFECT_CAPACITY_EXCEEDED",
        }
    }
}
