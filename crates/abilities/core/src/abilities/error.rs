use crate::effects::EffectError;
use crate::error::{ErrorSeverity, GameError};
use crate::tags::Tag;

/// Reasons an ability operation is rejected.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ActivationError {
    #[error("agent does not exist")]
    UnknownAgent,

    #[error("ability is not granted")]
    UnknownAbility,

    /// Another ability of the same agent holds the executing slot.
    #[error("'{executing}' is already executing")]
    Reentrant { executing: Tag },

    /// The ability itself is mid-activation or its activation effect is live.
    #[error("ability is already activating")]
    AlreadyActivating,

    #[error("ability is on cooldown")]
    OnCooldown,

    #[error("blocked by tag '{0}'")]
    Blocked(Tag),

    #[error("ability is not waiting for confirmation")]
    NotWaitingForConfirm,

    #[error("ability is not executing")]
    NotExecuting,

    #[error(transparent)]
    Effect(#[from] EffectError),
}

impl GameError for ActivationError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            ActivationError::Reentrant { .. }
            | ActivationError::AlreadyActivating
            | ActivationError::OnCooldown
            | ActivationError::Blocked(_) => ErrorSeverity::Recoverable,
            ActivationError::UnknownAgent
            | ActivationError::UnknownAbility
            | ActivationError::NotWaitingForConfirm
            | ActivationError::NotExecuting => ErrorSeverity::Validation,
            ActivationError::Effect(err) => err.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ActivationError::UnknownAgent => "ABILITY_UNKNOWN_AGENT",
            ActivationError::UnknownAbility => "ABILITY_UNKNOWN",
            ActivationError::Reentrant { .. } => "ABILITY_REENTRANT",
            ActivationError::AlreadyActivating => "ABILITY_ALREADY_ACTIVATING",
            ActivationError::OnCooldown => "ABILITY_ON_COOLDOWN",
            ActivationError::Blocked(_) => "ABILITY_BLOCKED",
            ActivationError::NotWaitingForConfirm => "ABILITY_NOT_WAITING_FOR_CONFIRM",
            ActivationError::NotExecuting => "ABILITY_NOT_EXECUTING",
            ActivationError::Effect(err) => err.error_code(),
        }
    }
}
