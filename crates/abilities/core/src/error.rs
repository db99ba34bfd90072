//! Common error infrastructure for abilities-core.
//!
//! Domain errors (`AttributeError`, `EffectError`, `ActivationError`) live
//! next to the modules that produce them and implement [`GameError`] so the
//! world façade can classify and log them uniformly.
//!
//! Every failure the engine produces is an expected runtime condition of a
//! live simulation. The public façade therefore reports them through return
//! values (an invalid handle, `false`) and logs the typed error; `try_*`
//! entry points surface the error itself.

/// Severity level of an error, used for categorization and logging priority.
///
/// - **Recoverable**: temporary conditions that may succeed later (ability on cooldown)
/// - **Validation**: invalid input from the caller (unknown ability tag)
/// - **Internal**: configuration mismatches that should be investigated (unknown attribute)
/// - **Fatal**: engine invariant violated
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ErrorSeverity {
    /// Recoverable error - retry later or with a different input.
    ///
    /// Examples: ability on cooldown, another ability executing
    Recoverable,

    /// Validation error - invalid input, should not retry without changes.
    ///
    /// Examples: unknown ability tag, null effect template
    Validation,

    /// Internal error - content and attribute registry disagree.
    ///
    /// Examples: modifier targets an attribute the agent never registered
    Internal,

    /// Fatal error - engine state is inconsistent.
    Fatal,
}

/// Common trait for all abilities-core errors.
///
/// - Use `#[derive(thiserror::Error)]` for the Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    ///
    /// Default implementation uses the error type name.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// Logs a rejected operation at a level matching its severity.
pub(crate) fn log_rejection<E: GameError>(operation: &'static str, error: &E) {
    match error.severity() {
        ErrorSeverity::Recoverable => {
            tracing::debug!(code = error.error_code(), "{} rejected: {}", operation, error)
        }
        ErrorSeverity::Validation => {
            tracing::info!(code = error.error_code(), "{} rejected: {}", operation, error)
        }
        ErrorSeverity::Internal | ErrorSeverity::Fatal => {
            tracing::warn!(code = error.error_code(), "{} failed: {}", operation, error)
        }
    }
}
