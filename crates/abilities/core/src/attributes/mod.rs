//! Attribute storage and the modifier pipeline.
//!
//! # Architecture
//!
//! ```text
//! [ Base value ]            permanent; changed by instant and periodic executions
//!      ↓
//! [ Live modifiers ]        tagged with the EffectHandle that contributed them
//!      ↓  fold in ModifierOrder (Override → Multiply → Add by default)
//! [ Clamp to bounds ]
//!      ↓
//! [ Final value ]
//! ```
//!
//! The final value is always recomputed from scratch from the base and the
//! ordered live modifiers, so removing one effect's contribution can never
//! drift when several effects target the same attribute.

pub mod modifier;
pub mod set;

use std::fmt;

use crate::error::{ErrorSeverity, GameError};

pub use modifier::{InvalidModifierOrder, ModOp, Modifier, ModifierOrder};
pub use set::{AttributeSet, AttributeSnapshot, AttributeValue};

/// Name of a registered attribute (`Health`, `Mana`, `ActivationTime`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AttributeId(String);

impl AttributeId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AttributeId {
    fn from(value: &str) -> Self {
        AttributeId::new(value)
    }
}

impl From<String> for AttributeId {
    fn from(value: String) -> Self {
        AttributeId(value)
    }
}

/// Inclusive clamp applied after the modifier fold.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeBounds {
    pub min: f32,
    pub max: f32,
}

impl AttributeBounds {
    pub const UNBOUNDED: Self = Self {
        min: f32::MIN,
        max: f32::MAX,
    };

    /// Non-negative attribute with no upper limit (health, mana).
    pub const NON_NEGATIVE: Self = Self {
        min: 0.0,
        max: f32::MAX,
    };

    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Both ends are numbers and `min <= max`.
    pub fn is_valid(&self) -> bool {
        !self.min.is_nan() && !self.max.is_nan() && self.min <= self.max
    }

    /// Never panics, even on bounds that fail [`is_valid`](Self::is_valid);
    /// those are rejected at registration.
    pub fn clamp(&self, value: f32) -> f32 {
        value.max(self.min).min(self.max)
    }
}

impl Default for AttributeBounds {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

/// Authoring-time definition of one attribute on an agent.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeDef {
    pub id: AttributeId,
    pub base: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub bounds: AttributeBounds,
}

impl AttributeDef {
    pub fn new(id: impl Into<AttributeId>, base: f32) -> Self {
        Self {
            id: id.into(),
            base,
            bounds: AttributeBounds::UNBOUNDED,
        }
    }

    pub fn with_bounds(mut self, bounds: AttributeBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn validate(&self) -> Result<(), AttributeError> {
        if !self.bounds.is_valid() {
            return Err(AttributeError::InvalidBounds(self.id.clone()));
        }
        if self.base.is_nan() {
            return Err(AttributeError::InvalidBase(self.id.clone()));
        }
        Ok(())
    }
}

/// A recorded change of an attribute's final value.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeChange {
    pub attribute: AttributeId,
    pub old: f32,
    pub new: f32,
}

impl AttributeChange {
    pub fn delta(&self) -> f32 {
        self.new - self.old
    }

    pub fn is_noop(&self) -> bool {
        self.old == self.new
    }
}

/// Errors produced by the attribute pipeline.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttributeError {
    /// The attribute was never registered on this agent.
    ///
    /// A mismatch between effect content and the attribute registry; fatal to
    /// the single operation that hit it, never to the simulation.
    #[error("unknown attribute '{0}'")]
    Unknown(AttributeId),

    /// The definition's bounds are NaN or have `min > max`.
    #[error("attribute '{0}' has invalid bounds")]
    InvalidBounds(AttributeId),

    #[error("attribute '{0}' has a NaN base value")]
    InvalidBase(AttributeId),
}

impl GameError for AttributeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            AttributeError::Unknown(_) => ErrorSeverity::Internal,
            AttributeError::InvalidBounds(_) | AttributeError::InvalidBase(_) => {
                ErrorSeverity::Validation
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AttributeError::Unknown(_) => "ATTRIBUTE_UNKNOWN",
            AttributeError::InvalidBounds(_) => "ATTRIBUTE_INVALID_BOUNDS",
            AttributeError::InvalidBase(_) => "ATTRIBUTE_INVALID_BASE",
        }
    }
}
