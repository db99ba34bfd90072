//! Magnitude formulas.
//!
//! Formulas are closed variants evaluated against a [`MagnitudeContext`].
//! `Custom` wraps an opaque pure function supplied by the host; it cannot be
//! authored in content files.

use std::fmt;
use std::sync::Arc;

use super::EffectContext;
use crate::attributes::{AttributeError, AttributeId, AttributeSet};

/// Inputs available to a formula.
#[derive(Clone, Copy, Debug)]
pub struct MagnitudeContext<'a> {
    pub context: &'a EffectContext,
    /// Current attributes of the agent receiving the effect.
    pub target: &'a AttributeSet,
}

/// Which agent an attribute-based magnitude reads from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum AttributeSource {
    /// Snapshot taken when the context was created.
    #[default]
    Instigator,
    /// Live value on the target at evaluation time.
    Target,
}

/// `(attribute + pre_add) * coefficient + post_add`
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeBased {
    pub attribute: AttributeId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub source: AttributeSource,
    #[cfg_attr(feature = "serde", serde(default = "one"))]
    pub coefficient: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub pre_add: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub post_add: f32,
}

#[cfg(feature = "serde")]
fn one() -> f32 {
    1.0
}

impl AttributeBased {
    pub fn new(attribute: impl Into<AttributeId>, source: AttributeSource) -> Self {
        Self {
            attribute: attribute.into(),
            source,
            coefficient: 1.0,
            pre_add: 0.0,
            post_add: 0.0,
        }
    }

    pub fn scaled(mut self, coefficient: f32) -> Self {
        self.coefficient = coefficient;
        self
    }

    fn evaluate(&self, ctx: &MagnitudeContext<'_>) -> Result<f32, AttributeError> {
        let value = match self.source {
            AttributeSource::Instigator => ctx.context.instigator_snapshot().get(&self.attribute),
            AttributeSource::Target => ctx.target.get(&self.attribute),
        }
        .ok_or_else(|| AttributeError::Unknown(self.attribute.clone()))?;
        Ok((value + self.pre_add) * self.coefficient + self.post_add)
    }
}

type FormulaFn = dyn Fn(&MagnitudeContext<'_>) -> f32 + Send + Sync;

/// Host-supplied pure formula.
#[derive(Clone)]
pub struct CustomMagnitude {
    name: String,
    formula: Arc<FormulaFn>,
}

impl CustomMagnitude {
    pub fn new<F>(name: impl Into<String>, formula: F) -> Self
    where
        F: Fn(&MagnitudeContext<'_>) -> f32 + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            formula: Arc::new(formula),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for CustomMagnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CustomMagnitude").field(&self.name).finish()
    }
}

impl PartialEq for CustomMagnitude {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.formula, &other.formula)
    }
}

/// How large a modifier, duration or period is.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Magnitude {
    Constant(f32),
    AttributeBased(AttributeBased),
    #[cfg_attr(feature = "serde", serde(skip))]
    Custom(CustomMagnitude),
}

impl Magnitude {
    pub const ZERO: Self = Self::Constant(0.0);

    pub fn custom<F>(name: impl Into<String>, formula: F) -> Self
    where
        F: Fn(&MagnitudeContext<'_>) -> f32 + Send + Sync + 'static,
    {
        Self::Custom(CustomMagnitude::new(name, formula))
    }

    pub fn evaluate(&self, ctx: &MagnitudeContext<'_>) -> Result<f32, AttributeError> {
        match self {
            Magnitude::Constant(value) => Ok(*value),
            Magnitude::AttributeBased(formula) => formula.evaluate(ctx),
            Magnitude::Custom(custom) => Ok((custom.formula)(ctx)),
        }
    }

    /// Value known without any context.
    pub fn as_constant(&self) -> Option<f32> {
        match self {
            Magnitude::Constant(value) => Some(*value),
            _ => None,
        }
    }
}

impl Default for Magnitude {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<f32> for Magnitude {
    fn from(value: f32) -> Self {
        Magnitude::Constant(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{AttributeDef, ModifierOrder};
    use crate::common::AgentId;

    #[test]
    fn attribute_based_reads_snapshot_or_target() {
        let instigator = AttributeSet::from_defs(&[AttributeDef::new("Power", 4.0)], ModifierOrder::DEFAULT);
        let target = AttributeSet::from_defs(&[AttributeDef::new("Armor", 10.0)], ModifierOrder::DEFAULT);
        let context = EffectContext::new(AgentId::default(), instigator.snapshot());
        let ctx = MagnitudeContext {
            context: &context,
            target: &target,
        };

        let mut power = AttributeBased::new("Power", AttributeSource::Instigator).scaled(2.0);
        power.pre_add = 1.0;
        power.post_add = 0.5;
        assert_eq!(Magnitude::AttributeBased(power).evaluate(&ctx), Ok(10.5));

        let armor = AttributeBased::new("Armor", AttributeSource::Target).scaled(-0.5);
        assert_eq!(Magnitude::AttributeBased(armor).evaluate(&ctx), Ok(-5.0));

        let missing = AttributeBased::new("Armor", AttributeSource::Instigator);
        assert!(Magnitude::AttributeBased(missing).evaluate(&ctx).is_err());
    }

    #[test]
    fn custom_formulas_see_the_target() {
        let target = AttributeSet::from_defs(&[AttributeDef::new("Health", 80.0)], ModifierOrder::DEFAULT);
        let context = EffectContext::default();
        let ctx = MagnitudeContext {
            context: &context,
            target: &target,
        };
        let execute = Magnitude::custom("missing_health", |ctx| {
            100.0 - ctx.target.get(&"Health".into()).unwrap_or(0.0)
        });
        assert_eq!(execute.evaluate(&ctx), Ok(20.0));
    }
}
