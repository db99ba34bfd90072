//! Modifier operations and the ordered fold that turns a base value plus
//! live modifiers into a final value.
//!
//! Every attribute uses the same calculation order, configured once per
//! engine: by default `Override → Multiply → Add`, so base 10 with `×2` and
//! `+5` yields `(10 × 2) + 5 = 25`.

use super::AttributeId;
use crate::error::GameError;

/// Operation a modifier performs against an attribute.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ModOp {
    /// Adds the value (negative values subtract). Multiple adds are summed.
    Add,
    /// Multiplies by the value. Multiple multipliers are applied in sequence.
    Multiply,
    /// Replaces the running value. The most recently applied override wins.
    Override,
}

impl ModOp {
    /// Applies this operation once to `value`.
    pub fn apply(self, value: f32, operand: f32) -> f32 {
        match self {
            ModOp::Add => value + operand,
            ModOp::Multiply => value * operand,
            ModOp::Override => operand,
        }
    }
}

/// A concrete, evaluated modification of one attribute.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Modifier {
    pub attribute: AttributeId,
    pub op: ModOp,
    pub value: f32,
}

impl Modifier {
    pub fn new(attribute: impl Into<AttributeId>, op: ModOp, value: f32) -> Self {
        Self {
            attribute: attribute.into(),
            op,
            value,
        }
    }

    pub fn add(attribute: impl Into<AttributeId>, value: f32) -> Self {
        Self::new(attribute, ModOp::Add, value)
    }

    pub fn multiply(attribute: impl Into<AttributeId>, value: f32) -> Self {
        Self::new(attribute, ModOp::Multiply, value)
    }

    pub fn override_with(attribute: impl Into<AttributeId>, value: f32) -> Self {
        Self::new(attribute, ModOp::Override, value)
    }
}

/// Total order in which modifier operations are folded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "[ModOp; 3]", into = "[ModOp; 3]"))]
pub struct ModifierOrder([ModOp; 3]);

/// The configured order does not name every operation exactly once.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("modifier order must list add, multiply and override exactly once (got {0:?})")]
pub struct InvalidModifierOrder(pub [ModOp; 3]);

impl GameError for InvalidModifierOrder {
    fn severity(&self) -> crate::error::ErrorSeverity {
        crate::error::ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        "CONFIG_INVALID_MODIFIER_ORDER"
    }
}

impl ModifierOrder {
    pub const DEFAULT: Self = Self([ModOp::Override, ModOp::Multiply, ModOp::Add]);

    pub fn new(order: [ModOp; 3]) -> Result<Self, InvalidModifierOrder> {
        let all_present = [ModOp::Add, ModOp::Multiply, ModOp::Override]
            .iter()
            .all(|op| order.contains(op));
        if all_present {
            Ok(Self(order))
        } else {
            Err(InvalidModifierOrder(order))
        }
    }

    pub fn ops(&self) -> [ModOp; 3] {
        self.0
    }

    /// Folds `modifiers` over `base` in this order.
    ///
    /// Within one operation, modifiers keep their application order: adds
    /// are summed, multipliers applied in sequence, the last override wins.
    ///
    /// ```text
    /// result = fold(base, [stage for op in order])
    /// ```
    pub fn fold<I>(&self, base: f32, modifiers: I) -> f32
    where
        I: IntoIterator<Item = (ModOp, f32)> + Clone,
    {
        self.0.iter().fold(base, |value, stage| match stage {
            ModOp::Override => modifiers
                .clone()
                .into_iter()
                .filter(|(op, _)| *op == ModOp::Override)
                .last()
                .map_or(value, |(_, operand)| operand),
            ModOp::Multiply => modifiers
                .clone()
                .into_iter()
                .filter(|(op, _)| *op == ModOp::Multiply)
                .fold(value, |acc, (_, operand)| acc * operand),
            ModOp::Add => {
                value
                    + modifiers
                        .clone()
                        .into_iter()
                        .filter(|(op, _)| *op == ModOp::Add)
                        .map(|(_, operand)| operand)
                        .sum::<f32>()
            }
        })
    }
}

impl Default for ModifierOrder {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<[ModOp; 3]> for ModifierOrder {
    type Error = InvalidModifierOrder;

    fn try_from(order: [ModOp; 3]) -> Result<Self, Self::Error> {
        Self::new(order)
    }
}

impl From<ModifierOrder> for [ModOp; 3] {
    fn from(order: ModifierOrder) -> Self {
        order.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_order_multiplies_before_adding() {
        let mods = [(ModOp::Add, 5.0), (ModOp::Multiply, 2.0)];
        assert_eq!(ModifierOrder::DEFAULT.fold(10.0, mods), 25.0);
    }

    #[test]
    fn configured_order_changes_the_result() {
        let order = ModifierOrder::new([ModOp::Override, ModOp::Add, ModOp::Multiply]).unwrap();
        let mods = [(ModOp::Add, 5.0), (ModOp::Multiply, 2.0)];
        assert_eq!(order.fold(10.0, mods), 30.0);
    }

    #[test]
    fn last_override_wins_and_feeds_later_stages() {
        let mods = [
            (ModOp::Override, 1.0),
            (ModOp::Add, 1.0),
            (ModOp::Override, 4.0),
        ];
        assert_eq!(ModifierOrder::DEFAULT.fold(10.0, mods), 5.0);
    }

    #[test]
    fn order_must_name_each_operation_once() {
        assert!(ModifierOrder::new([ModOp::Add, ModOp::Add, ModOp::Multiply]).is_err());
    }
}
