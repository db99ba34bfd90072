use std::collections::BTreeMap;

use super::{
    AttributeBounds, AttributeChange, AttributeDef, AttributeError, AttributeId, ModOp, Modifier,
    ModifierOrder,
};
use crate::effects::EffectHandle;

/// Live modifier contributed by one applied effect.
#[derive(Clone, Debug, PartialEq)]
struct LiveModifier {
    source: EffectHandle,
    op: ModOp,
    value: f32,
}

/// Base and final value of one attribute together with its live modifiers.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeValue {
    base: f32,
    current: f32,
    bounds: AttributeBounds,
    modifiers: Vec<LiveModifier>,
}

impl AttributeValue {
    fn new(base: f32, bounds: AttributeBounds) -> Self {
        let base = bounds.clamp(base);
        Self {
            base,
            current: base,
            bounds,
            modifiers: Vec::new(),
        }
    }

    pub fn base(&self) -> f32 {
        self.base
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn bounds(&self) -> AttributeBounds {
        self.bounds
    }

    pub fn modifier_count(&self) -> usize {
        self.modifiers.len()
    }

    fn recompute(&mut self, order: ModifierOrder) -> f32 {
        let mods = self.modifiers.iter().map(|m| (m.op, m.value));
        self.current = self.bounds.clamp(order.fold(self.base, mods));
        self.current
    }
}

/// Named numeric attributes of one agent.
///
/// Final values are derived: `clamp(fold(base, live modifiers))`. Permanent
/// changes (instant and periodic executions) go to the base value through
/// [`modify_base`](Self::modify_base); duration and infinite effects register
/// live modifiers through [`modify`](Self::modify) and withdraw them with
/// [`remove_modifiers`](Self::remove_modifiers).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributeSet {
    attributes: BTreeMap<AttributeId, AttributeValue>,
    order: ModifierOrder,
}

impl AttributeSet {
    pub fn new(order: ModifierOrder) -> Self {
        Self {
            attributes: BTreeMap::new(),
            order,
        }
    }

    pub fn from_defs<'a>(
        defs: impl IntoIterator<Item = &'a AttributeDef>,
        order: ModifierOrder,
    ) -> Self {
        let mut set = Self::new(order);
        for def in defs {
            set.register(def);
        }
        set
    }

    /// Registers (or re-registers) an attribute. Re-registering resets its base
    /// and bounds but keeps live modifiers.
    pub fn register(&mut self, def: &AttributeDef) {
        let order = self.order;
        let value = self
            .attributes
            .entry(def.id.clone())
            .and_modify(|value| {
                value.bounds = def.bounds;
                value.base = def.bounds.clamp(def.base);
            })
            .or_insert_with(|| AttributeValue::new(def.base, def.bounds));
        value.recompute(order);
    }

    pub fn order(&self) -> ModifierOrder {
        self.order
    }

    pub fn contains(&self, id: &AttributeId) -> bool {
        self.attributes.contains_key(id)
    }

    pub fn value(&self, id: &AttributeId) -> Option<&AttributeValue> {
        self.attributes.get(id)
    }

    /// Final value of `id`.
    pub fn get(&self, id: &AttributeId) -> Option<f32> {
        self.attributes.get(id).map(AttributeValue::current)
    }

    pub fn base(&self, id: &AttributeId) -> Option<f32> {
        self.attributes.get(id).map(AttributeValue::base)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Adds a live modifier tagged with `source` and returns the new final value.
    pub fn modify(&mut self, modifier: &Modifier, source: EffectHandle) -> Result<f32, AttributeError> {
        let order = self.order;
        let value = self.value_mut(&modifier.attribute)?;
        value.modifiers.push(LiveModifier {
            source,
            op: modifier.op,
            value: modifier.value,
        });
        Ok(value.recompute(order))
    }

    /// Permanently changes the base value and returns the final-value change.
    pub fn modify_base(&mut self, modifier: &Modifier) -> Result<AttributeChange, AttributeError> {
        let order = self.order;
        let value = self.value_mut(&modifier.attribute)?;
        let old = value.current;
        value.base = value.bounds.clamp(modifier.op.apply(value.base, modifier.value));
        let new = value.recompute(order);
        Ok(AttributeChange {
            attribute: modifier.attribute.clone(),
            old,
            new,
        })
    }

    /// Withdraws every live modifier contributed by `source` and recomputes the
    /// affected attributes. Returns one change per affected attribute.
    pub fn remove_modifiers(&mut self, source: EffectHandle) -> Vec<AttributeChange> {
        let order = self.order;
        let mut changes = Vec::new();
        for (id, value) in self.attributes.iter_mut() {
            let before = value.modifiers.len();
            value.modifiers.retain(|m| m.source != source);
            if value.modifiers.len() != before {
                let old = value.current;
                let new = value.recompute(order);
                changes.push(AttributeChange {
                    attribute: id.clone(),
                    old,
                    new,
                });
            }
        }
        changes
    }

    /// Number of live modifiers `source` currently contributes.
    pub fn modifiers_from(&self, source: EffectHandle) -> usize {
        self.attributes
            .values()
            .flat_map(|value| value.modifiers.iter())
            .filter(|m| m.source == source)
            .count()
    }

    /// Point-in-time copy of every final value.
    pub fn snapshot(&self) -> AttributeSnapshot {
        AttributeSnapshot {
            values: self
                .attributes
                .iter()
                .map(|(id, value)| (id.clone(), value.current))
                .collect(),
        }
    }

    fn value_mut(&mut self, id: &AttributeId) -> Result<&mut AttributeValue, AttributeError> {
        self.attributes
            .get_mut(id)
            .ok_or_else(|| AttributeError::Unknown(id.clone()))
    }
}

/// Frozen final values, used for instigator snapshots and state sync.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AttributeSnapshot {
    values: BTreeMap<AttributeId, f32>,
}

impl AttributeSnapshot {
    pub fn get(&self, id: &AttributeId) -> Option<f32> {
        self.values.get(id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AttributeId, f32)> {
        self.values.iter().map(|(id, value)| (id, *value))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(AttributeId, f32)> for AttributeSnapshot {
    fn from_iter<I: IntoIterator<Item = (AttributeId, f32)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::AgentId;
    use crate::effects::{EffectId, EffectKey};

    fn handle(id: u64) -> EffectHandle {
        EffectHandle::new(EffectId(id), AgentId::default(), EffectKey::default())
    }

    fn health(base: f32) -> AttributeSet {
        AttributeSet::from_defs(&[AttributeDef::new("Health", base)], ModifierOrder::DEFAULT)
    }

    #[test]
    fn removing_one_source_recomputes_from_the_rest() {
        let mut set = health(10.0);
        let add = handle(1);
        let mul = handle(2);
        set.modify(&Modifier::add("Health", 5.0), add).unwrap();
        let value = set.modify(&Modifier::multiply("Health", 2.0), mul).unwrap();
        assert_eq!(value, 25.0);

        let changes = set.remove_modifiers(mul);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].old, 25.0);
        assert_eq!(changes[0].new, 15.0);
        assert_eq!(set.get(&"Health".into()), Some(15.0));

        assert!(set.remove_modifiers(mul).is_empty());
    }

    #[test]
    fn unknown_attribute_is_rejected_without_side_effects() {
        let mut set = health(10.0);
        let err = set.modify(&Modifier::add("Mana", 1.0), handle(1)).unwrap_err();
        assert_eq!(err, AttributeError::Unknown("Mana".into()));
        assert_eq!(set.modifiers_from(handle(1)), 0);
    }

    #[test]
    fn base_changes_are_clamped_and_survive_modifier_removal() {
        let mut set = AttributeSet::from_defs(
            &[AttributeDef::new("Health", 10.0).with_bounds(AttributeBounds::NON_NEGATIVE)],
            ModifierOrder::DEFAULT,
        );
        let change = set.modify_base(&Modifier::add("Health", -25.0)).unwrap();
        assert_eq!(change.new, 0.0);
        assert_eq!(set.base(&"Health".into()), Some(0.0));

        set.modify_base(&Modifier::add("Health", 4.0)).unwrap();
        set.modify(&Modifier::multiply("Health", 3.0), handle(7)).unwrap();
        assert_eq!(set.get(&"Health".into()), Some(12.0));
        set.remove_modifiers(handle(7));
        assert_eq!(set.get(&"Health".into()), Some(4.0));
    }

    #[test]
    fn snapshot_is_detached_from_later_changes() {
        let mut set = health(10.0);
        let snapshot = set.snapshot();
        set.modify_base(&Modifier::add("Health", 5.0)).unwrap();
        assert_eq!(snapshot.get(&"Health".into()), Some(10.0));
        assert_eq!(set.snapshot().get(&"Health".into()), Some(15.0));
    }
}
