use std::fmt;

use crate::common::AgentId;

slotmap::new_key_type! {
    /// Slot of an effect instance inside one agent's container.
    pub struct EffectKey;
}

/// Globally unique identity of one effect application. Zero is never issued.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectId(pub u64);

impl EffectId {
    pub const INVALID: Self = Self(0);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

/// Non-owning reference to an applied effect.
///
/// A handle is *well-formed* once issued and stays so forever; whether it is
/// still *live* is a question for the owning agent's container, answered
/// through the world. The default handle is the invalid handle returned by
/// rejected applications.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectHandle {
    pub id: EffectId,
    /// Agent whose container owns the instance.
    pub agent: AgentId,
    pub key: EffectKey,
}

impl EffectHandle {
    pub fn new(id: EffectId, agent: AgentId, key: EffectKey) -> Self {
        Self { id, agent, key }
    }

    pub fn invalid() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.id.is_valid()
    }
}

impl fmt::Display for EffectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "effect#{}", self.id.0)
        } else {
            f.write_str("effect#invalid")
        }
    }
}

/// Issues effect ids, monotonically, for the whole world.
#[derive(Clone, Debug, Default)]
pub struct HandleGenerator {
    last: u64,
}

impl HandleGenerator {
    pub fn next_id(&mut self) -> EffectId {
        self.last += 1;
        EffectId(self.last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique_and_valid() {
        let mut generator = HandleGenerator::default();
        let first = generator.next_id();
        let second = generator.next_id();
        assert!(first.is_valid());
        assert_ne!(first, second);
        assert!(!EffectHandle::invalid().is_valid());
        assert_eq!(EffectHandle::invalid().to_string(), "effect#invalid");
    }
}
