use std::collections::HashMap;
use std::sync::Arc;

use slotmap::SlotMap;

use super::{AbilityDef, AbilityId, AbilityInstance, ActivationError};
use crate::common::AgentId;
use crate::tags::Tag;

/// Every ability granted to one agent, plus the agent's executing slot.
///
/// At most one ability per agent may be Activating, WaitingForConfirm or
/// Active at any time. The container is the only writer of that slot.
#[derive(Clone, Debug)]
pub struct AbilityContainer {
    owner: AgentId,
    abilities: SlotMap<AbilityId, AbilityInstance>,
    by_tag: HashMap<Tag, AbilityId>,
    by_input: HashMap<Tag, AbilityId>,
    executing: Option<AbilityId>,
}

impl AbilityContainer {
    pub fn new(owner: AgentId) -> Self {
        Self {
            owner,
            abilities: SlotMap::with_key(),
            by_tag: HashMap::new(),
            by_input: HashMap::new(),
            executing: None,
        }
    }

    /// Grants `def`, bound to `input` if given.
    ///
    /// Granting a tag the agent already has rebinds its input and returns the
    /// existing id.
    pub fn grant(&mut self, def: Arc<AbilityDef>, input: Option<Tag>) -> AbilityId {
        if let Some(&id) = self.by_tag.get(&def.tag) {
            self.rebind(id, input);
            return id;
        }
        let owner = self.owner;
        let tag = def.tag.clone();
        let id = self
            .abilities
            .insert_with_key(|id| AbilityInstance::new(id, owner, def, None));
        tracing::debug!(ability = %tag, "ability granted");
        self.by_tag.insert(tag, id);
        self.rebind(id, input);
        id
    }

    /// Drops the ability. The caller must have stopped any running activation.
    pub fn remove(&mut self, id: AbilityId) -> Option<AbilityInstance> {
        let instance = self.abilities.remove(id)?;
        self.by_tag.remove(instance.tag());
        if let Some(input) = &instance.input {
            self.by_input.remove(input);
        }
        if self.executing == Some(id) {
            self.executing = None;
        }
        tracing::debug!(ability = %instance.tag(), "ability revoked");
        Some(instance)
    }

    fn rebind(&mut self, id: AbilityId, input: Option<Tag>) {
        let Some(instance) = self.abilities.get_mut(id) else {
            return;
        };
        if let Some(previous) = instance.input.take() {
            self.by_input.remove(&previous);
        }
        if let Some(input) = input.filter(Tag::is_valid) {
            if let Some(displaced) = self.by_input.insert(input.clone(), id) {
                if let Some(other) = self.abilities.get_mut(displaced) {
                    other.input = None;
                }
            }
            if let Some(instance) = self.abilities.get_mut(id) {
                instance.input = Some(input);
            }
        }
    }

    pub fn get(&self, id: AbilityId) -> Option<&AbilityInstance> {
        self.abilities.get(id)
    }

    pub fn get_mut(&mut self, id: AbilityId) -> Option<&mut AbilityInstance> {
        self.abilities.get_mut(id)
    }

    pub fn by_tag(&self, tag: &Tag) -> Option<AbilityId> {
        self.by_tag.get(tag).copied()
    }

    pub fn by_input(&self, input: &Tag) -> Option<AbilityId> {
        self.by_input.get(input).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AbilityInstance> {
        self.abilities.values()
    }

    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }

    /// The ability holding the executing slot.
    pub fn executing(&self) -> Option<AbilityId> {
        self.executing
    }

    /// Takes the executing slot for `id`.
    pub(crate) fn claim(&mut self, id: AbilityId) -> Result<(), ActivationError> {
        match self.executing {
            None => {
                self.executing = Some(id);
                Ok(())
            }
            Some(holder) if holder == id => Err(ActivationError::AlreadyActivating),
            Some(holder) => Err(ActivationError::Reentrant {
                executing: self
                    .abilities
                    .get(holder)
                    .map(|instance| instance.tag().clone())
                    .unwrap_or_else(|| Tag::new("unknown")),
            }),
        }
    }

    /// Frees the executing slot if `id` holds it.
    pub(crate) fn release(&mut self, id: AbilityId) -> bool {
        if self.executing == Some(id) {
            self.executing = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container() -> AbilityContainer {
        AbilityContainer::new(AgentId::default())
    }

    #[test]
    fn lookups_by_tag_and_input() {
        let mut abilities = container();
        let bolt = abilities.grant(Arc::new(AbilityDef::new("Ability.Bolt")), Some("Input.Primary".into()));
        let heal = abilities.grant(Arc::new(AbilityDef::new("Ability.Heal")), None);
        assert_eq!(abilities.by_tag(&"Ability.Bolt".into()), Some(bolt));
        assert_eq!(abilities.by_input(&"Input.Primary".into()), Some(bolt));

        let again = abilities.grant(Arc::new(AbilityDef::new("Ability.Heal")), Some("Input.Primary".into()));
        assert_eq!(again, heal);
        assert_eq!(abilities.by_input(&"Input.Primary".into()), Some(heal));
        assert_eq!(abilities.get(bolt).unwrap().input(), None);
        assert_eq!(abilities.len(), 2);
    }

    #[test]
    fn only_one_ability_may_hold_the_slot() {
        let mut abilities = container();
        let a = abilities.grant(Arc::new(AbilityDef::new("Ability.A")), None);
        let b = abilities.grant(Arc::new(AbilityDef::new("Ability.B")), None);
        abilities.claim(a).unwrap();
        assert_eq!(
            abilities.claim(b),
            Err(ActivationError::Reentrant {
                executing: "Ability.A".into()
            })
        );
        assert_eq!(abilities.claim(a), Err(ActivationError::AlreadyActivating));
        assert!(!abilities.release(b));
        assert!(abilities.release(a));
        assert!(abilities.claim(b).is_ok());
    }

    #[test]
    fn removing_the_holder_frees_the_slot() {
        let mut abilities = container();
        let a = abilities.grant(Arc::new(AbilityDef::new("Ability.A")), Some("Input.A".into()));
        abilities.claim(a).unwrap();
        assert!(abilities.remove(a).is_some());
        assert_eq!(abilities.executing(), None);
        assert_eq!(abilities.by_input(&"Input.A".into()), None);
        assert!(abilities.remove(a).is_none());
    }
}
