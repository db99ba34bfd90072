//! Authoring formats that reference other content by name.
//!
//! Effects are authored directly as [`EffectSpec`](abilities_core::EffectSpec).
//! Abilities, ability sets and agent templates point at effects, abilities
//! and sets by name; [`ContentCatalog`](super::ContentCatalog) links them.

use abilities_core::{
    AttributeDef, ConfirmPolicy, FollowUpTarget, InputBehavior, MontageRequest, Tag, TagContainer,
};

/// Effect applied by an ability when it ticks or finishes, by effect name.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FollowUpSpec {
    pub effect: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub target: FollowUpTarget,
}

/// Ability definition with its effects referenced by name.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilitySpec {
    pub tag: Tag,
    #[cfg_attr(feature = "serde", serde(default))]
    pub activation: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cooldown: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cost: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub owned_tags: TagContainer,
    #[cfg_attr(feature = "serde", serde(default))]
    pub activation_tags: TagContainer,
    #[cfg_attr(feature = "serde", serde(default))]
    pub blocked_by: TagContainer,
    #[cfg_attr(feature = "serde", serde(default))]
    pub confirm: ConfirmPolicy,
    #[cfg_attr(feature = "serde", serde(default))]
    pub input: InputBehavior,
    #[cfg_attr(feature = "serde", serde(default))]
    pub on_period: Vec<FollowUpSpec>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub on_finish: Vec<FollowUpSpec>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub montage: Option<MontageRequest>,
}

impl AbilitySpec {
    pub fn new(tag: impl Into<Tag>) -> Self {
        Self {
            tag: tag.into(),
            activation: None,
            cooldown: None,
            cost: None,
            owned_tags: TagContainer::new(),
            activation_tags: TagContainer::new(),
            blocked_by: TagContainer::new(),
            confirm: ConfirmPolicy::default(),
            input: InputBehavior::default(),
            on_period: Vec::new(),
            on_finish: Vec::new(),
            montage: None,
        }
    }

    /// Every effect name this ability refers to.
    pub fn effect_names(&self) -> impl Iterator<Item = &str> {
        self.activation
            .iter()
            .chain(&self.cooldown)
            .chain(&self.cost)
            .map(String::as_str)
            .chain(self.on_period.iter().map(|follow_up| follow_up.effect.as_str()))
            .chain(self.on_finish.iter().map(|follow_up| follow_up.effect.as_str()))
    }
}

/// One granted ability inside a set.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GrantSpec {
    pub ability: Tag,
    #[cfg_attr(feature = "serde", serde(default))]
    pub input: Option<Tag>,
}

/// Named bundle of abilities and their input bindings.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilitySetSpec {
    pub name: String,
    pub abilities: Vec<GrantSpec>,
}

/// Starting attributes, loose tags and ability sets for a kind of agent.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentTemplate {
    pub name: String,
    pub attributes: Vec<AttributeDef>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tags: TagContainer,
    #[cfg_attr(feature = "serde", serde(default))]
    pub ability_sets: Vec<String>,
}
