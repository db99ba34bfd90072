use std::sync::Arc;

use crate::effects::EffectSpec;
use crate::tags::{Tag, TagContainer};

/// Whether an activation commits immediately or waits for the host to confirm
/// a target.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ConfirmPolicy {
    #[default]
    Instant,
    WaitForConfirm,
}

/// How input events drive the ability.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum InputBehavior {
    /// Press activates; release is ignored.
    #[default]
    OnPress,
    /// Release activates; press is ignored (except to confirm).
    OnRelease,
    /// Press activates; release finishes the running activation early.
    Channel,
}

/// Recipient of a follow-up effect.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum FollowUpTarget {
    /// The agent running the ability.
    #[default]
    Owner,
    /// The agent named by the confirmation hit. Skipped if there is none.
    Confirmed,
}

/// Effect applied when the activation ticks or finishes.
#[derive(Clone, Debug, PartialEq)]
pub struct FollowUpEffect {
    pub effect: Arc<EffectSpec>,
    pub target: FollowUpTarget,
}

impl FollowUpEffect {
    pub fn new(effect: Arc<EffectSpec>, target: FollowUpTarget) -> Self {
        Self { effect, target }
    }
}

/// Animation the host should play while the activation runs.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MontageRequest {
    pub name: String,
    /// Natural length of the clip in seconds.
    pub length: f32,
}

impl MontageRequest {
    /// Playback rate that fits the clip into `activation_seconds`.
    pub fn play_rate(&self, activation_seconds: f32) -> f32 {
        if activation_seconds > 0.0 && self.length > 0.0 {
            self.length / activation_seconds
        } else {
            1.0
        }
    }
}

/// Authored definition of an ability, shared by every agent granted it.
#[derive(Clone, Debug, PartialEq)]
pub struct AbilityDef {
    pub tag: Tag,
    /// Drives the activation: its lifetime is the ability's Active phase.
    pub activation_effect: Option<Arc<EffectSpec>>,
    pub cooldown_effect: Option<Arc<EffectSpec>>,
    /// Instant effect applied to the owner on commit.
    pub cost_effect: Option<Arc<EffectSpec>>,
    /// Appended to the activation effect's tags.
    pub owned_tags: TagContainer,
    /// Granted to the owner while the activation runs.
    pub activation_tags: TagContainer,
    /// The ability cannot start while the owner has any of these.
    pub blocked_by: TagContainer,
    pub confirm: ConfirmPolicy,
    pub input: InputBehavior,
    pub on_period: Vec<FollowUpEffect>,
    pub on_finish: Vec<FollowUpEffect>,
    pub montage: Option<MontageRequest>,
}

impl AbilityDef {
    pub fn new(tag: impl Into<Tag>) -> Self {
        Self {
            tag: tag.into(),
            activation_effect: None,
            cooldown_effect: None,
            cost_effect: None,
            owned_tags: TagContainer::new(),
            activation_tags: TagContainer::new(),
            blocked_by: TagContainer::new(),
            confirm: ConfirmPolicy::Instant,
            input: InputBehavior::OnPress,
            on_period: Vec::new(),
            on_finish: Vec::new(),
            montage: None,
        }
    }

    pub fn with_activation(mut self, effect: EffectSpec) -> Self {
        self.activation_effect = Some(Arc::new(effect));
        self
    }

    pub fn with_cooldown(mut self, effect: EffectSpec) -> Self {
        self.cooldown_effect = Some(Arc::new(effect));
        self
    }

    pub fn with_cost(mut self, effect: EffectSpec) -> Self {
        self.cost_effect = Some(Arc::new(effect));
        self
    }

    pub fn with_owned_tag(mut self, tag: impl Into<Tag>) -> Self {
        self.owned_tags.insert(tag.into());
        self
    }

    pub fn with_activation_tag(mut self, tag: impl Into<Tag>) -> Self {
        self.activation_tags.insert(tag.into());
        self
    }

    pub fn blocked_by(mut self, tag: impl Into<Tag>) -> Self {
        self.blocked_by.insert(tag.into());
        self
    }

    pub fn with_confirm(mut self, confirm: ConfirmPolicy) -> Self {
        self.confirm = confirm;
        self
    }

    pub fn with_input(mut self, input: InputBehavior) -> Self {
        self.input = input;
        self
    }

    pub fn on_period(mut self, effect: EffectSpec, target: FollowUpTarget) -> Self {
        self.on_period
            .push(FollowUpEffect::new(Arc::new(effect), target));
        self
    }

    pub fn on_finish(mut self, effect: EffectSpec, target: FollowUpTarget) -> Self {
        self.on_finish
            .push(FollowUpEffect::new(Arc::new(effect), target));
        self
    }

    pub fn with_montage(mut self, name: impl Into<String>, length: f32) -> Self {
        self.montage = Some(MontageRequest {
            name: name.into(),
            length,
        });
        self
    }

    /// Authored activation time in seconds, when it is a constant.
    pub fn activation_seconds(&self) -> f32 {
        self.activation_effect
            .as_ref()
            .and_then(|effect| effect.duration.as_constant())
            .unwrap_or(0.0)
    }
}

/// One ability of a set and the input tag it is bound to.
#[derive(Clone, Debug, PartialEq)]
pub struct AbilitySetEntry {
    pub ability: Arc<AbilityDef>,
    pub input: Option<Tag>,
}

/// Named bundle of abilities granted together.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AbilitySet {
    pub name: String,
    pub entries: Vec<AbilitySetEntry>,
}

impl AbilitySet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn with(mut self, ability: Arc<AbilityDef>, input: Option<Tag>) -> Self {
        self.entries.push(AbilitySetEntry { ability, input });
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
