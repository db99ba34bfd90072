//! Abilities: authored definitions, per-agent instances and the executing slot.
//!
//! The activation state machine itself runs in
//! [`AbilitiesComponent`](crate::component::AbilitiesComponent), which owns
//! both the ability container and the effect container the activation,
//! cooldown and cost effects live in.

pub mod container;
pub mod def;
pub mod error;
pub mod instance;

pub use container::AbilityContainer;
pub use def::{
    AbilityDef, AbilitySet, AbilitySetEntry, ConfirmPolicy, FollowUpEffect, FollowUpTarget,
    InputBehavior, MontageRequest,
};
pub use error::ActivationError;
pub use instance::{AbilityCounters, AbilityInstance, AbilityState, AbilityTask};

slotmap::new_key_type! {
    /// Generation-tagged reference to an ability granted to one agent.
    pub struct AbilityId;
}

/// What an input or confirmation event ended up doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum InputOutcome {
    /// A new activation started.
    Activated,
    /// A waiting activation was confirmed and committed.
    Confirmed,
    /// A running activation was finished early.
    Finished,
    /// A channel released before it committed.
    Cancelled,
    /// Nothing is bound to the input or the ability does not react to it.
    Ignored,
}
