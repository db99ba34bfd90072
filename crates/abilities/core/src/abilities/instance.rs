use std::sync::Arc;

use super::{AbilityDef, AbilityId};
use crate::common::{AgentId, HitData};
use crate::effects::EffectHandle;
use crate::tags::Tag;

/// Activation state of one ability.
///
/// ```text
/// Idle ─► Activating ─► (WaitingForConfirm) ─► Active ─► Finished
///              ▲ │                 │                 │         │
///              │ └─────────────────┴─────────────────┴──► Cancelled
///              │                                               │
///              └──────────────── next activation ◄─────────────┘
/// ```
///
/// `Idle` only describes an ability that has not been activated since it was
/// granted; nothing returns to it. `Finished` and `Cancelled` are resting
/// states that report how the last activation ended. They stay observable
/// until the next activation moves the ability straight to `Activating`, and
/// they pass the same activation checks as `Idle`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum AbilityState {
    #[default]
    Idle,
    Activating,
    WaitingForConfirm,
    Active,
    Finished,
    Cancelled,
}

impl AbilityState {
    /// Holds (or is about to hold) the agent's executing slot.
    pub fn is_running(self) -> bool {
        matches!(
            self,
            AbilityState::Activating | AbilityState::WaitingForConfirm | AbilityState::Active
        )
    }

    /// Idle, or ended by the last activation.
    pub fn is_resting(self) -> bool {
        !self.is_running()
    }
}

/// Sub-task running on behalf of an activation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbilityTask {
    /// One-shot listener for the host's confirmation.
    WaitForConfirm,
}

/// Monotonic activation counters, replicated to peers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilityCounters {
    pub activation_started: u32,
    pub period: u32,
    pub finished: u32,
    pub cancelled: u32,
    pub cooldown_started: u32,
    pub cooldown_expired: u32,
}

/// One ability granted to an agent.
#[derive(Clone, Debug)]
pub struct AbilityInstance {
    pub(crate) id: AbilityId,
    pub(crate) owner: AgentId,
    pub(crate) def: Arc<AbilityDef>,
    pub(crate) input: Option<Tag>,
    pub(crate) state: AbilityState,
    pub(crate) activation: Option<EffectHandle>,
    pub(crate) cooldown: Option<EffectHandle>,
    pub(crate) tasks: Vec<AbilityTask>,
    pub(crate) counters: AbilityCounters,
    pub(crate) confirmed: Option<HitData>,
}

impl AbilityInstance {
    pub(crate) fn new(id: AbilityId, owner: AgentId, def: Arc<AbilityDef>, input: Option<Tag>) -> Self {
        Self {
            id,
            owner,
            def,
            input,
            state: AbilityState::Idle,
            activation: None,
            cooldown: None,
            tasks: Vec::new(),
            counters: AbilityCounters::default(),
            confirmed: None,
        }
    }

    pub fn id(&self) -> AbilityId {
        self.id
    }

    pub fn owner(&self) -> AgentId {
        self.owner
    }

    pub fn def(&self) -> &Arc<AbilityDef> {
        &self.def
    }

    pub fn tag(&self) -> &Tag {
        &self.def.tag
    }

    pub fn input(&self) -> Option<&Tag> {
        self.input.as_ref()
    }

    pub fn state(&self) -> AbilityState {
        self.state
    }

    pub fn activation_handle(&self) -> Option<EffectHandle> {
        self.activation
    }

    pub fn cooldown_handle(&self) -> Option<EffectHandle> {
        self.cooldown
    }

    pub fn counters(&self) -> AbilityCounters {
        self.counters
    }

    pub fn confirmed_hit(&self) -> Option<HitData> {
        self.confirmed
    }

    pub fn is_waiting_for_confirm(&self) -> bool {
        self.state == AbilityState::WaitingForConfirm && self.tasks.contains(&AbilityTask::WaitForConfirm)
    }

    /// Consumes the confirm listener. Returns `false` if none was running.
    pub(crate) fn take_confirm(&mut self) -> bool {
        match self.tasks.iter().position(|task| *task == AbilityTask::WaitForConfirm) {
            Some(index) => {
                self.tasks.remove(index);
                true
            }
            None => false,
        }
    }

    /// Moves to a resting state and forgets the activation.
    pub(crate) fn settle(&mut self, state: AbilityState) {
        self.state = state;
        self.activation = None;
        self.tasks.clear();
    }
}
