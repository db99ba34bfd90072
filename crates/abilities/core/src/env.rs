//! Shared simulation services handed to every component operation.
//!
//! [`Env`] bundles what a single agent cannot own on its own: the clock and
//! timer queue, the cue broadcaster, the world-wide handle generator, the
//! queue of deferred work produced while an operation runs, and requests
//! addressed to the host.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::abilities::AbilityId;
use crate::common::{AgentId, HitData, Tick};
use crate::config::EngineConfig;
use crate::cues::CueBroadcaster;
use crate::effects::{EffectHandle, EffectId, EffectSpec, HandleGenerator};
use crate::scheduler::Scheduler;
use crate::tags::Tag;

/// Ability entry point an effect callback routes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum AbilityHook {
    ActivationApplied,
    ActivationPeriod,
    ActivationFinished,
    ActivationCancelled,
    CooldownExpired,
}

impl AbilityHook {
    /// Hooks that only move ability state and release slots. Still dispatched
    /// once the callback chain limit is reached.
    pub fn settles_state(self) -> bool {
        !matches!(self, AbilityHook::ActivationPeriod)
    }
}

/// Closed reference from an effect slot to an ability hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CallbackBinding {
    pub owner: AgentId,
    pub ability: AbilityId,
    pub hook: AbilityHook,
}

impl CallbackBinding {
    pub fn new(owner: AgentId, ability: AbilityId, hook: AbilityHook) -> Self {
        Self {
            owner,
            ability,
            hook,
        }
    }
}

/// Effect application requested by an ability while an operation runs.
#[derive(Clone, Debug)]
pub(crate) struct FollowUpApply {
    pub source: AgentId,
    pub target: AgentId,
    pub spec: Arc<EffectSpec>,
    pub hit: Option<HitData>,
}

/// Work queued during an operation and drained by the world afterwards.
#[derive(Clone, Debug)]
pub(crate) enum Deferred {
    Callback {
        binding: CallbackBinding,
        handle: EffectHandle,
    },
    Apply(FollowUpApply),
}

/// Something the engine needs the host to do.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HostRequest {
    /// Play an animation montage scaled to the activation time.
    PlayMontage {
        agent: AgentId,
        ability: Tag,
        montage: String,
        play_rate: f32,
    },
    /// Stop a montage started by a cancelled activation.
    StopMontage {
        agent: AgentId,
        ability: Tag,
        montage: String,
    },
}

/// Simulation services shared by every agent.
pub struct Env {
    config: EngineConfig,
    scheduler: Box<dyn Scheduler>,
    cues: CueBroadcaster,
    handles: HandleGenerator,
    deferred: VecDeque<Deferred>,
    host_requests: Vec<HostRequest>,
}

impl Env {
    pub fn new(config: EngineConfig, scheduler: Box<dyn Scheduler>) -> Self {
        Self {
            config,
            scheduler,
            cues: CueBroadcaster::new(),
            handles: HandleGenerator::default(),
            deferred: VecDeque::new(),
            host_requests: Vec::new(),
        }
    }

    pub fn now(&self) -> Tick {
        self.scheduler.now()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cues(&self) -> &CueBroadcaster {
        &self.cues
    }

    pub fn cues_mut(&mut self) -> &mut CueBroadcaster {
        &mut self.cues
    }

    pub fn scheduler(&self) -> &dyn Scheduler {
        self.scheduler.as_ref()
    }

    pub(crate) fn scheduler_mut(&mut self) -> &mut dyn Scheduler {
        self.scheduler.as_mut()
    }

    pub(crate) fn next_effect_id(&mut self) -> EffectId {
        self.handles.next_id()
    }

    /// Queues `binding` for dispatch, if the slot is bound.
    pub(crate) fn fire(&mut self, binding: Option<CallbackBinding>, handle: EffectHandle) {
        if let Some(binding) = binding {
            tracing::trace!(hook = %binding.hook, %handle, "callback queued");
            self.deferred.push_back(Deferred::Callback { binding, handle });
        }
    }

    pub(crate) fn defer_apply(&mut self, apply: FollowUpApply) {
        self.deferred.push_back(Deferred::Apply(apply));
    }

    pub(crate) fn pop_deferred(&mut self) -> Option<Deferred> {
        self.deferred.pop_front()
    }

    pub(crate) fn request(&mut self, request: HostRequest) {
        self.host_requests.push(request);
    }

    pub fn take_host_requests(&mut self) -> Vec<HostRequest> {
        std::mem::take(&mut self.host_requests)
    }
}

impl std::fmt::Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Env")
            .field("now", &self.now())
            .field("config", &self.config)
            .field("pending_timers", &self.scheduler.pending())
            .field("deferred", &self.deferred.len())
            .finish()
    }
}
