use std::sync::Arc;

use super::{EffectContext, EffectHandle, EffectKind, EffectSpec, EffectTiming};
use crate::common::{AgentId, Tick};
use crate::env::CallbackBinding;
use crate::scheduler::TimerId;
use crate::tags::TagContainer;

/// Lifecycle callbacks bound to one application.
///
/// Each slot holds a closed binding to an ability hook; firing a slot queues
/// the binding on the world, which dispatches it once the current operation
/// finishes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EffectCallbacks {
    pub on_applied: Option<CallbackBinding>,
    pub on_period: Option<CallbackBinding>,
    pub on_expired: Option<CallbackBinding>,
    pub on_removed: Option<CallbackBinding>,
}

impl EffectCallbacks {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Fills every slot `other` binds, keeping the rest.
    pub fn merge(&mut self, other: EffectCallbacks) {
        self.on_applied = other.on_applied.or(self.on_applied);
        self.on_period = other.on_period.or(self.on_period);
        self.on_expired = other.on_expired.or(self.on_expired);
        self.on_removed = other.on_removed.or(self.on_removed);
    }
}

/// One live application of an [`EffectSpec`] on an agent.
#[derive(Clone, Debug)]
pub struct EffectInstance {
    pub(crate) spec: Arc<EffectSpec>,
    pub(crate) context: EffectContext,
    pub(crate) handle: EffectHandle,
    pub(crate) timing: EffectTiming,
    /// Owned tags, apply tags and any extra tags appended by the applier.
    pub(crate) tags: TagContainer,
    pub(crate) callbacks: EffectCallbacks,
    pub(crate) duration_timer: Option<TimerId>,
    pub(crate) period_timer: Option<TimerId>,
    pub(crate) applied_at: Tick,
    pub(crate) executions: u32,
}

impl EffectInstance {
    pub fn spec(&self) -> &Arc<EffectSpec> {
        &self.spec
    }

    pub fn context(&self) -> &EffectContext {
        &self.context
    }

    pub fn handle(&self) -> EffectHandle {
        self.handle
    }

    pub fn timing(&self) -> EffectTiming {
        self.timing
    }

    pub fn tags(&self) -> &TagContainer {
        &self.tags
    }

    pub fn callbacks(&self) -> &EffectCallbacks {
        &self.callbacks
    }

    pub fn applied_at(&self) -> Tick {
        self.applied_at
    }

    pub fn executions(&self) -> u32 {
        self.executions
    }

    /// Live modifiers are registered on the attribute set for as long as the
    /// instance lives.
    pub fn has_live_modifiers(&self) -> bool {
        !self.timing.executes()
    }

    pub fn timers(&self) -> impl Iterator<Item = TimerId> {
        self.duration_timer.into_iter().chain(self.period_timer)
    }
}

/// Replicable view of a live effect.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectSummary {
    pub handle: EffectHandle,
    pub name: String,
    pub kind: EffectKind,
    pub tags: TagContainer,
    pub instigator: Option<AgentId>,
    pub executions: u32,
    /// Ticks until natural expiry; `None` for effects that live until removed.
    pub remaining: Option<u64>,
}
