//! Presentation notifications.
//!
//! Cues are abstract: the engine reports *what happened to which effect* and
//! leaves sound, particles and UI to observers. The broadcaster holds no
//! per-effect state, so cues for handles that are no longer live are
//! delivered like any other.

use std::sync::{Arc, Mutex, PoisonError};

use crate::attributes::AttributeChange;
use crate::common::{AgentId, HitData, Tick};
use crate::effects::EffectHandle;
use crate::tags::Tag;

/// Lifecycle transition a cue reports.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum CueKind {
    Applied,
    Executed,
    Removed,
    Expired,
}

/// Which peers a cue is meant for when replicated.
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
pub enum Delivery {
    /// Only the owning agent's peer.
    Owner,
    /// Every peer.
    #[default]
    All,
    /// Every peer except the owner.
    AllButOwner,
}

/// Parameters attached to every cue.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CueParams {
    /// Name of the effect spec.
    pub effect: String,
    /// Optional presentation tag authored on the spec.
    pub cue_tag: Option<Tag>,
    pub instigator: Option<AgentId>,
    pub target: Option<AgentId>,
    pub hit: Option<HitData>,
    /// Attribute changes caused by this transition (executions and removals).
    pub modified: Vec<AttributeChange>,
    pub at: Tick,
}

/// A cue as delivered to observers.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CueEvent {
    pub kind: CueKind,
    pub handle: EffectHandle,
    pub delivery: Delivery,
    pub params: CueParams,
}

/// Read-only presentation hook.
pub trait CueObserver: Send + Sync {
    fn on_cue(&self, event: &CueEvent);

    /// Final value of an attribute changed.
    fn on_attribute_changed(&self, _agent: AgentId, _change: &AttributeChange) {}
}

/// Registration token returned by [`CueBroadcaster::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Fan-out of cues to every registered observer.
#[derive(Default)]
pub struct CueBroadcaster {
    observers: Vec<(ObserverId, Arc<dyn CueObserver>)>,
    next_id: u64,
}

impl CueBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Arc<dyn CueObserver>) -> ObserverId {
        self.next_id += 1;
        let id = ObserverId(self.next_id);
        self.observers.push((id, observer));
        id
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer, _)| *observer != id);
        before != self.observers.len()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn notify(&self, kind: CueKind, handle: EffectHandle, delivery: Delivery, params: CueParams) {
        tracing::debug!(%kind, effect = %params.effect, handle = %handle, %delivery, "cue");
        let event = CueEvent {
            kind,
            handle,
            delivery,
            params,
        };
        for (_, observer) in &self.observers {
            observer.on_cue(&event);
        }
    }

    pub fn notify_attribute(&self, agent: AgentId, change: &AttributeChange) {
        if change.is_noop() {
            return;
        }
        for (_, observer) in &self.observers {
            observer.on_attribute_changed(agent, change);
        }
    }
}

impl std::fmt::Debug for CueBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CueBroadcaster")
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Observer that records every cue it receives.
///
/// Used by the simulation CLI and by tests to assert on the cue stream.
#[derive(Debug, Default)]
pub struct CueRecorder {
    events: Mutex<Vec<CueEvent>>,
    changes: Mutex<Vec<(AgentId, AttributeChange)>>,
}

impl CueRecorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<CueEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn attribute_changes(&self) -> Vec<(AgentId, AttributeChange)> {
        self.changes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self, kind: CueKind) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|event| event.kind == kind)
            .count()
    }

    /// Number of cues of `kind` for the effect spec named `effect`.
    pub fn count_for(&self, kind: CueKind, effect: &str) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|event| event.kind == kind && event.params.effect == effect)
            .count()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.changes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl CueObserver for CueRecorder {
    fn on_cue(&self, event: &CueEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }

    fn on_attribute_changed(&self, agent: AgentId, change: &AttributeChange) {
        self.changes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((agent, change.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(effect: &str) -> CueParams {
        CueParams {
            effect: effect.to_string(),
            cue_tag: None,
            instigator: None,
            target: None,
            hit: None,
            modified: Vec::new(),
            at: Tick::ZERO,
        }
    }

    #[test]
    fn every_observer_receives_every_cue() {
        let mut broadcaster = CueBroadcaster::new();
        let first = CueRecorder::new();
        let second = CueRecorder::new();
        broadcaster.subscribe(first.clone());
        let id = broadcaster.subscribe(second.clone());

        broadcaster.notify(CueKind::Applied, EffectHandle::default(), Delivery::All, params("Burn"));
        assert!(broadcaster.unsubscribe(id));
        broadcaster.notify(CueKind::Removed, EffectHandle::default(), Delivery::Owner, params("Burn"));

        assert_eq!(first.events().len(), 2);
        assert_eq!(second.events().len(), 1);
        assert_eq!(first.count_for(CueKind::Removed, "Burn"), 1);
        assert!(!broadcaster.unsubscribe(id));
    }
}
