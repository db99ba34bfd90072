use crate::attributes::AttributeSnapshot;
use crate::common::{AgentId, CauserId, HitData};

/// Who applied an effect, to whom, and with what.
///
/// Agent references are generation-checked ids, so a context never keeps an
/// agent alive. The instigator's attributes are frozen at creation time for
/// attribute-based magnitudes.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectContext {
    source: Option<AgentId>,
    target: Option<AgentId>,
    instigator: Option<AgentId>,
    instigator_snapshot: AttributeSnapshot,
    causer: Option<CauserId>,
    hit: Option<HitData>,
}

impl EffectContext {
    /// Context created by `source`, which is also the instigator.
    pub fn new(source: AgentId, snapshot: AttributeSnapshot) -> Self {
        Self {
            source: Some(source),
            instigator: Some(source),
            instigator_snapshot: snapshot,
            ..Self::default()
        }
    }

    pub fn with_target(mut self, target: AgentId) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_causer(mut self, causer: CauserId) -> Self {
        self.causer = Some(causer);
        self
    }

    pub fn with_hit(mut self, hit: HitData) -> Self {
        self.hit = Some(hit);
        self
    }

    /// A context is usable once it names a target.
    pub fn is_valid(&self) -> bool {
        self.target.is_some()
    }

    /// Points the context at a new target.
    ///
    /// The only mutation a context allows. Used when an effect is applied to
    /// self or refreshed on an agent other than the one originally named.
    pub fn retarget(&mut self, target: AgentId) {
        self.target = Some(target);
    }

    pub fn source(&self) -> Option<AgentId> {
        self.source
    }

    pub fn target(&self) -> Option<AgentId> {
        self.target
    }

    pub fn instigator(&self) -> Option<AgentId> {
        self.instigator
    }

    pub fn instigator_snapshot(&self) -> &AttributeSnapshot {
        &self.instigator_snapshot
    }

    pub fn causer(&self) -> Option<CauserId> {
        self.causer
    }

    pub fn hit(&self) -> Option<HitData> {
        self.hit
    }
}
