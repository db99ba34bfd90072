//! The simulation façade.
//!
//! [`World`] owns every agent's [`AbilitiesComponent`] in a generational arena
//! plus the shared [`Env`]. Every public operation runs to completion and then
//! drains the deferred queue: lifecycle callbacks are dispatched to the
//! abilities that bound them and follow-up effects are applied, in the order
//! they were produced.
//!
//! Public operations report failure through their return value (an invalid
//! handle, `false`, [`InputOutcome::Ignored`]) and log the typed error;
//! `try_*` variants return the error itself.

use std::sync::Arc;

use slotmap::SlotMap;

use crate::abilities::{AbilityDef, AbilityId, AbilitySet, AbilityState, ActivationError, InputOutcome};
use crate::attributes::{AttributeDef, AttributeError, AttributeId, AttributeSet};
use crate::common::{AgentId, CauserId, HitData, Tick};
use crate::component::{AbilitiesComponent, ComponentSnapshot};
use crate::config::{ConfigError, EngineConfig};
use crate::cues::{CueKind, CueObserver, CueParams, ObserverId};
use crate::effects::{ApplyRequest, EffectContext, EffectError, EffectHandle, EffectSpec};
use crate::env::{CallbackBinding, Deferred, Env, FollowUpApply, HostRequest};
use crate::error::log_rejection;
use crate::scheduler::{Scheduler, TimerQueue};
use crate::tags::{Tag, TagContainer};

/// Initial state of a spawned agent.
#[derive(Clone, Debug, Default)]
pub struct AgentSetup {
    pub attributes: Vec<AttributeDef>,
    pub abilities: Vec<(Arc<AbilityDef>, Option<Tag>)>,
    pub tags: TagContainer,
}

impl AgentSetup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, id: impl Into<AttributeId>, base: f32) -> Self {
        self.attributes.push(AttributeDef::new(id, base));
        self
    }

    pub fn with_attribute_def(mut self, def: AttributeDef) -> Self {
        self.attributes.push(def);
        self
    }

    pub fn with_ability(mut self, def: Arc<AbilityDef>, input: Option<Tag>) -> Self {
        self.abilities.push((def, input));
        self
    }

    pub fn with_set(mut self, set: &AbilitySet) -> Self {
        self.abilities.extend(
            set.entries
                .iter()
                .map(|entry| (Arc::clone(&entry.ability), entry.input.clone())),
        );
        self
    }

    pub fn with_tag(mut self, tag: impl Into<Tag>) -> Self {
        self.tags.insert(tag.into());
        self
    }
}

/// Every agent plus the shared clock, timers, cues and handle generator.
#[derive(Debug)]
pub struct World {
    agents: SlotMap<AgentId, AbilitiesComponent>,
    env: Env,
}

impl Default for World {
    fn default() -> Self {
        Self::with_scheduler(EngineConfig::default(), Box::new(TimerQueue::new()))
    }
}

impl World {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_scheduler(config, Box::new(TimerQueue::new())))
    }

    /// Builds a world on a host-supplied scheduler. The config is trusted.
    pub fn with_scheduler(config: EngineConfig, scheduler: Box<dyn Scheduler>) -> Self {
        Self {
            agents: SlotMap::with_key(),
            env: Env::new(config, scheduler),
        }
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn config(&self) -> &EngineConfig {
        self.env.config()
    }

    pub fn now(&self) -> Tick {
        self.env.now()
    }

    pub fn subscribe(&mut self, observer: Arc<dyn CueObserver>) -> ObserverId {
        self.env.cues_mut().subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.env.cues_mut().unsubscribe(id)
    }

    pub fn take_host_requests(&mut self) -> Vec<HostRequest> {
        self.env.take_host_requests()
    }

    // ===== agents =====

    /// Spawns an agent, or logs the rejection and returns an invalid id when
    /// one of its attribute definitions is malformed.
    pub fn spawn(&mut self, setup: AgentSetup) -> AgentId {
        self.try_spawn(setup).unwrap_or_else(|err| {
            log_rejection("spawn", &err);
            AgentId::default()
        })
    }

    pub fn try_spawn(&mut self, setup: AgentSetup) -> Result<AgentId, AttributeError> {
        for def in &setup.attributes {
            def.validate()?;
        }
        let order = self.env.config().modifier_order;
        let attributes = AttributeSet::from_defs(&setup.attributes, order);
        let agent = self.agents.insert_with_key(|agent| {
            let mut component = AbilitiesComponent::new(agent, attributes);
            for tag in setup.tags.iter() {
                component.add_loose_tag(tag);
            }
            for (def, input) in setup.abilities {
                component.grant(def, input);
            }
            component
        });
        tracing::debug!(?agent, "agent spawned");
        Ok(agent)
    }

    /// Removes every effect of the agent (with their cues and callbacks), then
    /// the agent itself. Handles and ids that referred to it stop resolving.
    pub fn despawn(&mut self, agent: AgentId) -> bool {
        let Some(component) = self.agents.get_mut(agent) else {
            return false;
        };
        let removed = component.remove_all_effects(&mut self.env);
        self.flush();
        self.agents.remove(agent);
        tracing::debug!(?agent, removed, "agent despawned");
        true
    }

    pub fn contains(&self, agent: AgentId) -> bool {
        self.agents.contains_key(agent)
    }

    pub fn agent(&self, agent: AgentId) -> Option<&AbilitiesComponent> {
        self.agents.get(agent)
    }

    pub fn agents(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.agents.keys()
    }

    pub fn attribute(&self, agent: AgentId, attribute: &str) -> Option<f32> {
        self.agents
            .get(agent)?
            .attributes()
            .get(&AttributeId::new(attribute))
    }

    pub fn has_tag(&self, agent: AgentId, tag: &Tag) -> bool {
        self.agents
            .get(agent)
            .is_some_and(|component| component.tags().has_tag(tag))
    }

    pub fn snapshot(&self, agent: AgentId) -> Option<ComponentSnapshot> {
        Some(self.agents.get(agent)?.snapshot(&self.env))
    }

    // ===== effects =====

    /// Context instigated by `source`. Unknown sources yield an empty context.
    pub fn make_context(
        &self,
        source: AgentId,
        target: Option<AgentId>,
        causer: Option<CauserId>,
        hit: Option<HitData>,
    ) -> EffectContext {
        match self.agents.get(source) {
            Some(component) => component.make_context(target, causer, hit),
            None => EffectContext::default(),
        }
    }

    pub fn apply_effect_to_self(
        &mut self,
        agent: AgentId,
        spec: Arc<EffectSpec>,
        handle: Option<EffectHandle>,
    ) -> EffectHandle {
        let context = self.make_context(agent, Some(agent), None, None);
        self.apply_effect_to_target(spec, context, handle)
    }

    /// Applies `spec` to the context's target.
    ///
    /// Rejections return the handle that was passed in (or the invalid handle).
    pub fn apply_effect_to_target(
        &mut self,
        spec: Arc<EffectSpec>,
        context: EffectContext,
        handle: Option<EffectHandle>,
    ) -> EffectHandle {
        match self.try_apply_effect_to_target(spec, context, handle) {
            Ok(applied) => applied,
            Err(err) => {
                log_rejection("apply effect", &err);
                handle.unwrap_or_default()
            }
        }
    }

    pub fn try_apply_effect_to_target(
        &mut self,
        spec: Arc<EffectSpec>,
        context: EffectContext,
        handle: Option<EffectHandle>,
    ) -> Result<EffectHandle, EffectError> {
        let result = self.apply_inner(spec, context, handle);
        self.flush();
        result
    }

    fn apply_inner(
        &mut self,
        spec: Arc<EffectSpec>,
        context: EffectContext,
        handle: Option<EffectHandle>,
    ) -> Result<EffectHandle, EffectError> {
        spec.validate()?;
        let target = context.target().and_then(|target| self.agents.get_mut(target));
        let Some(component) = target else {
            self.announce_phantom(&spec, &context, handle);
            return Err(EffectError::InvalidContext("target is not a live agent"));
        };
        let request = ApplyRequest::new(spec, context).with_handle(handle);
        component.apply_effect(request, &mut self.env)
    }

    /// The "applied" cue for an application whose target cannot be resolved
    /// is still reported, on the source side.
    fn announce_phantom(&self, spec: &EffectSpec, context: &EffectContext, handle: Option<EffectHandle>) {
        let params = CueParams {
            effect: spec.name.clone(),
            cue_tag: spec.cue_tag.clone(),
            instigator: context.instigator(),
            target: None,
            hit: context.hit(),
            modified: Vec::new(),
            at: self.env.now(),
        };
        self.env.cues().notify(
            CueKind::Applied,
            handle.unwrap_or_default(),
            spec.delivery,
            params,
        );
    }

    pub fn remove_effect(&mut self, handle: EffectHandle) -> bool {
        let removed = self
            .agents
            .get_mut(handle.agent)
            .is_some_and(|component| component.remove_effect(handle, &mut self.env));
        self.flush();
        removed
    }

    pub fn remove_effects_with_tags(&mut self, agent: AgentId, query: &TagContainer) -> usize {
        let removed = self
            .agents
            .get_mut(agent)
            .map_or(0, |component| component.remove_effects_with_tags(query, &mut self.env));
        self.flush();
        removed
    }

    pub fn is_effect_active(&self, handle: EffectHandle) -> bool {
        self.agents
            .get(handle.agent)
            .is_some_and(|component| component.is_effect_active(handle))
    }

    pub fn effect_remaining(&self, handle: EffectHandle) -> Option<u64> {
        self.agents
            .get(handle.agent)?
            .effects()
            .remaining(handle, &self.env)
    }

    // ===== abilities =====

    pub fn grant_ability(
        &mut self,
        agent: AgentId,
        def: Arc<AbilityDef>,
        input: Option<Tag>,
    ) -> Option<AbilityId> {
        Some(self.agents.get_mut(agent)?.grant(def, input))
    }

    pub fn grant_set(&mut self, agent: AgentId, set: &AbilitySet) -> Vec<AbilityId> {
        self.agents
            .get_mut(agent)
            .map(|component| component.grant_set(set))
            .unwrap_or_default()
    }

    pub fn revoke_ability(&mut self, agent: AgentId, ability: AbilityId) -> bool {
        let revoked = self
            .agents
            .get_mut(agent)
            .is_some_and(|component| component.revoke(ability, &mut self.env));
        self.flush();
        revoked
    }

    pub fn ability_by_tag(&self, agent: AgentId, tag: &Tag) -> Option<AbilityId> {
        self.agents.get(agent)?.abilities().by_tag(tag)
    }

    pub fn ability_state(&self, agent: AgentId, ability: AbilityId) -> Option<AbilityState> {
        self.agents.get(agent)?.ability_state(ability)
    }

    pub fn executing(&self, agent: AgentId) -> Option<AbilityId> {
        self.agents.get(agent)?.abilities().executing()
    }

    pub fn is_on_cooldown(&self, agent: AgentId, ability: AbilityId) -> bool {
        self.agents
            .get(agent)
            .is_some_and(|component| component.is_on_cooldown(ability))
    }

    pub fn activate_ability(&mut self, agent: AgentId, ability: AbilityId) -> bool {
        self.report("activate ability", agent, |component, env| {
            component.try_activate(ability, env)
        })
        .is_some()
    }

    pub fn try_activate_ability(
        &mut self,
        agent: AgentId,
        ability: AbilityId,
    ) -> Result<InputOutcome, ActivationError> {
        self.with_component(agent, |component, env| component.try_activate(ability, env))
    }

    pub fn input_pressed(&mut self, agent: AgentId, input: &Tag) -> InputOutcome {
        self.report("input pressed", agent, |component, env| {
            component.input_pressed(input, env)
        })
        .unwrap_or(InputOutcome::Ignored)
    }

    pub fn input_released(&mut self, agent: AgentId, input: &Tag) -> InputOutcome {
        self.report("input released", agent, |component, env| {
            component.input_released(input, env)
        })
        .unwrap_or(InputOutcome::Ignored)
    }

    pub fn confirm(&mut self, agent: AgentId, ability: AbilityId, hit: Option<HitData>) -> bool {
        self.report("confirm ability", agent, |component, env| {
            component.confirm(ability, hit, env)
        })
        .is_some()
    }

    pub fn cancel_ability(&mut self, agent: AgentId, ability: AbilityId) -> bool {
        self.report("cancel ability", agent, |component, env| {
            component.cancel_ability(ability, env)
        })
        .is_some()
    }

    pub fn finish_ability(&mut self, agent: AgentId, ability: AbilityId) -> bool {
        self.report("finish ability", agent, |component, env| {
            component.finish_ability(ability, env)
        })
        .is_some()
    }

    fn with_component<T>(
        &mut self,
        agent: AgentId,
        op: impl FnOnce(&mut AbilitiesComponent, &mut Env) -> Result<T, ActivationError>,
    ) -> Result<T, ActivationError> {
        let result = match self.agents.get_mut(agent) {
            Some(component) => op(component, &mut self.env),
            None => Err(ActivationError::UnknownAgent),
        };
        self.flush();
        result
    }

    fn report<T>(
        &mut self,
        operation: &'static str,
        agent: AgentId,
        op: impl FnOnce(&mut AbilitiesComponent, &mut Env) -> Result<T, ActivationError>,
    ) -> Option<T> {
        self.with_component(agent, op)
            .map_err(|err| log_rejection(operation, &err))
            .ok()
    }

    // ===== time =====

    /// Fires every timer due up to and including `until`, in deadline order,
    /// draining deferred work after each one.
    pub fn advance_to(&mut self, until: Tick) {
        while let Some((_, task)) = self.env.scheduler_mut().pop_due(until) {
            let agent = task.handle().agent;
            match self.agents.get_mut(agent) {
                Some(component) => component.on_timer(task, &mut self.env),
                None => tracing::trace!(?task, "timer for despawned agent ignored"),
            }
            self.flush();
        }
        self.env.scheduler_mut().advance_to(until);
    }

    pub fn advance_by(&mut self, ticks: u64) {
        let until = self.now() + ticks;
        self.advance_to(until);
    }

    /// Advances by authored seconds.
    pub fn advance_seconds(&mut self, seconds: f32) {
        let ticks = self.env.config().ticks_for_seconds(seconds);
        self.advance_by(ticks);
    }

    /// Dispatches queued callbacks and follow-up applications until the queue
    /// is empty or the chain limit is hit.
    fn flush(&mut self) {
        let limit = self.env.config().max_callback_chain;
        let mut dispatched = 0usize;
        while let Some(item) = self.env.pop_deferred() {
            dispatched += 1;
            if dispatched > limit {
                let dropped = self.settle_overflow(item);
                tracing::warn!(limit, dropped, "callback chain limit reached; follow-up work dropped");
                break;
            }
            match item {
                Deferred::Callback { binding, handle } => self.dispatch(binding, handle),
                Deferred::Apply(FollowUpApply {
                    source,
                    target,
                    spec,
                    hit,
                }) => {
                    let context = self.make_context(source, Some(target), None, hit);
                    if let Err(err) = self.apply_inner(spec, context, None) {
                        log_rejection("follow-up effect", &err);
                    }
                }
            }
        }
    }

    /// Drains the queue past the chain limit. Hooks that settle ability state
    /// still run so no activation keeps the executing slot; follow-up
    /// applications and period hooks are dropped, including any queued while
    /// settling. Returns the number of dropped items.
    fn settle_overflow(&mut self, first: Deferred) -> usize {
        let mut dropped = 0;
        let mut next = Some(first);
        while let Some(item) = next.take().or_else(|| self.env.pop_deferred()) {
            match item {
                Deferred::Callback { binding, handle } if binding.hook.settles_state() => {
                    self.dispatch(binding, handle)
                }
                _ => dropped += 1,
            }
        }
        dropped
    }

    fn dispatch(&mut self, binding: CallbackBinding, handle: EffectHandle) {
        match self.agents.get_mut(binding.owner) {
            Some(component) => component.dispatch(binding.ability, binding.hook, handle, &mut self.env),
            None => tracing::trace!(hook = %binding.hook, "callback for despawned agent ignored"),
        }
    }
}
