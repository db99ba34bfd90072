use std::sync::Arc;

use slotmap::SlotMap;

use super::{
    EffectCallbacks, EffectContext, EffectError, EffectHandle, EffectInstance, EffectKey,
    EffectSpec, EffectSummary, EffectTiming, MagnitudeContext, Stacking,
};
use crate::attributes::{AttributeChange, AttributeError, AttributeSet, Modifier};
use crate::common::AgentId;
use crate::cues::{CueKind, CueParams};
use crate::env::Env;
use crate::error::log_rejection;
use crate::scheduler::TimerTask;
use crate::tags::{TagContainer, TagCountContainer};

/// The parts of an agent an effect writes to.
#[derive(Debug)]
pub struct EffectTarget<'a> {
    pub attributes: &'a mut AttributeSet,
    pub tags: &'a mut TagCountContainer,
}

/// Everything needed to apply one effect.
#[derive(Clone, Debug)]
pub struct ApplyRequest {
    pub spec: Arc<EffectSpec>,
    pub context: EffectContext,
    /// A live handle refreshes that application instead of creating one.
    pub handle: Option<EffectHandle>,
    pub callbacks: EffectCallbacks,
    /// Tags appended to the instance on top of the spec's own.
    pub extra_tags: TagContainer,
}

impl ApplyRequest {
    pub fn new(spec: Arc<EffectSpec>, context: EffectContext) -> Self {
        Self {
            spec,
            context,
            handle: None,
            callbacks: EffectCallbacks::none(),
            extra_tags: TagContainer::new(),
        }
    }

    pub fn with_handle(mut self, handle: Option<EffectHandle>) -> Self {
        self.handle = handle;
        self
    }

    pub fn with_callbacks(mut self, callbacks: EffectCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn with_extra_tags(mut self, tags: TagContainer) -> Self {
        self.extra_tags = tags;
        self
    }
}

/// All live effects of one agent.
///
/// Admits applications according to the spec's stacking policy, owns the
/// instances and their timers, and reports every transition as a cue.
#[derive(Clone, Debug)]
pub struct EffectContainer {
    owner: AgentId,
    instances: SlotMap<EffectKey, EffectInstance>,
}

impl EffectContainer {
    pub fn new(owner: AgentId) -> Self {
        Self {
            owner,
            instances: SlotMap::with_key(),
        }
    }

    pub fn owner(&self) -> AgentId {
        self.owner
    }

    /// Number of live instances.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn is_active(&self, handle: EffectHandle) -> bool {
        self.key_of(handle).is_some()
    }

    pub fn get(&self, handle: EffectHandle) -> Option<&EffectInstance> {
        self.key_of(handle).and_then(|key| self.instances.get(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = &EffectInstance> {
        self.instances.values()
    }

    /// Live handles whose instance tags match any tag of `query`.
    pub fn handles_with_tags(&self, query: &TagContainer) -> Vec<EffectHandle> {
        self.instances
            .values()
            .filter(|instance| instance.tags.has_any(query))
            .map(|instance| instance.handle)
            .collect()
    }

    /// Ticks until `handle` expires naturally.
    pub fn remaining(&self, handle: EffectHandle, env: &Env) -> Option<u64> {
        let timer = self.get(handle)?.duration_timer?;
        let deadline = env.scheduler().deadline(timer)?;
        Some(deadline.since(env.now()))
    }

    pub fn summaries(&self, env: &Env) -> Vec<EffectSummary> {
        self.instances
            .values()
            .map(|instance| EffectSummary {
                handle: instance.handle,
                name: instance.spec.name.clone(),
                kind: instance.spec.kind,
                tags: instance.tags.clone(),
                instigator: instance.context.instigator(),
                executions: instance.executions,
                remaining: self.remaining(instance.handle, env),
            })
            .collect()
    }

    /// Applies an effect to this container's owner.
    ///
    /// Returns the handle of the application: a fresh handle for a new
    /// instance, the existing one on refresh. Instant applications return a
    /// handle that is already no longer live.
    pub fn apply(
        &mut self,
        request: ApplyRequest,
        target: &mut EffectTarget<'_>,
        env: &mut Env,
    ) -> Result<EffectHandle, EffectError> {
        let ApplyRequest {
            spec,
            mut context,
            handle,
            callbacks,
            extra_tags,
        } = request;

        spec.validate()?;
        if !context.is_valid() {
            return Err(EffectError::InvalidContext("context names no target"));
        }
        context.retarget(self.owner);
        for attribute in spec.attributes() {
            if !target.attributes.contains(attribute) {
                return Err(AttributeError::Unknown(attribute.clone()).into());
            }
        }

        let ctx = MagnitudeContext {
            context: &context,
            target: target.attributes,
        };
        let timing = spec.timing(&ctx, env.config())?;
        let modifiers = evaluate_modifiers(&spec, &ctx)?;

        if !timing.instant {
            let stacked = match handle.and_then(|handle| self.key_of(handle)) {
                Some(key) => Some(key),
                None if spec.stacking(env.config()) == Stacking::Refresh => {
                    self.find_stack(&spec, &context)
                }
                None => None,
            };
            if let Some(key) = stacked {
                let Some(live) = self.instances.get(key) else {
                    return Err(EffectError::InvalidContext("refreshed effect is gone"));
                };
                if live.spec.name != spec.name {
                    return Err(EffectError::SpecMismatch {
                        live: live.spec.name.clone(),
                        requested: spec.name.clone(),
                    });
                }
                let keep = live.handle;
                self.purge_tagged(&spec, Some(keep), target, env);
                return self.refresh(
                    key,
                    Refresh {
                        spec,
                        context,
                        callbacks,
                        extra_tags,
                        timing,
                        modifiers,
                    },
                    target,
                    env,
                );
            }
        }

        if spec.stacking(env.config()) == Stacking::Replace {
            if let Some(key) = self.find_stack(&spec, &context) {
                if let Some(previous) = self.instances.get(key).map(|i| i.handle) {
                    self.remove(previous, target, env);
                }
            }
        }
        self.purge_tagged(&spec, None, target, env);

        let limit = env.config().max_effects_per_agent;
        if !timing.instant && self.instances.len() >= limit {
            return Err(EffectError::CapacityExceeded { limit });
        }

        let mut tags = spec.owned_tags.union(&spec.apply_tags);
        tags.append(&extra_tags);
        let id = env.next_effect_id();
        let owner = self.owner;
        let now = env.now();
        let key = self.instances.insert_with_key(|key| EffectInstance {
            spec: Arc::clone(&spec),
            context,
            handle: EffectHandle::new(id, owner, key),
            timing,
            tags,
            callbacks,
            duration_timer: None,
            period_timer: None,
            applied_at: now,
            executions: 0,
        });
        let handle = EffectHandle::new(id, owner, key);
        tracing::debug!(effect = %spec.name, %handle, kind = %spec.kind, ?timing, "effect applied");

        self.announce(key, CueKind::Applied, Vec::new(), env);
        env.fire(callbacks.on_applied, handle);

        if timing.instant {
            self.execute(key, modifiers, false, target, env);
            self.instances.remove(key);
            tracing::debug!(effect = %spec.name, %handle, "instant effect retired");
            return Ok(handle);
        }

        if let Some(instance) = self.instances.get(key) {
            target.tags.add_all(&instance.tags);
        }
        if timing.executes() {
            self.schedule(key, env);
            if spec.execute_on_application {
                self.execute(key, modifiers, false, target, env);
            }
        } else {
            self.add_live_modifiers(handle, &modifiers, target, env);
            self.schedule(key, env);
        }
        Ok(handle)
    }

    /// Removes a live effect. Returns `false` (and does nothing) if the handle
    /// is not live here.
    pub fn remove(&mut self, handle: EffectHandle, target: &mut EffectTarget<'_>, env: &mut Env) -> bool {
        let Some(key) = self.key_of(handle) else {
            return false;
        };
        let Some((instance, changes)) = self.teardown(key, target, env) else {
            return false;
        };
        tracing::debug!(effect = %instance.spec.name, %handle, "effect removed");
        env.fire(instance.callbacks.on_removed, handle);
        self.announce_detached(&instance, CueKind::Removed, changes, env);
        true
    }

    /// Removes every live effect whose tags match `query`.
    pub fn remove_with_tags(
        &mut self,
        query: &TagContainer,
        target: &mut EffectTarget<'_>,
        env: &mut Env,
    ) -> usize {
        self.handles_with_tags(query)
            .into_iter()
            .filter(|handle| self.remove(*handle, target, env))
            .count()
    }

    /// Removes every live effect, e.g. when the owner is destroyed.
    pub fn remove_all(&mut self, target: &mut EffectTarget<'_>, env: &mut Env) -> usize {
        let handles: Vec<_> = self.instances.values().map(|i| i.handle).collect();
        handles
            .into_iter()
            .filter(|handle| self.remove(*handle, target, env))
            .count()
    }

    /// Clears every callback slot of a live effect.
    pub fn unbind_callbacks(&mut self, handle: EffectHandle) -> bool {
        match self.key_of(handle).and_then(|key| self.instances.get_mut(key)) {
            Some(instance) => {
                instance.callbacks = EffectCallbacks::none();
                true
            }
            None => false,
        }
    }

    /// Runs a fired timer. Timers of effects that are no longer live are ignored.
    pub fn on_timer(&mut self, task: TimerTask, target: &mut EffectTarget<'_>, env: &mut Env) {
        match task {
            TimerTask::Expire(handle) => self.expire(handle, target, env),
            TimerTask::Period(handle) => self.tick_period(handle, target, env),
        }
    }

    fn expire(&mut self, handle: EffectHandle, target: &mut EffectTarget<'_>, env: &mut Env) {
        let Some(key) = self.key_of(handle) else {
            tracing::trace!(%handle, "expiry for dead effect ignored");
            return;
        };
        if let Some(instance) = self.instances.get(key) {
            env.fire(instance.callbacks.on_expired, handle);
        }
        if let Some((instance, changes)) = self.teardown(key, target, env) {
            tracing::debug!(effect = %instance.spec.name, %handle, "effect expired");
            self.announce_detached(&instance, CueKind::Expired, changes, env);
        }
    }

    fn tick_period(&mut self, handle: EffectHandle, target: &mut EffectTarget<'_>, env: &mut Env) {
        let Some(key) = self.key_of(handle) else {
            tracing::trace!(%handle, "period for dead effect ignored");
            return;
        };
        let Some(instance) = self.instances.get(key) else {
            return;
        };
        let ctx = MagnitudeContext {
            context: &instance.context,
            target: target.attributes,
        };
        match evaluate_modifiers(&instance.spec, &ctx) {
            Ok(modifiers) => self.execute(key, modifiers, true, target, env),
            Err(err) => log_rejection("periodic execution", &err),
        }
    }

    /// One execution: permanent base changes, on-period when ticked, then
    /// the "executed" cue.
    fn execute(
        &mut self,
        key: EffectKey,
        modifiers: Vec<Modifier>,
        from_period: bool,
        target: &mut EffectTarget<'_>,
        env: &mut Env,
    ) {
        let changes: Vec<AttributeChange> = modifiers
            .iter()
            .filter_map(|modifier| match target.attributes.modify_base(modifier) {
                Ok(change) => Some(change),
                Err(err) => {
                    log_rejection("effect execution", &err);
                    None
                }
            })
            .collect();
        for change in &changes {
            env.cues().notify_attribute(self.owner, change);
        }
        let Some(instance) = self.instances.get_mut(key) else {
            return;
        };
        instance.executions += 1;
        if from_period {
            env.fire(instance.callbacks.on_period, instance.handle);
        }
        self.announce(key, CueKind::Executed, changes, env);
    }

    /// Removes the effects matched by `spec.remove_effects_with_tags`,
    /// sparing `keep`.
    fn purge_tagged(
        &mut self,
        spec: &EffectSpec,
        keep: Option<EffectHandle>,
        target: &mut EffectTarget<'_>,
        env: &mut Env,
    ) {
        if spec.remove_effects_with_tags.is_empty() {
            return;
        }
        for victim in self.handles_with_tags(&spec.remove_effects_with_tags) {
            if Some(victim) != keep {
                self.remove(victim, target, env);
            }
        }
    }

    fn refresh(
        &mut self,
        key: EffectKey,
        refresh: Refresh,
        target: &mut EffectTarget<'_>,
        env: &mut Env,
    ) -> Result<EffectHandle, EffectError> {
        let Some(instance) = self.instances.get_mut(key) else {
            return Err(EffectError::InvalidContext("refreshed effect is gone"));
        };
        let handle = instance.handle;
        for timer in instance.timers() {
            env.scheduler_mut().cancel(timer);
        }
        instance.duration_timer = None;
        instance.period_timer = None;

        target.tags.remove_all(&instance.tags);
        instance.tags.append(&refresh.spec.owned_tags.union(&refresh.spec.apply_tags));
        instance.tags.append(&refresh.extra_tags);
        target.tags.add_all(&instance.tags);

        instance.spec = refresh.spec;
        instance.context = refresh.context;
        instance.callbacks.merge(refresh.callbacks);
        instance.timing = refresh.timing;
        let callbacks = instance.callbacks;
        let live = instance.has_live_modifiers();
        tracing::debug!(effect = %instance.spec.name, %handle, "effect refreshed");

        self.schedule(key, env);
        self.announce(key, CueKind::Applied, Vec::new(), env);
        env.fire(callbacks.on_applied, handle);

        let removed = target.attributes.remove_modifiers(handle);
        for change in &removed {
            env.cues().notify_attribute(self.owner, change);
        }
        if live {
            self.add_live_modifiers(handle, &refresh.modifiers, target, env);
        }
        Ok(handle)
    }

    fn add_live_modifiers(
        &self,
        handle: EffectHandle,
        modifiers: &[Modifier],
        target: &mut EffectTarget<'_>,
        env: &mut Env,
    ) {
        for modifier in modifiers {
            let old = target.attributes.get(&modifier.attribute).unwrap_or_default();
            match target.attributes.modify(modifier, handle) {
                Ok(new) => env.cues().notify_attribute(
                    self.owner,
                    &AttributeChange {
                        attribute: modifier.attribute.clone(),
                        old,
                        new,
                    },
                ),
                Err(err) => log_rejection("live modifier", &err),
            }
        }
    }

    fn schedule(&mut self, key: EffectKey, env: &mut Env) {
        let Some(instance) = self.instances.get_mut(key) else {
            return;
        };
        let handle = instance.handle;
        if let Some(duration) = instance.timing.duration {
            instance.duration_timer =
                Some(env.scheduler_mut().schedule_once(duration, TimerTask::Expire(handle)));
        }
        if let Some(period) = instance.timing.period {
            instance.period_timer = Some(
                env.scheduler_mut()
                    .schedule_repeating(period, TimerTask::Period(handle)),
            );
        }
    }

    /// Detaches an instance: timers first, then tags and live modifiers.
    fn teardown(
        &mut self,
        key: EffectKey,
        target: &mut EffectTarget<'_>,
        env: &mut Env,
    ) -> Option<(EffectInstance, Vec<AttributeChange>)> {
        let instance = self.instances.remove(key)?;
        for timer in instance.timers() {
            env.scheduler_mut().cancel(timer);
        }
        target.tags.remove_all(&instance.tags);
        let changes = target.attributes.remove_modifiers(instance.handle);
        for change in &changes {
            env.cues().notify_attribute(self.owner, change);
        }
        Some((instance, changes))
    }

    fn announce(&self, key: EffectKey, kind: CueKind, modified: Vec<AttributeChange>, env: &Env) {
        if let Some(instance) = self.instances.get(key) {
            self.announce_detached(instance, kind, modified, env);
        }
    }

    fn announce_detached(
        &self,
        instance: &EffectInstance,
        kind: CueKind,
        modified: Vec<AttributeChange>,
        env: &Env,
    ) {
        let params = CueParams {
            effect: instance.spec.name.clone(),
            cue_tag: instance.spec.cue_tag.clone(),
            instigator: instance.context.instigator(),
            target: Some(self.owner),
            hit: instance.context.hit(),
            modified,
            at: env.now(),
        };
        env.cues()
            .notify(kind, instance.handle, instance.spec.delivery, params);
    }

    fn key_of(&self, handle: EffectHandle) -> Option<EffectKey> {
        if !handle.is_valid() || handle.agent != self.owner {
            return None;
        }
        self.instances
            .get(handle.key)
            .filter(|instance| instance.handle.id == handle.id)
            .map(|_| handle.key)
    }

    fn find_stack(&self, spec: &EffectSpec, context: &EffectContext) -> Option<EffectKey> {
        self.instances
            .iter()
            .find(|(_, instance)| {
                instance.spec.name == spec.name
                    && instance.context.instigator() == context.instigator()
            })
            .map(|(key, _)| key)
    }
}

/// Fresh application state folded into a live instance on refresh.
struct Refresh {
    spec: Arc<EffectSpec>,
    context: EffectContext,
    callbacks: EffectCallbacks,
    extra_tags: TagContainer,
    timing: EffectTiming,
    modifiers: Vec<Modifier>,
}

fn evaluate_modifiers(
    spec: &EffectSpec,
    ctx: &MagnitudeContext<'_>,
) -> Result<Vec<Modifier>, EffectError> {
    spec.modifiers
        .iter()
        .map(|modifier| modifier.evaluate(ctx))
        .collect()
}
