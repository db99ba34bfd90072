//! Per-agent façade: attributes, applied tags, effects and abilities.
//!
//! The component runs the ability activation state machine on top of its own
//! effect container. Transitions that depend on effect lifecycle events
//! (activation applied, ticked, expired or removed; cooldown expired) arrive
//! as queued [`CallbackBinding`]s that the world dispatches back through
//! [`AbilitiesComponent::dispatch`].

use std::sync::Arc;

use crate::abilities::{
    AbilityContainer, AbilityCounters, AbilityDef, AbilityId, AbilitySet, AbilityState,
    AbilityTask, ActivationError, ConfirmPolicy, FollowUpEffect, FollowUpTarget, InputBehavior,
    InputOutcome,
};
use crate::attributes::{AttributeSet, AttributeSnapshot};
use crate::common::{AgentId, CauserId, HitData};
use crate::effects::{
    ApplyRequest, EffectCallbacks, EffectContainer, EffectContext, EffectError, EffectHandle,
    EffectSummary, EffectTarget,
};
use crate::env::{AbilityHook, CallbackBinding, Env, FollowUpApply, HostRequest};
use crate::scheduler::TimerTask;
use crate::tags::{Tag, TagContainer, TagCountContainer};

/// Everything the engine tracks for one agent.
#[derive(Clone, Debug)]
pub struct AbilitiesComponent {
    owner: AgentId,
    attributes: AttributeSet,
    tags: TagCountContainer,
    effects: EffectContainer,
    abilities: AbilityContainer,
}

impl AbilitiesComponent {
    pub fn new(owner: AgentId, attributes: AttributeSet) -> Self {
        Self {
            owner,
            attributes,
            tags: TagCountContainer::new(),
            effects: EffectContainer::new(owner),
            abilities: AbilityContainer::new(owner),
        }
    }

    pub fn owner(&self) -> AgentId {
        self.owner
    }

    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    pub fn tags(&self) -> &TagCountContainer {
        &self.tags
    }

    pub fn effects(&self) -> &EffectContainer {
        &self.effects
    }

    pub fn abilities(&self) -> &AbilityContainer {
        &self.abilities
    }

    /// Grants a tag that no effect owns (team, archetype).
    pub fn add_loose_tag(&mut self, tag: &Tag) {
        self.tags.add(tag);
    }

    fn split(&mut self) -> (&mut EffectContainer, EffectTarget<'_>) {
        (
            &mut self.effects,
            EffectTarget {
                attributes: &mut self.attributes,
                tags: &mut self.tags,
            },
        )
    }

    // ===== effects =====

    /// Context instigated by this agent, with its attributes frozen now.
    pub fn make_context(
        &self,
        target: Option<AgentId>,
        causer: Option<CauserId>,
        hit: Option<HitData>,
    ) -> EffectContext {
        let mut context = EffectContext::new(self.owner, self.attributes.snapshot());
        if let Some(target) = target {
            context = context.with_target(target);
        }
        if let Some(causer) = causer {
            context = context.with_causer(causer);
        }
        if let Some(hit) = hit {
            context = context.with_hit(hit);
        }
        context
    }

    pub fn apply_effect(
        &mut self,
        request: ApplyRequest,
        env: &mut Env,
    ) -> Result<EffectHandle, EffectError> {
        let (effects, mut target) = self.split();
        effects.apply(request, &mut target, env)
    }

    pub fn remove_effect(&mut self, handle: EffectHandle, env: &mut Env) -> bool {
        let (effects, mut target) = self.split();
        effects.remove(handle, &mut target, env)
    }

    pub fn remove_effects_with_tags(&mut self, query: &TagContainer, env: &mut Env) -> usize {
        let (effects, mut target) = self.split();
        effects.remove_with_tags(query, &mut target, env)
    }

    pub fn remove_all_effects(&mut self, env: &mut Env) -> usize {
        let (effects, mut target) = self.split();
        effects.remove_all(&mut target, env)
    }

    pub fn is_effect_active(&self, handle: EffectHandle) -> bool {
        self.effects.is_active(handle)
    }

    pub(crate) fn on_timer(&mut self, task: TimerTask, env: &mut Env) {
        let (effects, mut target) = self.split();
        effects.on_timer(task, &mut target, env);
    }

    // ===== abilities =====

    pub fn grant(&mut self, def: Arc<AbilityDef>, input: Option<Tag>) -> AbilityId {
        self.abilities.grant(def, input)
    }

    pub fn grant_set(&mut self, set: &AbilitySet) -> Vec<AbilityId> {
        set.entries
            .iter()
            .map(|entry| self.grant(Arc::clone(&entry.ability), entry.input.clone()))
            .collect()
    }

    /// Removes an ability, stopping its activation and cooldown first.
    pub fn revoke(&mut self, id: AbilityId, env: &mut Env) -> bool {
        let Some(instance) = self.abilities.get(id) else {
            return false;
        };
        let activation = instance.activation_handle();
        let cooldown = instance.cooldown_handle();
        let running = instance.state().is_running();

        self.drop_bound_effect(activation, env);
        if running {
            self.end_activation(id, AbilityState::Cancelled, env);
        }
        self.drop_bound_effect(cooldown, env);
        self.abilities.remove(id).is_some()
    }

    pub fn is_on_cooldown(&self, id: AbilityId) -> bool {
        self.abilities
            .get(id)
            .and_then(|instance| instance.cooldown_handle())
            .is_some_and(|handle| self.effects.is_active(handle))
    }

    pub fn cooldown_remaining(&self, id: AbilityId, env: &Env) -> Option<u64> {
        let handle = self.abilities.get(id)?.cooldown_handle()?;
        self.effects.remaining(handle, env)
    }

    pub fn ability_state(&self, id: AbilityId) -> Option<AbilityState> {
        self.abilities.get(id).map(|instance| instance.state())
    }

    /// Activation guard: nothing executing, not on cooldown, activation effect
    /// not live, and none of the blocking tags applied.
    pub fn can_activate(&self, id: AbilityId) -> Result<(), ActivationError> {
        let instance = self.abilities.get(id).ok_or(ActivationError::UnknownAbility)?;
        if !instance.state().is_resting() {
            return Err(ActivationError::AlreadyActivating);
        }
        if let Some(holder) = self.abilities.executing() {
            let executing = self
                .abilities
                .get(holder)
                .map(|other| other.tag().clone())
                .unwrap_or_else(|| Tag::new("unknown"));
            return Err(ActivationError::Reentrant { executing });
        }
        if self.is_on_cooldown(id) {
            return Err(ActivationError::OnCooldown);
        }
        if instance
            .activation_handle()
            .is_some_and(|handle| self.effects.is_active(handle))
        {
            return Err(ActivationError::AlreadyActivating);
        }
        if let Some(blocker) = instance
            .def()
            .blocked_by
            .iter()
            .find(|tag| self.tags.has_tag(tag))
        {
            return Err(ActivationError::Blocked(blocker.clone()));
        }
        Ok(())
    }

    /// The executing ability can always be released; others not while on
    /// cooldown.
    pub fn can_release(&self, id: AbilityId) -> bool {
        self.abilities.executing() == Some(id) || !self.is_on_cooldown(id)
    }

    /// Starts an activation: claims the executing slot, grants activation
    /// tags, requests the montage and either commits or waits for confirmation.
    pub fn try_activate(&mut self, id: AbilityId, env: &mut Env) -> Result<InputOutcome, ActivationError> {
        self.can_activate(id)?;
        self.abilities.claim(id)?;
        let instance = self
            .abilities
            .get_mut(id)
            .ok_or(ActivationError::UnknownAbility)?;
        instance.state = AbilityState::Activating;
        instance.counters.activation_started += 1;
        instance.confirmed = None;
        instance.tasks.clear();
        let def = Arc::clone(&instance.def);
        if def.confirm == ConfirmPolicy::WaitForConfirm {
            instance.state = AbilityState::WaitingForConfirm;
            instance.tasks.push(AbilityTask::WaitForConfirm);
        }

        self.tags.add_all(&def.activation_tags);
        if let Some(montage) = &def.montage {
            env.request(HostRequest::PlayMontage {
                agent: self.owner,
                ability: def.tag.clone(),
                montage: montage.name.clone(),
                play_rate: montage.play_rate(def.activation_seconds()),
            });
        }
        tracing::debug!(ability = %def.tag, confirm = %def.confirm, "ability activating");

        if def.confirm == ConfirmPolicy::Instant {
            self.commit(id, env)?;
        }
        Ok(InputOutcome::Activated)
    }

    /// Consumes the one-shot confirm listener and commits the activation.
    pub fn confirm(
        &mut self,
        id: AbilityId,
        hit: Option<HitData>,
        env: &mut Env,
    ) -> Result<InputOutcome, ActivationError> {
        let instance = self
            .abilities
            .get_mut(id)
            .ok_or(ActivationError::UnknownAbility)?;
        if instance.state() != AbilityState::WaitingForConfirm || !instance.take_confirm() {
            return Err(ActivationError::NotWaitingForConfirm);
        }
        instance.confirmed = hit;
        instance.state = AbilityState::Activating;
        tracing::debug!(ability = %instance.tag(), "ability confirmed");
        self.commit(id, env)?;
        Ok(InputOutcome::Confirmed)
    }

    pub fn input_pressed(&mut self, input: &Tag, env: &mut Env) -> Result<InputOutcome, ActivationError> {
        let Some(id) = self.abilities.by_input(input) else {
            return Ok(InputOutcome::Ignored);
        };
        let instance = self.abilities.get(id).ok_or(ActivationError::UnknownAbility)?;
        if instance.is_waiting_for_confirm() {
            return self.confirm(id, None, env);
        }
        let behavior = instance.def().input;
        match behavior {
            InputBehavior::OnPress | InputBehavior::Channel => self.try_activate(id, env),
            InputBehavior::OnRelease => Ok(InputOutcome::Ignored),
        }
    }

    pub fn input_released(&mut self, input: &Tag, env: &mut Env) -> Result<InputOutcome, ActivationError> {
        let Some(id) = self.abilities.by_input(input) else {
            return Ok(InputOutcome::Ignored);
        };
        let instance = self.abilities.get(id).ok_or(ActivationError::UnknownAbility)?;
        let behavior = instance.def().input;
        let state = instance.state();
        match behavior {
            InputBehavior::OnPress => Ok(InputOutcome::Ignored),
            InputBehavior::OnRelease if self.can_release(id) => self.try_activate(id, env),
            InputBehavior::OnRelease => Ok(InputOutcome::Ignored),
            InputBehavior::Channel => match state {
                AbilityState::Active => {
                    self.finish_ability(id, env)?;
                    Ok(InputOutcome::Finished)
                }
                AbilityState::Activating | AbilityState::WaitingForConfirm => {
                    self.cancel_ability(id, env)?;
                    Ok(InputOutcome::Cancelled)
                }
                _ => Ok(InputOutcome::Ignored),
            },
        }
    }

    /// Cancels a running activation; the activation effect is removed without
    /// running its callbacks.
    pub fn cancel_ability(&mut self, id: AbilityId, env: &mut Env) -> Result<(), ActivationError> {
        let instance = self.abilities.get(id).ok_or(ActivationError::UnknownAbility)?;
        if !instance.state().is_running() {
            return Err(ActivationError::NotExecuting);
        }
        let activation = instance.activation_handle();
        self.drop_bound_effect(activation, env);
        self.end_activation(id, AbilityState::Cancelled, env);
        Ok(())
    }

    /// Finishes an Active activation early: unbinds the activation effect's
    /// callbacks, removes it, then runs the finish path.
    pub fn finish_ability(&mut self, id: AbilityId, env: &mut Env) -> Result<(), ActivationError> {
        let instance = self.abilities.get(id).ok_or(ActivationError::UnknownAbility)?;
        if instance.state() != AbilityState::Active {
            return Err(ActivationError::NotExecuting);
        }
        let activation = instance.activation_handle();
        self.drop_bound_effect(activation, env);
        self.end_activation(id, AbilityState::Finished, env);
        Ok(())
    }

    /// Routes an effect lifecycle callback to the ability that bound it.
    ///
    /// Bindings whose handle no longer matches the ability's current
    /// activation or cooldown are stale and ignored.
    pub(crate) fn dispatch(
        &mut self,
        ability: AbilityId,
        hook: AbilityHook,
        handle: EffectHandle,
        env: &mut Env,
    ) {
        let Some(instance) = self.abilities.get_mut(ability) else {
            tracing::trace!(%hook, %handle, "callback for revoked ability ignored");
            return;
        };
        let is_activation = instance.activation_handle() == Some(handle);
        match hook {
            AbilityHook::ActivationApplied if is_activation => {
                if instance.state() == AbilityState::Activating {
                    instance.state = AbilityState::Active;
                    tracing::debug!(ability = %instance.tag(), "ability active");
                }
            }
            AbilityHook::ActivationPeriod if is_activation => {
                instance.counters.period += 1;
                let def = Arc::clone(&instance.def);
                let hit = instance.confirmed;
                self.queue_follow_ups(&def.on_period, hit, env);
            }
            AbilityHook::ActivationFinished if is_activation => {
                self.end_activation(ability, AbilityState::Finished, env);
            }
            AbilityHook::ActivationCancelled if is_activation => {
                self.end_activation(ability, AbilityState::Cancelled, env);
            }
            AbilityHook::CooldownExpired if instance.cooldown_handle() == Some(handle) => {
                instance.cooldown = None;
                instance.counters.cooldown_expired += 1;
                tracing::debug!(ability = %instance.tag(), "cooldown expired");
            }
            _ => tracing::trace!(%hook, %handle, "stale callback ignored"),
        }
    }

    pub fn snapshot(&self, env: &Env) -> ComponentSnapshot {
        ComponentSnapshot {
            agent: self.owner,
            attributes: self.attributes.snapshot(),
            tags: self.tags.to_container(),
            effects: self.effects.summaries(env),
            abilities: self
                .abilities
                .iter()
                .map(|instance| AbilitySummary {
                    tag: instance.tag().clone(),
                    input: instance.input().cloned(),
                    state: instance.state(),
                    counters: instance.counters(),
                    cooldown_remaining: self.cooldown_remaining(instance.id(), env),
                })
                .collect(),
        }
    }

    /// Applies cost, cooldown and activation effects. A failure cancels the
    /// activation before the error is returned.
    fn commit(&mut self, id: AbilityId, env: &mut Env) -> Result<(), ActivationError> {
        match self.commit_effects(id, env) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.end_activation(id, AbilityState::Cancelled, env);
                Err(err)
            }
        }
    }

    fn commit_effects(&mut self, id: AbilityId, env: &mut Env) -> Result<(), ActivationError> {
        let instance = self.abilities.get(id).ok_or(ActivationError::UnknownAbility)?;
        let def = Arc::clone(instance.def());
        let context = self.make_context(Some(self.owner), None, instance.confirmed_hit());
        let owner = self.owner;
        let bind = move |hook| Some(CallbackBinding::new(owner, id, hook));

        if let Some(cost) = &def.cost_effect {
            self.apply_effect(ApplyRequest::new(Arc::clone(cost), context.clone()), env)?;
        }

        if let Some(cooldown) = &def.cooldown_effect {
            let callbacks = EffectCallbacks {
                on_expired: bind(AbilityHook::CooldownExpired),
                ..EffectCallbacks::none()
            };
            let request =
                ApplyRequest::new(Arc::clone(cooldown), context.clone()).with_callbacks(callbacks);
            let handle = self.apply_effect(request, env)?;
            if self.effects.is_active(handle) {
                if let Some(instance) = self.abilities.get_mut(id) {
                    instance.cooldown = Some(handle);
                    instance.counters.cooldown_started += 1;
                }
            }
        }

        let Some(activation) = &def.activation_effect else {
            self.end_activation(id, AbilityState::Finished, env);
            return Ok(());
        };
        let callbacks = EffectCallbacks {
            on_applied: bind(AbilityHook::ActivationApplied),
            on_period: bind(AbilityHook::ActivationPeriod),
            on_expired: bind(AbilityHook::ActivationFinished),
            on_removed: bind(AbilityHook::ActivationCancelled),
        };
        let request = ApplyRequest::new(Arc::clone(activation), context)
            .with_callbacks(callbacks)
            .with_extra_tags(def.owned_tags.clone());
        let handle = self.apply_effect(request, env)?;
        if self.effects.is_active(handle) {
            if let Some(instance) = self.abilities.get_mut(id) {
                instance.activation = Some(handle);
            }
        } else {
            // zero-duration activation: finish without ever being Active
            self.end_activation(id, AbilityState::Finished, env);
        }
        Ok(())
    }

    /// Leaves a running activation for `state` (Finished or Cancelled).
    /// No-op if the ability is not running.
    fn end_activation(&mut self, id: AbilityId, state: AbilityState, env: &mut Env) {
        let Some(instance) = self.abilities.get_mut(id) else {
            return;
        };
        if !instance.state().is_running() {
            return;
        }
        let def = Arc::clone(&instance.def);
        let hit = instance.confirmed;
        instance.settle(state);
        match state {
            AbilityState::Finished => instance.counters.finished += 1,
            AbilityState::Cancelled => instance.counters.cancelled += 1,
            _ => {}
        }
        self.tags.remove_all(&def.activation_tags);
        self.abilities.release(id);
        tracing::debug!(ability = %def.tag, %state, "ability ended");

        match state {
            AbilityState::Finished => self.queue_follow_ups(&def.on_finish, hit, env),
            AbilityState::Cancelled => {
                if let Some(montage) = &def.montage {
                    env.request(HostRequest::StopMontage {
                        agent: self.owner,
                        ability: def.tag.clone(),
                        montage: montage.name.clone(),
                    });
                }
            }
            _ => {}
        }
    }

    fn queue_follow_ups(&self, follow_ups: &[FollowUpEffect], hit: Option<HitData>, env: &mut Env) {
        for follow_up in follow_ups {
            let target = match follow_up.target {
                FollowUpTarget::Owner => Some(self.owner),
                FollowUpTarget::Confirmed => hit.and_then(|hit| hit.agent),
            };
            match target {
                Some(target) => env.defer_apply(FollowUpApply {
                    source: self.owner,
                    target,
                    spec: Arc::clone(&follow_up.effect),
                    hit,
                }),
                None => tracing::debug!(
                    effect = %follow_up.effect.name,
                    "follow-up skipped: no confirmed target"
                ),
            }
        }
    }

    /// Unbinds and removes an effect an ability owns, so its removal does not
    /// call back into the ability.
    fn drop_bound_effect(&mut self, handle: Option<EffectHandle>, env: &mut Env) {
        if let Some(handle) = handle {
            self.effects.unbind_callbacks(handle);
            self.remove_effect(handle, env);
        }
    }
}

/// Replicable state of one ability.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilitySummary {
    pub tag: Tag,
    pub input: Option<Tag>,
    pub state: AbilityState,
    pub counters: AbilityCounters,
    /// Ticks until the cooldown ends.
    pub cooldown_remaining: Option<u64>,
}

/// Replicable state of one agent.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComponentSnapshot {
    pub agent: AgentId,
    pub attributes: AttributeSnapshot,
    pub tags: TagContainer,
    pub effects: Vec<EffectSummary>,
    pub abilities: Vec<AbilitySummary>,
}

impl ComponentSnapshot {
    pub fn ability(&self, tag: &str) -> Option<&AbilitySummary> {
        self.abilities.iter().find(|ability| ability.tag.as_str() == tag)
    }
}
