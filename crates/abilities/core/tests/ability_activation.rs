use std::sync::Arc;

use abilities_core::{
    AbilityDef, AbilityId, AbilityState, ActivationError, AgentId, AgentSetup, ConfirmPolicy,
    CueKind, CueRecorder, EffectSpec, EngineConfig, FollowUpTarget, HitData, HostRequest,
    InputBehavior, InputOutcome, Location, ModOp, Tag, Tick, World,
};

const PRIMARY: &str = "Input.Primary";

fn world() -> (World, Arc<CueRecorder>) {
    let mut world = World::default();
    let cues = CueRecorder::new();
    world.subscribe(cues.clone());
    (world, cues)
}

fn caster(world: &mut World, def: AbilityDef) -> (AgentId, AbilityId) {
    let tag = def.tag.clone();
    let agent = world.spawn(
        AgentSetup::new()
            .with_attribute("Health", 100.0)
            .with_attribute("Mana", 50.0)
            .with_ability(Arc::new(def), Some(PRIMARY.into())),
    );
    let ability = world.ability_by_tag(agent, &tag).unwrap();
    (agent, ability)
}

fn channel() -> AbilityDef {
    AbilityDef::new("Ability.Channel")
        .with_activation(EffectSpec::lasting("Channel", 2.0).with_period(0.5))
        .on_period(
            EffectSpec::instant("Channel.Drain").with_modifier("Health", ModOp::Add, -1.0),
            FollowUpTarget::Owner,
        )
}

#[test]
fn periodic_activation_runs_to_completion() {
    let (mut world, cues) = world();
    let (agent, ability) = caster(&mut world, channel());

    // Setup: press at t=0
    assert_eq!(world.input_pressed(agent, &PRIMARY.into()), InputOutcome::Activated);
    assert_eq!(world.ability_state(agent, ability), Some(AbilityState::Active));
    assert_eq!(world.executing(agent), Some(ability));

    for (tick, periods) in [(500, 1), (1000, 2), (1500, 3)] {
        world.advance_to(Tick(tick));
        let summary = world.snapshot(agent).unwrap();
        assert_eq!(summary.ability("Ability.Channel").unwrap().counters.period, periods);
        assert_eq!(world.ability_state(agent, ability), Some(AbilityState::Active));
    }

    // Expiry wins the tie with the fourth period at t=2000
    world.advance_to(Tick(2000));
    let snapshot = world.snapshot(agent).unwrap();
    let summary = snapshot.ability("Ability.Channel").unwrap();
    assert_eq!(summary.state, AbilityState::Finished);
    assert_eq!(summary.counters.period, 3);
    assert_eq!(summary.counters.finished, 1);
    assert_eq!(summary.counters.cancelled, 0);
    assert_eq!(world.executing(agent), None);

    assert_eq!(cues.count_for(CueKind::Executed, "Channel"), 4);
    assert_eq!(cues.count_for(CueKind::Expired, "Channel"), 1);
    assert_eq!(cues.count_for(CueKind::Removed, "Channel"), 0);
    assert_eq!(world.attribute(agent, "Health"), Some(97.0));

    world.advance_to(Tick(10_000));
    assert_eq!(cues.count_for(CueKind::Executed, "Channel"), 4);
}

#[test]
fn removing_the_activation_effect_cancels_the_ability() {
    let (mut world, cues) = world();
    let (agent, ability) = caster(&mut world, channel());

    world.activate_ability(agent, ability);
    world.advance_to(Tick(200));
    let handle = world
        .agent(agent)
        .and_then(|component| component.abilities().get(ability))
        .and_then(|instance| instance.activation_handle())
        .unwrap();
    assert!(world.remove_effect(handle));

    assert_eq!(world.ability_state(agent, ability), Some(AbilityState::Cancelled));
    assert_eq!(world.executing(agent), None);
    assert_eq!(cues.count_for(CueKind::Removed, "Channel"), 1);

    world.advance_to(Tick(2000));
    let snapshot = world.snapshot(agent).unwrap();
    let counters = snapshot.ability("Ability.Channel").unwrap().counters;
    assert_eq!(counters.period, 0);
    assert_eq!(counters.cancelled, 1);
    assert_eq!(counters.finished, 0);
    assert_eq!(cues.count_for(CueKind::Executed, "Channel"), 1);
    assert_eq!(cues.count_for(CueKind::Expired, "Channel"), 0);

    // The slot is free again
    assert!(world.activate_ability(agent, ability));
}

#[test]
fn at_most_one_ability_executes_per_agent() {
    let (mut world, _cues) = world();
    let long = Arc::new(AbilityDef::new("Ability.Long").with_activation(EffectSpec::lasting("Long", 1.0)));
    let quick = Arc::new(AbilityDef::new("Ability.Quick"));
    let agent = world.spawn(
        AgentSetup::new()
            .with_ability(long, None)
            .with_ability(quick, None),
    );
    let long = world.ability_by_tag(agent, &"Ability.Long".into()).unwrap();
    let quick = world.ability_by_tag(agent, &"Ability.Quick".into()).unwrap();

    assert_eq!(world.try_activate_ability(agent, long), Ok(InputOutcome::Activated));
    assert_eq!(
        world.try_activate_ability(agent, quick),
        Err(ActivationError::Reentrant {
            executing: "Ability.Long".into()
        })
    );
    assert_eq!(
        world.try_activate_ability(agent, long),
        Err(ActivationError::AlreadyActivating)
    );

    world.advance_seconds(1.0);
    assert_eq!(world.ability_state(agent, long), Some(AbilityState::Finished));
    assert_eq!(world.try_activate_ability(agent, quick), Ok(InputOutcome::Activated));
    // No activation effect: the ability finishes synchronously
    assert_eq!(world.ability_state(agent, quick), Some(AbilityState::Finished));
    assert_eq!(world.executing(agent), None);
}

#[test]
fn cooldown_blocks_until_it_expires() {
    let (mut world, _cues) = world();
    let def = AbilityDef::new("Ability.Bolt")
        .with_cooldown(EffectSpec::lasting("Cooldown.Bolt", 1.0))
        .with_cost(EffectSpec::instant("Cost.Bolt").with_modifier("Mana", ModOp::Add, -10.0));
    let (agent, ability) = caster(&mut world, def);

    assert_eq!(world.input_pressed(agent, &PRIMARY.into()), InputOutcome::Activated);
    assert_eq!(world.attribute(agent, "Mana"), Some(40.0));
    assert!(world.is_on_cooldown(agent, ability));
    assert_eq!(
        world.try_activate_ability(agent, ability),
        Err(ActivationError::OnCooldown)
    );
    assert_eq!(world.input_pressed(agent, &PRIMARY.into()), InputOutcome::Ignored);

    world.advance_to(Tick(999));
    assert!(world.is_on_cooldown(agent, ability));
    world.advance_to(Tick(1000));
    assert!(!world.is_on_cooldown(agent, ability));

    let snapshot = world.snapshot(agent).unwrap();
    let counters = snapshot.ability("Ability.Bolt").unwrap().counters;
    assert_eq!(counters.cooldown_started, 1);
    assert_eq!(counters.cooldown_expired, 1);
    assert_eq!(counters.activation_started, 1);

    assert_eq!(world.input_pressed(agent, &PRIMARY.into()), InputOutcome::Activated);
    assert_eq!(world.attribute(agent, "Mana"), Some(30.0));
}

#[test]
fn blocking_tags_prevent_activation() {
    let (mut world, _cues) = world();
    let def = AbilityDef::new("Ability.Dash").blocked_by("State.Stunned");
    let (agent, ability) = caster(&mut world, def);

    let stun = world.apply_effect_to_self(
        agent,
        Arc::new(EffectSpec::infinite("Stun").with_apply_tag("State.Stunned")),
        None,
    );
    assert_eq!(
        world.try_activate_ability(agent, ability),
        Err(ActivationError::Blocked("State.Stunned".into()))
    );

    world.remove_effect(stun);
    assert_eq!(world.try_activate_ability(agent, ability), Ok(InputOutcome::Activated));
}

#[test]
fn confirmation_commits_and_targets_the_hit_agent() {
    let (mut world, cues) = world();
    let def = AbilityDef::new("Ability.Fireball")
        .with_confirm(ConfirmPolicy::WaitForConfirm)
        .with_activation(EffectSpec::lasting("Fireball.Cast", 1.0))
        .with_activation_tag("State.Casting")
        .on_finish(
            EffectSpec::instant("Fireball.Damage").with_modifier("Health", ModOp::Add, -25.0),
            FollowUpTarget::Confirmed,
        );
    let (agent, ability) = caster(&mut world, def);
    let target = world.spawn(AgentSetup::new().with_attribute("Health", 100.0));

    assert_eq!(world.input_pressed(agent, &PRIMARY.into()), InputOutcome::Activated);
    assert_eq!(world.ability_state(agent, ability), Some(AbilityState::WaitingForConfirm));
    assert!(world.has_tag(agent, &"State.Casting".into()));
    assert_eq!(cues.count_for(CueKind::Applied, "Fireball.Cast"), 0);

    let hit = HitData::agent(target, Location::new(4.0, 0.0, 0.0));
    assert!(world.confirm(agent, ability, Some(hit)));
    assert!(!world.confirm(agent, ability, Some(hit)));
    assert_eq!(world.ability_state(agent, ability), Some(AbilityState::Active));

    world.advance_to(Tick(1000));
    assert_eq!(world.ability_state(agent, ability), Some(AbilityState::Finished));
    assert!(!world.has_tag(agent, &"State.Casting".into()));
    assert_eq!(world.attribute(target, "Health"), Some(75.0));
    assert_eq!(world.attribute(agent, "Health"), Some(100.0));
}

#[test]
fn pressing_again_confirms_a_waiting_activation() {
    let (mut world, _cues) = world();
    let def = AbilityDef::new("Ability.Aimed")
        .with_confirm(ConfirmPolicy::WaitForConfirm)
        .with_activation(EffectSpec::lasting("Aimed", 0.5));
    let (agent, ability) = caster(&mut world, def);

    assert_eq!(world.input_pressed(agent, &PRIMARY.into()), InputOutcome::Activated);
    assert_eq!(world.input_pressed(agent, &PRIMARY.into()), InputOutcome::Confirmed);
    assert_eq!(world.ability_state(agent, ability), Some(AbilityState::Active));
}

#[test]
fn cancelling_while_waiting_releases_the_slot() {
    let (mut world, cues) = world();
    let def = AbilityDef::new("Ability.Aimed")
        .with_confirm(ConfirmPolicy::WaitForConfirm)
        .with_activation(EffectSpec::lasting("Aimed", 0.5));
    let (agent, ability) = caster(&mut world, def);

    world.activate_ability(agent, ability);
    assert!(world.cancel_ability(agent, ability));
    assert!(!world.cancel_ability(agent, ability));
    assert_eq!(world.ability_state(agent, ability), Some(AbilityState::Cancelled));
    assert_eq!(world.executing(agent), None);
    assert!(!world.confirm(agent, ability, None));
    assert_eq!(cues.events().len(), 0);
}

#[test]
fn finishing_early_removes_the_activation_effect() {
    let (mut world, cues) = world();
    let (agent, ability) = caster(&mut world, channel());

    world.activate_ability(agent, ability);
    world.advance_to(Tick(700));
    assert!(world.finish_ability(agent, ability));

    let snapshot = world.snapshot(agent).unwrap();
    let summary = snapshot.ability("Ability.Channel").unwrap();
    assert_eq!(summary.state, AbilityState::Finished);
    assert_eq!(summary.counters.finished, 1);
    assert_eq!(summary.counters.cancelled, 0);
    assert!(snapshot.effects.is_empty());
    assert_eq!(cues.count_for(CueKind::Removed, "Channel"), 1);

    assert_eq!(summary.counters.period, 1);

    world.advance_to(Tick(5000));
    let later = world.snapshot(agent).unwrap();
    assert_eq!(later.ability("Ability.Channel").unwrap().counters.period, 1);
}

#[test]
fn channel_release_finishes_an_active_channel() {
    let (mut world, _cues) = world();
    let def = channel().with_input(InputBehavior::Channel);
    let (agent, ability) = caster(&mut world, def);
    let input: Tag = PRIMARY.into();

    assert_eq!(world.input_pressed(agent, &input), InputOutcome::Activated);
    world.advance_to(Tick(300));
    assert_eq!(world.input_released(agent, &input), InputOutcome::Finished);
    assert_eq!(world.ability_state(agent, ability), Some(AbilityState::Finished));
    assert_eq!(world.input_released(agent, &input), InputOutcome::Ignored);
}

#[test]
fn release_triggered_abilities_activate_on_release() {
    let (mut world, _cues) = world();
    let def = AbilityDef::new("Ability.Throw")
        .with_input(InputBehavior::OnRelease)
        .with_activation(EffectSpec::lasting("Throw", 0.25));
    let (agent, ability) = caster(&mut world, def);
    let input: Tag = PRIMARY.into();

    assert_eq!(world.input_pressed(agent, &input), InputOutcome::Ignored);
    assert_eq!(world.ability_state(agent, ability), Some(AbilityState::Idle));
    assert_eq!(world.input_released(agent, &input), InputOutcome::Activated);
    assert_eq!(world.ability_state(agent, ability), Some(AbilityState::Active));
}

#[test]
fn zero_duration_activation_finishes_without_becoming_active() {
    let (mut world, cues) = world();
    let def = AbilityDef::new("Ability.Blink").with_activation(EffectSpec::lasting("Blink", 0.0));
    let (agent, ability) = caster(&mut world, def);

    assert!(world.activate_ability(agent, ability));
    assert_eq!(world.ability_state(agent, ability), Some(AbilityState::Finished));
    assert_eq!(world.executing(agent), None);
    assert_eq!(cues.count_for(CueKind::Executed, "Blink"), 1);

    let snapshot = world.snapshot(agent).unwrap();
    assert_eq!(snapshot.ability("Ability.Blink").unwrap().counters.finished, 1);
}

#[test]
fn montage_requests_follow_the_activation() {
    let (mut world, _cues) = world();
    let def = channel().with_montage("cast_loop", 1.0);
    let (agent, ability) = caster(&mut world, def);

    world.activate_ability(agent, ability);
    world.cancel_ability(agent, ability);

    let requests = world.take_host_requests();
    assert_eq!(requests.len(), 2);
    match &requests[0] {
        HostRequest::PlayMontage {
            montage, play_rate, ..
        } => {
            assert_eq!(montage, "cast_loop");
            assert!((play_rate - 0.5).abs() < f32::EPSILON);
        }
        other => panic!("unexpected request {other:?}"),
    }
    assert!(matches!(requests[1], HostRequest::StopMontage { .. }));
    assert!(world.take_host_requests().is_empty());
}

#[test]
fn revoking_a_running_ability_stops_everything() {
    let (mut world, _cues) = world();
    let def = channel().with_cooldown(EffectSpec::lasting("Cooldown.Channel", 5.0));
    let (agent, ability) = caster(&mut world, def);

    world.activate_ability(agent, ability);
    assert!(world.revoke_ability(agent, ability));
    assert_eq!(world.ability_state(agent, ability), None);
    assert_eq!(world.executing(agent), None);
    assert!(world.snapshot(agent).unwrap().effects.is_empty());
    assert_eq!(world.input_pressed(agent, &PRIMARY.into()), InputOutcome::Ignored);
    assert_eq!(world.env().scheduler().pending(), 0);
}

#[test]
fn unknown_agents_and_abilities_are_rejected() {
    let (mut world, _cues) = world();
    let (agent, ability) = caster(&mut world, channel());
    world.despawn(agent);

    assert_eq!(
        world.try_activate_ability(agent, ability),
        Err(ActivationError::UnknownAgent)
    );
    assert_eq!(world.input_pressed(agent, &PRIMARY.into()), InputOutcome::Ignored);

    let other = world.spawn(AgentSetup::new());
    assert_eq!(
        world.try_activate_ability(other, ability),
        Err(ActivationError::UnknownAbility)
    );
}

#[test]
fn resting_abilities_activate_again_without_returning_to_idle() {
    let (mut world, _cues) = world();
    let def = AbilityDef::new("Ability.Jab").with_activation(EffectSpec::lasting("Jab", 0.5));
    let (agent, ability) = caster(&mut world, def);

    assert!(world.activate_ability(agent, ability));
    world.advance_to(Tick(500));
    assert_eq!(world.ability_state(agent, ability), Some(AbilityState::Finished));

    assert!(world.activate_ability(agent, ability));
    assert_eq!(world.ability_state(agent, ability), Some(AbilityState::Active));
    assert!(world.cancel_ability(agent, ability));
    assert_eq!(world.ability_state(agent, ability), Some(AbilityState::Cancelled));
    assert!(AbilityState::Cancelled.is_resting());

    assert!(world.activate_ability(agent, ability));
    assert_eq!(world.ability_state(agent, ability), Some(AbilityState::Active));
    let snapshot = world.snapshot(agent).unwrap();
    let counters = snapshot.ability("Ability.Jab").unwrap().counters;
    assert_eq!(counters.activation_started, 3);
    assert_eq!(counters.finished, 1);
    assert_eq!(counters.cancelled, 1);
}

#[test]
fn callback_chain_limit_still_releases_the_executing_slot() {
    let config = EngineConfig {
        max_callback_chain: 2,
        ..EngineConfig::default()
    };
    let mut world = World::new(config).unwrap();
    let def = AbilityDef::new("Ability.Unstable")
        .with_activation(
            EffectSpec::lasting("Unstable", 2.0)
                .with_period(0.5)
                .with_owned_tag("Effect.Unstable"),
        )
        .on_period(
            EffectSpec::instant("Collapse").removing_effects_with("Effect.Unstable"),
            FollowUpTarget::Owner,
        );
    let (agent, ability) = caster(&mut world, def);

    assert!(world.activate_ability(agent, ability));
    assert_eq!(world.ability_state(agent, ability), Some(AbilityState::Active));

    // period hook, then the collapse follow-up; the cancel callback is past the limit
    world.advance_to(Tick(500));
    assert_eq!(world.ability_state(agent, ability), Some(AbilityState::Cancelled));
    assert_eq!(world.executing(agent), None);
    assert!(world.activate_ability(agent, ability));
}
