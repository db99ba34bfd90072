use std::sync::Arc;

use abilities_core::{
    AgentId, AgentSetup, CueKind, CueRecorder, EffectHandle, EffectSpec, ModOp, Stacking, Tick,
    World,
};

fn world() -> (World, Arc<CueRecorder>) {
    let mut world = World::default();
    let cues = CueRecorder::new();
    world.subscribe(cues.clone());
    (world, cues)
}

fn fighter(world: &mut World) -> AgentId {
    world.spawn(
        AgentSetup::new()
            .with_attribute("Health", 100.0)
            .with_attribute("Attack", 10.0),
    )
}

#[test]
fn instant_effect_executes_exactly_once() {
    let (mut world, cues) = world();
    let agent = fighter(&mut world);
    let strike = Arc::new(EffectSpec::instant("Strike").with_modifier("Health", ModOp::Add, -10.0));

    let handle = world.apply_effect_to_self(agent, strike, None);

    assert!(handle.is_valid());
    assert!(!world.is_effect_active(handle));
    assert_eq!(world.attribute(agent, "Health"), Some(90.0));
    assert_eq!(cues.count(CueKind::Executed), 1);

    world.advance_to(Tick(10_000));
    assert_eq!(cues.count(CueKind::Executed), 1);
    assert_eq!(cues.count(CueKind::Removed), 0);
    assert_eq!(cues.count(CueKind::Expired), 0);
}

#[test]
fn duration_effect_expires_exactly_once_at_its_deadline() {
    let (mut world, cues) = world();
    let agent = fighter(&mut world);
    let shield = Arc::new(EffectSpec::lasting("Shield", 1.5).with_apply_tag("State.Shielded"));

    let handle = world.apply_effect_to_self(agent, shield, None);
    assert!(world.has_tag(agent, &"State.Shielded".into()));

    world.advance_to(Tick(1499));
    assert!(world.is_effect_active(handle));
    world.advance_to(Tick(1500));
    assert!(!world.is_effect_active(handle));
    assert!(!world.has_tag(agent, &"State.Shielded".into()));

    world.advance_to(Tick(5000));
    assert_eq!(cues.count_for(CueKind::Expired, "Shield"), 1);
    assert_eq!(cues.count_for(CueKind::Removed, "Shield"), 0);
    let expired = cues
        .events()
        .into_iter()
        .find(|event| event.kind == CueKind::Expired)
        .unwrap();
    assert_eq!(expired.params.at, Tick(1500));
}

#[test]
fn reapplying_refreshes_the_deadline_without_adding_an_instance() {
    let (mut world, _cues) = world();
    let agent = fighter(&mut world);
    let haste = Arc::new(EffectSpec::lasting("Haste", 2.0));

    let first = world.apply_effect_to_self(agent, Arc::clone(&haste), None);
    world.advance_to(Tick(1200));
    let second = world.apply_effect_to_self(agent, Arc::clone(&haste), None);

    assert_eq!(first, second);
    assert_eq!(world.agent(agent).unwrap().effects().len(), 1);
    assert_eq!(world.effect_remaining(first), Some(2000));

    let third = world.apply_effect_to_self(agent, haste, Some(first));
    assert_eq!(third, first);
    world.advance_to(Tick(3199));
    assert!(world.is_effect_active(first));
    world.advance_to(Tick(3200));
    assert!(!world.is_effect_active(first));
}

#[test]
fn refresh_is_keyed_by_instigator() {
    let (mut world, _cues) = world();
    let target = fighter(&mut world);
    let a = fighter(&mut world);
    let b = fighter(&mut world);
    let mark = Arc::new(EffectSpec::lasting("Mark", 5.0));

    let from_a = world.make_context(a, Some(target), None, None);
    let from_b = world.make_context(b, Some(target), None, None);
    let first = world.apply_effect_to_target(Arc::clone(&mark), from_a.clone(), None);
    let second = world.apply_effect_to_target(Arc::clone(&mark), from_b, None);
    let again = world.apply_effect_to_target(mark, from_a, None);

    assert_ne!(first, second);
    assert_eq!(first, again);
    assert_eq!(world.agent(target).unwrap().effects().len(), 2);
}

#[test]
fn remove_is_idempotent() {
    let (mut world, cues) = world();
    let agent = fighter(&mut world);
    let burn = Arc::new(
        EffectSpec::periodic("Burn", 4.0, 1.0).with_modifier("Health", ModOp::Add, -5.0),
    );

    let handle = world.apply_effect_to_self(agent, burn, None);
    assert!(world.remove_effect(handle));
    assert!(!world.remove_effect(handle));
    assert!(!world.remove_effect(EffectHandle::invalid()));

    world.advance_to(Tick(10_000));
    assert_eq!(cues.count_for(CueKind::Removed, "Burn"), 1);
    assert_eq!(cues.count_for(CueKind::Executed, "Burn"), 1);
    assert_eq!(world.attribute(agent, "Health"), Some(95.0));
    assert_eq!(world.env().scheduler().pending(), 0);
}

#[test]
fn multiply_then_add_and_removal_recomputes() {
    let (mut world, _cues) = world();
    let agent = fighter(&mut world);
    let might = Arc::new(EffectSpec::infinite("Might").with_modifier("Attack", ModOp::Add, 5.0));
    let enrage =
        Arc::new(EffectSpec::infinite("Enrage").with_modifier("Attack", ModOp::Multiply, 2.0));

    world.apply_effect_to_self(agent, might, None);
    let enrage = world.apply_effect_to_self(agent, enrage, None);
    assert_eq!(world.attribute(agent, "Attack"), Some(25.0));

    world.remove_effect(enrage);
    assert_eq!(world.attribute(agent, "Attack"), Some(15.0));
}

#[test]
fn independent_applications_stack() {
    let (mut world, _cues) = world();
    let agent = fighter(&mut world);
    let bleed = Arc::new(
        EffectSpec::infinite("Bleed")
            .with_modifier("Attack", ModOp::Add, -2.0)
            .with_stacking(Stacking::Independent),
    );
    for _ in 0..3 {
        world.apply_effect_to_self(agent, Arc::clone(&bleed), None);
    }
    assert_eq!(world.attribute(agent, "Attack"), Some(4.0));
    assert_eq!(world.snapshot(agent).unwrap().effects.len(), 3);
}

#[test]
fn unresolvable_target_still_reports_an_applied_cue() {
    let (mut world, cues) = world();
    let source = fighter(&mut world);
    let victim = fighter(&mut world);
    world.despawn(victim);

    let spec = Arc::new(EffectSpec::instant("Strike").with_modifier("Health", ModOp::Add, -10.0));
    let context = world.make_context(source, Some(victim), None, None);

    let handle = world.apply_effect_to_target(Arc::clone(&spec), context.clone(), None);
    assert!(!handle.is_valid());

    let previous = world.apply_effect_to_self(source, Arc::new(EffectSpec::infinite("Aura")), None);
    let preserved = world.apply_effect_to_target(spec, context, Some(previous));
    assert_eq!(preserved, previous);

    let phantoms: Vec<_> = cues
        .events()
        .into_iter()
        .filter(|event| event.params.effect == "Strike")
        .collect();
    assert_eq!(phantoms.len(), 2);
    assert!(phantoms.iter().all(|event| event.kind == CueKind::Applied));
    assert!(phantoms.iter().all(|event| event.params.target.is_none()));
    assert_eq!(cues.count(CueKind::Executed), 0);
}

#[test]
fn despawn_removes_effects_and_invalidates_handles() {
    let (mut world, cues) = world();
    let agent = fighter(&mut world);
    let handle = world.apply_effect_to_self(agent, Arc::new(EffectSpec::infinite("Curse")), None);
    let regen = world.apply_effect_to_self(agent, Arc::new(EffectSpec::periodic("Regen", 0.0, 1.0)), None);

    assert!(world.despawn(agent));
    assert!(!world.despawn(agent));
    assert!(!world.is_effect_active(handle));
    assert!(!world.is_effect_active(regen));
    assert_eq!(world.attribute(agent, "Health"), None);
    assert_eq!(cues.count(CueKind::Removed), 2);
    assert_eq!(world.env().scheduler().pending(), 0);

    let replacement = fighter(&mut world);
    assert_ne!(replacement, agent);
    assert!(!world.remove_effect(handle));
}

#[test]
fn attribute_based_magnitude_uses_the_instigator_snapshot() {
    use abilities_core::{AttributeBased, AttributeSource, Magnitude};

    let (mut world, _cues) = world();
    let mage = world.spawn(AgentSetup::new().with_attribute("Power", 20.0));
    let dummy = fighter(&mut world);
    let bolt = Arc::new(EffectSpec::instant("Bolt").with_modifier(
        "Health",
        ModOp::Add,
        Magnitude::AttributeBased(
            AttributeBased::new("Power", AttributeSource::Instigator).scaled(-1.5),
        ),
    ));

    let context = world.make_context(mage, Some(dummy), None, None);
    world.apply_effect_to_target(bolt, context, None);
    assert_eq!(world.attribute(dummy, "Health"), Some(70.0));
}

#[test]
fn malformed_attribute_bounds_reject_the_spawn() {
    use abilities_core::{AttributeBounds, AttributeDef, AttributeError};

    let (mut world, _cues) = world();
    let inverted = AgentSetup::new().with_attribute_def(
        AttributeDef::new("Health", 50.0).with_bounds(AttributeBounds::new(10.0, 0.0)),
    );
    assert_eq!(
        world.try_spawn(inverted.clone()),
        Err(AttributeError::InvalidBounds("Health".into()))
    );
    let rejected = world.spawn(inverted);
    assert_eq!(rejected, AgentId::default());
    assert!(!world.contains(rejected));
    assert_eq!(world.agents().count(), 0);

    let nan = AgentSetup::new().with_attribute_def(
        AttributeDef::new("Mana", 5.0).with_bounds(AttributeBounds::new(f32::NAN, 1.0)),
    );
    assert!(world.try_spawn(nan).is_err());
    assert_eq!(world.agents().count(), 0);
}
