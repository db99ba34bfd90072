use abilities_content::{embedded_catalog, embedded_config};
use abilities_core::{
    AbilityState, CueKind, CueRecorder, HitData, HostRequest, InputOutcome, Location, Tick, World,
};

#[test]
fn fireball_lands_and_burns_the_confirmed_target() {
    // Setup: world from the embedded config and catalog
    let catalog = embedded_catalog().unwrap();
    let mut world = World::new(embedded_config().unwrap()).unwrap();
    let cues = CueRecorder::new();
    world.subscribe(cues.clone());

    let mage = world.spawn(catalog.agent_setup("mage").unwrap());
    let dummy = world.spawn(catalog.agent_setup("training_dummy").unwrap());
    let fireball = world.ability_by_tag(mage, &"Ability.Fireball".into()).unwrap();

    assert_eq!(world.input_pressed(mage, &"Input.Primary".into()), InputOutcome::Activated);
    assert_eq!(world.ability_state(mage, fireball), Some(AbilityState::WaitingForConfirm));
    assert_eq!(world.attribute(mage, "Mana"), Some(100.0));

    let hit = HitData::agent(dummy, Location::new(6.0, 0.0, 0.0));
    assert!(world.confirm(mage, fireball, Some(hit)));
    assert_eq!(world.attribute(mage, "Mana"), Some(80.0));
    assert!(world.is_on_cooldown(mage, fireball));

    // Cast finishes at 1.0: 15 power * -2 = -30, then the burn ticks once on application
    world.advance_to(Tick(1000));
    assert_eq!(world.ability_state(mage, fireball), Some(AbilityState::Finished));
    assert_eq!(world.attribute(dummy, "Health"), Some(466.0));
    assert!(world.has_tag(dummy, &"State.Burning".into()));

    // Burn ticks at 2.0 and 3.0 and expires at 4.0
    world.advance_to(Tick(5000));
    assert_eq!(world.attribute(dummy, "Health"), Some(458.0));
    assert!(!world.has_tag(dummy, &"State.Burning".into()));
    assert_eq!(cues.count_for(CueKind::Executed, "Burn"), 3);
    assert_eq!(cues.count_for(CueKind::Expired, "Burn"), 1);
    assert!(!world.is_on_cooldown(mage, fireball));

    let requests = world.take_host_requests();
    assert!(matches!(
        requests.as_slice(),
        [HostRequest::PlayMontage { play_rate, .. }] if (*play_rate - 1.2).abs() < 1e-6
    ));
}

#[test]
fn cleanse_removes_debuffs_by_parent_tag() {
    let catalog = embedded_catalog().unwrap();
    let mut world = World::default();
    let mage = world.spawn(catalog.agent_setup("mage").unwrap());
    let dummy = world.spawn(catalog.agent_setup("training_dummy").unwrap());

    let burn = catalog.effect("Burn").unwrap();
    let context = world.make_context(mage, Some(dummy), None, None);
    let handle = world.apply_effect_to_target(burn, context, None);
    assert!(world.is_effect_active(handle));

    let cleanse = world.ability_by_tag(dummy, &"Ability.Cleanse".into()).unwrap();
    assert!(world.activate_ability(dummy, cleanse));
    assert!(!world.is_effect_active(handle));
    assert_eq!(world.attribute(dummy, "Health"), Some(496.0));
}

#[test]
fn barrier_activates_on_release_and_stacks_armor_modifiers() {
    let catalog = embedded_catalog().unwrap();
    let mut world = World::default();
    let mage = world.spawn(catalog.agent_setup("mage").unwrap());
    let input = "Input.Ability1".into();

    assert_eq!(world.input_pressed(mage, &input), InputOutcome::Ignored);
    assert_eq!(world.input_released(mage, &input), InputOutcome::Activated);
    // Override, then Multiply, then Add: 5 * 1.5 + 10
    assert_eq!(world.attribute(mage, "Armor"), Some(17.5));
    assert_eq!(world.attribute(mage, "Mana"), Some(85.0));

    world.advance_seconds(4.0);
    assert_eq!(world.attribute(mage, "Armor"), Some(5.0));
}
