//! Content compiled into the binary.

use abilities_core::EngineConfig;

use crate::catalog::ContentCatalog;
use crate::loaders::factory::assemble_catalog;
use crate::loaders::{
    AbilityLoader, AbilitySetLoader, ConfigLoader, EffectLoader, LoadResult, ScenarioLoader,
    TemplateLoader,
};
use crate::scenario::Scenario;

const CONFIG: &str = include_str!("../../data/config.toml");
const EFFECTS: &str = include_str!("../../data/effects.ron");
const ABILITIES: &str = include_str!("../../data/abilities.ron");
const SETS: &str = include_str!("../../data/sets.ron");
const TEMPLATES: &str = include_str!("../../data/templates.ron");

const SCENARIOS: &[(&str, &str)] = &[
    (
        "fireball_duel",
        include_str!("../../data/scenarios/fireball_duel.ron"),
    ),
    (
        "channel_heal",
        include_str!("../../data/scenarios/channel_heal.ron"),
    ),
];

pub fn embedded_config() -> LoadResult<EngineConfig> {
    ConfigLoader::parse(CONFIG)
}

/// Links the embedded effects, abilities, sets and templates.
pub fn embedded_catalog() -> LoadResult<ContentCatalog> {
    assemble_catalog(
        EffectLoader::parse(EFFECTS)?,
        AbilityLoader::parse(ABILITIES)?,
        AbilitySetLoader::parse(SETS)?,
        TemplateLoader::parse(TEMPLATES)?,
    )
}

pub fn embedded_scenario(name: &str) -> LoadResult<Scenario> {
    let (_, content) = SCENARIOS
        .iter()
        .find(|(scenario, _)| *scenario == name)
        .ok_or_else(|| anyhow::anyhow!("No embedded scenario named '{}'", name))?;
    ScenarioLoader::parse(content)
}

/// Names of the embedded scenarios.
pub fn embedded_scenarios() -> impl Iterator<Item = &'static str> {
    SCENARIOS.iter().map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_content_links() {
        let catalog = embedded_catalog().expect("Failed to load embedded content");
        assert!(catalog.effect_count() >= 10);
        assert!(catalog.ability(&"Ability.Fireball".into()).is_some());
        for template in ["mage", "training_dummy"] {
            assert!(catalog.agent_setup(template).is_ok(), "template {template}");
        }
    }

    #[test]
    fn embedded_config_is_valid() {
        let config = embedded_config().unwrap();
        assert_eq!(config.ticks_per_second, 1000);
    }

    #[test]
    fn embedded_scenarios_reference_known_templates() {
        let catalog = embedded_catalog().unwrap();
        for name in embedded_scenarios() {
            let scenario = embedded_scenario(name).unwrap();
            for agent in &scenario.agents {
                assert!(
                    catalog.template(&agent.template).is_some(),
                    "scenario {name} uses unknown template {}",
                    agent.template
                );
            }
        }
        assert!(embedded_scenario("nope").is_err());
    }
}
