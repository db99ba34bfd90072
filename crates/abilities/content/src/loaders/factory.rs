//! Content factory for building a catalog from a data directory.

use std::path::{Path, PathBuf};

use abilities_core::{EffectSpec, EngineConfig};

use crate::catalog::{AbilitySetSpec, AbilitySpec, AgentTemplate, ContentCatalog};
use crate::loaders::{
    AbilityLoader, AbilitySetLoader, ConfigLoader, EffectLoader, LoadResult, ScenarioLoader,
    TemplateLoader,
};
use crate::scenario::Scenario;

/// Content factory that loads all ability content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// ├── effects.ron
/// ├── abilities.ron
/// ├── sets.ron
/// ├── templates.ron
/// └── scenarios/
///     └── fireball_duel.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load engine configuration from `config.toml`, or the defaults if the
    /// file does not exist.
    pub fn load_config(&self) -> LoadResult<EngineConfig> {
        let path = self.data_dir.join("config.toml");
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file; using defaults");
            return Ok(EngineConfig::default());
        }
        ConfigLoader::load(&path)
    }

    pub fn load_effects(&self) -> LoadResult<Vec<EffectSpec>> {
        EffectLoader::load(&self.data_dir.join("effects.ron"))
    }

    pub fn load_abilities(&self) -> LoadResult<Vec<AbilitySpec>> {
        AbilityLoader::load(&self.data_dir.join("abilities.ron"))
    }

    pub fn load_sets(&self) -> LoadResult<Vec<AbilitySetSpec>> {
        AbilitySetLoader::load(&self.data_dir.join("sets.ron"))
    }

    pub fn load_templates(&self) -> LoadResult<Vec<AgentTemplate>> {
        TemplateLoader::load(&self.data_dir.join("templates.ron"))
    }

    /// Load and link every content file into one catalog.
    pub fn load_catalog(&self) -> LoadResult<ContentCatalog> {
        assemble_catalog(
            self.load_effects()?,
            self.load_abilities()?,
            self.load_sets()?,
            self.load_templates()?,
        )
    }

    /// Load a scenario from `scenarios/{name}.ron`.
    pub fn load_scenario(&self, name: &str) -> LoadResult<Scenario> {
        let path = self
            .data_dir
            .join("scenarios")
            .join(format!("{}.ron", name));
        ScenarioLoader::load(&path)
    }

    /// Names of the scenarios under `scenarios/`, sorted. A missing
    /// directory means no scenarios.
    pub fn scenario_names(&self) -> LoadResult<Vec<String>> {
        let dir = self.data_dir.join("scenarios");
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&dir)
            .map_err(|e| anyhow::anyhow!("Failed to read directory {}: {}", dir.display(), e))?;
        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "ron")
                && let Some(stem) = path.file_stem().and_then(|stem| stem.to_str())
            {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

/// Links loaded content bottom-up into a catalog.
pub(crate) fn assemble_catalog(
    effects: Vec<EffectSpec>,
    abilities: Vec<AbilitySpec>,
    sets: Vec<AbilitySetSpec>,
    templates: Vec<AgentTemplate>,
) -> LoadResult<ContentCatalog> {
    let mut catalog = ContentCatalog::new();
    catalog.add_effects(effects)?;
    for ability in &abilities {
        catalog.add_ability(ability)?;
    }
    for set in &sets {
        catalog.add_set(set)?;
    }
    for template in templates {
        catalog.add_template(template)?;
    }
    tracing::debug!(
        effects = catalog.effect_count(),
        abilities = catalog.ability_count(),
        sets = catalog.set_count(),
        templates = catalog.template_count(),
        "content catalog assembled"
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    fn populate(dir: &Path) {
        write(
            dir,
            "effects.ron",
            r#"(effects: [
                (name: "Jab.Cast", kind: Duration, duration: Constant(0.3)),
                (name: "Jab.Hit", kind: Instant, modifiers: [(attribute: "Health", op: Add, magnitude: Constant(-3.0))]),
            ])"#,
        );
        write(
            dir,
            "abilities.ron",
            r#"(abilities: [
                (tag: "Ability.Jab", activation: Some("Jab.Cast"), on_finish: [(effect: "Jab.Hit", target: Owner)]),
            ])"#,
        );
        write(
            dir,
            "sets.ron",
            r#"(sets: [(name: "boxer", abilities: [(ability: "Ability.Jab", input: Some("Input.Primary"))])])"#,
        );
        write(
            dir,
            "templates.ron",
            r#"(templates: [(name: "boxer", attributes: [(id: "Health", base: 20.0)], ability_sets: ["boxer"])])"#,
        );
    }

    #[test]
    fn test_factory_paths() {
        let factory = ContentFactory::new("/tmp/data");
        assert_eq!(factory.data_dir(), Path::new("/tmp/data"));
    }

    #[test]
    fn loads_a_catalog_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path());

        let factory = ContentFactory::new(dir.path());
        let catalog = factory.load_catalog().unwrap();
        assert_eq!(catalog.effect_count(), 2);
        assert_eq!(catalog.ability_count(), 1);
        assert!(catalog.agent_setup("boxer").is_ok());

        // config.toml is optional
        assert_eq!(factory.load_config().unwrap(), EngineConfig::default());
        write(dir.path(), "config.toml", "ticks_per_second = 20");
        assert_eq!(factory.load_config().unwrap().ticks_per_second, 20);
    }

    #[test]
    fn dangling_names_fail_the_whole_load() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path());
        write(
            dir.path(),
            "abilities.ron",
            r#"(abilities: [(tag: "Ability.Jab", activation: Some("Missing"))])"#,
        );

        let error = ContentFactory::new(dir.path()).load_catalog().unwrap_err();
        assert!(error.to_string().contains("Missing"));
    }

    #[test]
    fn lists_scenarios_by_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let factory = ContentFactory::new(dir.path());
        assert!(factory.scenario_names().unwrap().is_empty());

        let scenarios = dir.path().join("scenarios");
        fs::create_dir(&scenarios).unwrap();
        write(&scenarios, "spar.ron", "");
        write(&scenarios, "intro.ron", "");
        write(&scenarios, "notes.txt", "");
        assert_eq!(factory.scenario_names().unwrap(), vec!["intro", "spar"]);
    }

    #[test]
    fn missing_files_name_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let error = ContentFactory::new(dir.path()).load_effects().unwrap_err();
        assert!(error.to_string().contains("effects.ron"));
    }
}
