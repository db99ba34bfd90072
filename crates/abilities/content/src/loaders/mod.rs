//! Content loaders for reading ability data from files.
//!
//! RON holds effects, abilities, ability sets, agent templates and scenarios;
//! TOML holds the engine configuration.

pub mod abilities;
pub mod config;
pub mod effects;
pub mod embedded;
pub mod factory;
pub mod scenario;
pub mod templates;

pub use abilities::{AbilityLoader, AbilitySetLoader};
pub use config::ConfigLoader;
pub use effects::EffectLoader;
pub use embedded::{embedded_catalog, embedded_config, embedded_scenario, embedded_scenarios};
pub use factory::ContentFactory;
pub use scenario::ScenarioLoader;
pub use templates::TemplateLoader;

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
