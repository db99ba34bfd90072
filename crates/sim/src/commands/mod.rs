//! Runner subcommands

mod check;
mod list;
mod run;

pub use check::Check;
pub use list::List;
pub use run::Run;

use std::path::{Path, PathBuf};

use abilities_content::{
    ContentCatalog, ContentFactory, Scenario, embedded_catalog, embedded_config,
    embedded_scenario, embedded_scenarios,
};
use abilities_core::EngineConfig;
use anyhow::{Context, Result};

use crate::config::SimConfig;

/// Config and catalog, either compiled in or read from a data directory.
pub struct Content {
    pub config: EngineConfig,
    pub catalog: ContentCatalog,
    factory: Option<ContentFactory>,
}

impl Content {
    /// `--data-dir` wins over `ABILITY_SIM_DATA_DIR`; with neither, the
    /// embedded content is used.
    pub fn load(data_dir: Option<PathBuf>, config: &SimConfig) -> Result<Self> {
        match data_dir.or_else(|| config.data_dir.clone()) {
            Some(dir) => Self::from_dir(&dir),
            None => Self::embedded(),
        }
    }

    pub fn embedded() -> Result<Self> {
        let content = Self {
            config: embedded_config()?,
            catalog: embedded_catalog().context("Embedded content is invalid")?,
            factory: None,
        };
        tracing::info!("Loaded embedded content");
        Ok(content)
    }

    pub fn from_dir(dir: &Path) -> Result<Self> {
        let factory = ContentFactory::new(dir);
        let content = Self {
            config: factory.load_config()?,
            catalog: factory
                .load_catalog()
                .with_context(|| format!("Failed to load content from {}", dir.display()))?,
            factory: Some(factory),
        };
        tracing::info!("Loaded content from {}", dir.display());
        Ok(content)
    }

    pub fn source(&self) -> String {
        match &self.factory {
            Some(factory) => factory.data_dir().display().to_string(),
            None => "embedded".to_string(),
        }
    }

    pub fn scenario(&self, name: &str) -> Result<Scenario> {
        match &self.factory {
            Some(factory) => factory.load_scenario(name),
            None => embedded_scenario(name),
        }
    }

    pub fn scenario_names(&self) -> Result<Vec<String>> {
        match &self.factory {
            Some(factory) => factory.scenario_names(),
            None => Ok(embedded_scenarios().map(str::to_string).collect()),
        }
    }
}
