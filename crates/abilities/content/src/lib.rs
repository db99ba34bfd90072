//! Data-driven ability content and loaders.
//!
//! This crate houses authored content and provides loaders for RON/TOML data files:
//! - Effect specs (RON)
//! - Ability definitions referencing effects by name (RON)
//! - Ability sets binding abilities to inputs (RON)
//! - Agent templates with starting attributes (RON)
//! - Scenario scripts (RON)
//! - Engine configuration (TOML)
//!
//! [`ContentCatalog`] links named references into shared `abilities-core`
//! definitions ready to grant.

pub mod catalog;
pub mod scenario;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use catalog::{
    AbilitySetSpec, AbilitySpec, AgentTemplate, CatalogError, ContentCatalog, FollowUpSpec,
    GrantSpec,
};
pub use scenario::{Scenario, ScenarioAction, ScenarioAgent, ScenarioError, ScenarioStep};

#[cfg(feature = "loaders")]
pub use loaders::{
    AbilityLoader, AbilitySetLoader, ConfigLoader, ContentFactory, EffectLoader, LoadResult,
    ScenarioLoader, TemplateLoader, embedded_catalog, embedded_config, embedded_scenario,
    embedded_scenarios,
};
