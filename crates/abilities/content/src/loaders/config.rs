//! Engine configuration loader.

use std::path::Path;

use abilities_core::EngineConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for engine configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate an [`EngineConfig`] from a TOML file.
    ///
    /// Missing keys fall back to the engine defaults.
    pub fn load(path: &Path) -> LoadResult<EngineConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config {}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> LoadResult<EngineConfig> {
        let config: EngineConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abilities_core::{ModOp, Stacking};

    #[test]
    fn partial_config_keeps_defaults() {
        let config = ConfigLoader::parse("ticks_per_second = 60").unwrap();
        assert_eq!(config.ticks_per_second, 60);
        assert_eq!(config.default_stacking, Stacking::Refresh);
        assert_eq!(
            config.max_effects_per_agent,
            EngineConfig::DEFAULT_MAX_EFFECTS_PER_AGENT
        );
    }

    #[test]
    fn modifier_order_and_limits_are_validated() {
        let config = ConfigLoader::parse(
            r#"
            modifier_order = ["Override", "Add", "Multiply"]
            default_stacking = "Independent"
            "#,
        )
        .unwrap();
        assert_eq!(config.modifier_order.ops(), [ModOp::Override, ModOp::Add, ModOp::Multiply]);
        assert_eq!(config.default_stacking, Stacking::Independent);

        assert!(ConfigLoader::parse("ticks_per_second = 0").is_err());
        assert!(ConfigLoader::parse("max_effects_per_agent = 100000").is_err());
        assert!(ConfigLoader::parse(r#"modifier_order = ["Add", "Add", "Multiply"]"#).is_err());
    }
}
