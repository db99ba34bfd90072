//! Validate content without running it

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;

use super::Content;
use crate::config::SimConfig;

/// Load, link and validate content and every scenario
#[derive(Parser)]
pub struct Check {
    /// Content directory (defaults to the embedded content)
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,
}

impl Check {
    pub fn execute(self, config: &SimConfig) -> Result<()> {
        let content = Content::load(self.data_dir, config)?;
        let catalog = &content.catalog;

        println!(
            "{} {} effects, {} abilities, {} sets, {} templates ({})",
            style("Catalog").bold(),
            catalog.effect_count(),
            catalog.ability_count(),
            catalog.set_count(),
            catalog.template_count(),
            content.source()
        );
        println!(
            "{} {} ticks/s, modifier order {:?}",
            style("Config").bold(),
            content.config.ticks_per_second,
            content.config.modifier_order
        );

        let names = content.scenario_names()?;
        for name in &names {
            check_scenario(&content, name)
                .with_context(|| format!("Scenario '{}' failed validation", name))?;
            println!("  {} {}", style("ok").green(), name);
        }

        println!("{} {} scenarios valid", style("Done:").bold(), names.len());
        Ok(())
    }
}

/// A scenario is valid when it parses, its timeline is ordered and every
/// agent it spawns has a template in the catalog.
fn check_scenario(content: &Content, name: &str) -> Result<()> {
    let scenario = content.scenario(name)?;
    scenario.validate()?;
    for agent in &scenario.agents {
        content
            .catalog
            .agent_setup(&agent.template)
            .with_context(|| format!("Agent '{}' cannot be spawned", agent.name))?;
    }
    Ok(())
}
