//! List scenarios and content

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use console::style;

use super::Content;
use crate::config::SimConfig;

/// List available scenarios, templates, abilities and effects
#[derive(Parser)]
pub struct List {
    /// Content directory (defaults to the embedded content)
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Also list every ability and effect
    #[arg(short, long)]
    all: bool,
}

impl List {
    pub fn execute(self, config: &SimConfig) -> Result<()> {
        let content = Content::load(self.data_dir, config)?;

        println!("{} {}", style("Content:").bold(), content.source());
        println!();

        println!("{}", style("Scenarios").cyan().bold());
        let scenarios = content.scenario_names()?;
        if scenarios.is_empty() {
            println!("  {}", style("(none)").dim());
        }
        for name in scenarios {
            println!("  {}", name);
        }

        println!("{}", style("Templates").cyan().bold());
        for name in content.catalog.template_names() {
            println!("  {}", name);
        }

        if self.all {
            println!("{}", style("Abilities").cyan().bold());
            for tag in content.catalog.ability_tags() {
                println!("  {}", tag);
            }

            println!("{}", style("Effects").cyan().bold());
            for name in content.catalog.effect_names() {
                println!("  {}", name);
            }
        }

        Ok(())
    }
}
