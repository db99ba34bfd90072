//! Play a scenario and print or save its report

use std::path::{Path, PathBuf};

use abilities_content::{Scenario, ScenarioLoader};
use anyhow::{Context, Result};
use clap::Parser;
use console::style;

use super::Content;
use crate::config::SimConfig;
use crate::report::print_report;
use crate::runner::{RunReport, ScenarioRunner, StepOutcome};

/// Run a scenario and print its timeline
#[derive(Parser)]
pub struct Run {
    /// Scenario name (embedded, or `scenarios/<NAME>.ron` under the data directory)
    #[arg(value_name = "NAME", required_unless_present = "file")]
    scenario: Option<String>,

    /// Scenario file to run instead of a named scenario
    #[arg(short, long, value_name = "FILE", conflicts_with = "scenario")]
    file: Option<PathBuf>,

    /// Content directory (defaults to the embedded content)
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "timeline")]
    format: OutputFormat,

    /// Hide effect cues from the timeline
    #[arg(long)]
    no_cues: bool,

    /// Write the JSON report to this file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Write the JSON report to the report directory
    #[arg(long, conflicts_with = "output")]
    save: bool,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// Step and cue timeline followed by the final agent states
    Timeline,
    /// Full JSON report
    Json,
    /// Nothing beyond the summary line
    Quiet,
}

impl Run {
    pub fn execute(self, config: &SimConfig) -> Result<()> {
        let content = Content::load(self.data_dir.clone(), config)?;
        let scenario = self.load_scenario(&content)?;

        tracing::info!(scenario = %scenario.name, source = %content.source(), "running scenario");
        let report = ScenarioRunner::new(&content.catalog, content.config.clone())?.run(&scenario)?;

        match self.format {
            OutputFormat::Timeline => print_report(&report, &content.config, !self.no_cues),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            OutputFormat::Quiet => {}
        }

        let destination = match (&self.output, self.save) {
            (Some(path), _) => Some(path.clone()),
            (None, true) => Some(config.report_dir.join(format!("{}.json", report.scenario))),
            (None, false) => None,
        };
        if let Some(path) = destination {
            write_report(&report, &path)?;
            eprintln!("{} {}", style("Report written to").green(), path.display());
        }

        let rejected = report
            .steps
            .iter()
            .filter(|step| matches!(step.outcome, StepOutcome::Rejected { .. }))
            .count();
        eprintln!(
            "{} {} steps, {} cues, {} rejected",
            style("Done:").bold(),
            report.steps.len(),
            report.cues.len(),
            rejected
        );
        Ok(())
    }

    fn load_scenario(&self, content: &Content) -> Result<Scenario> {
        match (&self.file, &self.scenario) {
            (Some(path), _) => ScenarioLoader::load(path),
            (None, Some(name)) => content.scenario(name),
            (None, None) => anyhow::bail!("Either a scenario name or --file is required"),
        }
    }
}

fn write_report(report: &RunReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report: {}", path.display()))
}
