//! Terminal rendering of a [`RunReport`].

use abilities_content::ScenarioAction;
use abilities_core::{AgentId, ComponentSnapshot, CueEvent, CueKind, EngineConfig, Tick};
use console::style;

use crate::runner::{RunReport, StepOutcome, StepRecord};

enum Entry<'a> {
    Step(&'a StepRecord),
    Cue(&'a CueEvent),
}

impl Entry<'_> {
    fn at(&self) -> Tick {
        match self {
            Entry::Step(step) => step.at,
            Entry::Cue(cue) => cue.params.at,
        }
    }
}

/// Prints the step and cue timeline followed by the final agent states.
pub fn print_report(report: &RunReport, config: &EngineConfig, show_cues: bool) {
    println!(
        "{} {}",
        style("Scenario").bold(),
        style(&report.scenario).cyan().bold()
    );
    println!();

    let mut timeline: Vec<Entry> = report.steps.iter().map(Entry::Step).collect();
    if show_cues {
        timeline.extend(report.cues.iter().map(Entry::Cue));
    }
    // Stable: a step comes before the cues it caused.
    timeline.sort_by_key(Entry::at);

    for entry in &timeline {
        let at = format!("[{:>8.3}s]", config.seconds_for_ticks(entry.at().0));
        match entry {
            Entry::Step(step) => println!(
                "{} {} {}  {}",
                style(at).dim(),
                style(format!("#{}", step.index)).bold(),
                describe_action(&step.action),
                style_outcome(&step.outcome)
            ),
            Entry::Cue(cue) => println!("{}   {}", style(at).dim(), describe_cue(report, cue)),
        }
    }

    for request in &report.host_requests {
        println!("{} {:?}", style("host").magenta(), request);
    }

    println!();
    println!(
        "{} at {:.3}s",
        style("Final state").bold(),
        config.seconds_for_ticks(report.ended_at.0)
    );
    for (name, snapshot) in &report.snapshots {
        print_snapshot(name, snapshot, config);
    }
    for name in report.agents.keys() {
        if report.snapshot(name).is_none() {
            println!("  {} {}", style(name).bold(), style("(despawned)").dim());
        }
    }
}

fn describe_action(action: &ScenarioAction) -> String {
    match action {
        ScenarioAction::Press { agent, input } => format!("{agent} presses {input}"),
        ScenarioAction::Release { agent, input } => format!("{agent} releases {input}"),
        ScenarioAction::Activate { agent, ability } => format!("{agent} activates {ability}"),
        ScenarioAction::Confirm {
            agent,
            ability,
            target,
        } => match target {
            Some(target) => format!("{agent} confirms {ability} on {target}"),
            None => format!("{agent} confirms {ability}"),
        },
        ScenarioAction::Cancel { agent, ability } => format!("{agent} cancels {ability}"),
        ScenarioAction::ApplyEffect {
            source,
            target,
            effect,
        } => format!("{source} applies {effect} to {target}"),
        ScenarioAction::RemoveEffectsWithTag { agent, tag } => {
            format!("{agent} loses effects tagged {tag}")
        }
        ScenarioAction::Despawn { agent } => format!("{agent} despawns"),
    }
}

fn style_outcome(outcome: &StepOutcome) -> String {
    let text = format!("-> {outcome}");
    match outcome {
        StepOutcome::Rejected { .. } => style(text).red().to_string(),
        StepOutcome::Ignored => style(text).yellow().to_string(),
        StepOutcome::Input { outcome } if outcome == "ignored" => style(text).yellow().to_string(),
        _ => style(text).green().to_string(),
    }
}

fn describe_cue(report: &RunReport, cue: &CueEvent) -> String {
    let name = |agent: Option<AgentId>| {
        agent
            .and_then(|agent| report.agent_name(agent))
            .unwrap_or("?")
    };
    let kind = match cue.kind {
        CueKind::Applied => style("applied ").blue(),
        CueKind::Executed => style("executed").green(),
        CueKind::Removed => style("removed ").yellow(),
        CueKind::Expired => style("expired ").dim(),
    };
    let changes: Vec<String> = cue
        .params
        .modified
        .iter()
        .map(|change| format!("{} {:+.1}", change.attribute, change.delta()))
        .collect();
    let mut line = format!(
        "{} {} {} -> {}",
        kind,
        style(&cue.params.effect).bold(),
        name(cue.params.instigator),
        name(cue.params.target)
    );
    if !changes.is_empty() {
        line.push_str(&format!("  ({})", changes.join(", ")));
    }
    line
}

fn print_snapshot(name: &str, snapshot: &ComponentSnapshot, config: &EngineConfig) {
    println!("  {}", style(name).bold());

    let attributes: Vec<String> = snapshot
        .attributes
        .iter()
        .map(|(id, value)| format!("{id} {value:.1}"))
        .collect();
    println!("    attributes: {}", attributes.join("  "));

    let tags: Vec<String> = snapshot.tags.iter().map(ToString::to_string).collect();
    if !tags.is_empty() {
        println!("    tags: {}", tags.join(", "));
    }

    for effect in &snapshot.effects {
        let remaining = match effect.remaining {
            Some(ticks) => format!("{:.2}s left", config.seconds_for_ticks(ticks)),
            None => "until removed".to_string(),
        };
        println!(
            "    effect {} ({}, {} executions)",
            style(&effect.name).cyan(),
            remaining,
            effect.executions
        );
    }

    for ability in &snapshot.abilities {
        let cooldown = ability
            .cooldown_remaining
            .map(|ticks| format!(", cooldown {:.2}s", config.seconds_for_ticks(ticks)))
            .unwrap_or_default();
        println!(
            "    ability {} {}{} (activated {}, finished {}, cancelled {})",
            ability.tag,
            ability.state,
            cooldown,
            ability.counters.activation_started,
            ability.counters.finished,
            ability.counters.cancelled
        );
    }
}
