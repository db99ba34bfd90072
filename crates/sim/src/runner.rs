//! Plays a [`Scenario`] against a fresh [`World`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use abilities_content::{ContentCatalog, Scenario, ScenarioAction};
use abilities_core::{
    AgentId, ComponentSnapshot, CueEvent, CueRecorder, EffectHandle, EngineConfig, HitData,
    HostRequest, Location, TagContainer, Tick, World,
};
use anyhow::{Context, Result};
use serde::Serialize;

/// What a single step did.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Result of an input event or direct activation.
    Input { outcome: String },
    Confirmed,
    Cancelled,
    Applied { handle: EffectHandle },
    Removed { count: usize },
    Despawned,
    /// The engine refused the request.
    Rejected { reason: String },
    /// The request did nothing (stale agent, nothing to confirm or cancel).
    Ignored,
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOutcome::Input { outcome } => write!(f, "{outcome}"),
            StepOutcome::Confirmed => write!(f, "confirmed"),
            StepOutcome::Cancelled => write!(f, "cancelled"),
            StepOutcome::Applied { handle } => write!(f, "applied {handle}"),
            StepOutcome::Removed { count } => write!(f, "removed {count}"),
            StepOutcome::Despawned => write!(f, "despawned"),
            StepOutcome::Rejected { reason } => write!(f, "rejected: {reason}"),
            StepOutcome::Ignored => write!(f, "ignored"),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct StepRecord {
    pub index: usize,
    pub at: Tick,
    pub action: ScenarioAction,
    pub outcome: StepOutcome,
}

/// Everything a run produced, in a form that serializes to JSON.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub scenario: String,
    pub ended_at: Tick,
    pub agents: BTreeMap<String, AgentId>,
    pub steps: Vec<StepRecord>,
    pub cues: Vec<CueEvent>,
    pub host_requests: Vec<HostRequest>,
    /// Final state of every agent still alive at the end of the run.
    pub snapshots: BTreeMap<String, ComponentSnapshot>,
}

impl RunReport {
    /// Scenario name of an agent id, if it was spawned by this run.
    pub fn agent_name(&self, agent: AgentId) -> Option<&str> {
        self.agents
            .iter()
            .find(|(_, id)| **id == agent)
            .map(|(name, _)| name.as_str())
    }

    pub fn snapshot(&self, agent: &str) -> Option<&ComponentSnapshot> {
        self.snapshots.get(agent)
    }
}

pub struct ScenarioRunner<'a> {
    catalog: &'a ContentCatalog,
    world: World,
    cues: Arc<CueRecorder>,
    agents: BTreeMap<String, AgentId>,
}

impl<'a> ScenarioRunner<'a> {
    pub fn new(catalog: &'a ContentCatalog, config: EngineConfig) -> Result<Self> {
        let mut world = World::new(config).context("Invalid engine config")?;
        let cues = CueRecorder::new();
        world.subscribe(cues.clone());
        Ok(Self {
            catalog,
            world,
            cues,
            agents: BTreeMap::new(),
        })
    }

    /// Spawns the scenario's agents, performs each step at its time and lets
    /// the clock run through the settle period.
    pub fn run(mut self, scenario: &Scenario) -> Result<RunReport> {
        scenario
            .validate()
            .with_context(|| format!("Scenario '{}' is invalid", scenario.name))?;

        for agent in &scenario.agents {
            let setup = self
                .catalog
                .agent_setup(&agent.template)
                .with_context(|| format!("Failed to spawn agent '{}'", agent.name))?;
            let id = self
                .world
                .try_spawn(setup)
                .with_context(|| format!("Failed to spawn agent '{}'", agent.name))?;
            tracing::debug!(agent = %agent.name, template = %agent.template, ?id, "spawned");
            self.agents.insert(agent.name.clone(), id);
        }

        let mut steps = Vec::with_capacity(scenario.steps.len());
        for (index, step) in scenario.steps.iter().enumerate() {
            let at = self.tick_at(step.at);
            self.world.advance_to(at);
            let outcome = self
                .perform(&step.action)
                .with_context(|| format!("Step {} failed", index))?;
            tracing::info!(index, %at, %outcome, "step");
            steps.push(StepRecord {
                index,
                at,
                action: step.action.clone(),
                outcome,
            });
        }

        let end = self.tick_at(scenario.end_seconds());
        self.world.advance_to(end);
        tracing::info!(
            scenario = %scenario.name,
            %end,
            cues = self.cues.events().len(),
            "scenario finished"
        );

        let snapshots = self
            .agents
            .iter()
            .filter_map(|(name, id)| Some((name.clone(), self.world.snapshot(*id)?)))
            .collect();

        Ok(RunReport {
            scenario: scenario.name.clone(),
            ended_at: self.world.now(),
            host_requests: self.world.take_host_requests(),
            cues: self.cues.events(),
            agents: self.agents,
            steps,
            snapshots,
        })
    }

    fn tick_at(&self, seconds: f32) -> Tick {
        Tick(self.world.config().ticks_for_seconds(seconds))
    }

    fn agent(&self, name: &str) -> Result<AgentId> {
        self.agents
            .get(name)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("Unknown agent '{}'", name))
    }

    fn perform(&mut self, action: &ScenarioAction) -> Result<StepOutcome> {
        let outcome = match action {
            ScenarioAction::Press { agent, input } => {
                let agent = self.agent(agent)?;
                let outcome = self.world.input_pressed(agent, input);
                StepOutcome::Input {
                    outcome: outcome.to_string(),
                }
            }
            ScenarioAction::Release { agent, input } => {
                let agent = self.agent(agent)?;
                let outcome = self.world.input_released(agent, input);
                StepOutcome::Input {
                    outcome: outcome.to_string(),
                }
            }
            ScenarioAction::Activate { agent, ability } => {
                let agent = self.agent(agent)?;
                let Some(id) = self.world.ability_by_tag(agent, ability) else {
                    return Ok(StepOutcome::Ignored);
                };
                match self.world.try_activate_ability(agent, id) {
                    Ok(outcome) => StepOutcome::Input {
                        outcome: outcome.to_string(),
                    },
                    Err(err) => StepOutcome::Rejected {
                        reason: err.to_string(),
                    },
                }
            }
            ScenarioAction::Confirm {
                agent,
                ability,
                target,
            } => {
                let agent = self.agent(agent)?;
                let hit = match target {
                    Some(target) => Some(HitData::agent(self.agent(target)?, Location::ORIGIN)),
                    None => None,
                };
                let Some(id) = self.world.ability_by_tag(agent, ability) else {
                    return Ok(StepOutcome::Ignored);
                };
                if self.world.confirm(agent, id, hit) {
                    StepOutcome::Confirmed
                } else {
                    StepOutcome::Ignored
                }
            }
            ScenarioAction::Cancel { agent, ability } => {
                let agent = self.agent(agent)?;
                let Some(id) = self.world.ability_by_tag(agent, ability) else {
                    return Ok(StepOutcome::Ignored);
                };
                if self.world.cancel_ability(agent, id) {
                    StepOutcome::Cancelled
                } else {
                    StepOutcome::Ignored
                }
            }
            ScenarioAction::ApplyEffect {
                source,
                target,
                effect,
            } => {
                let spec = self
                    .catalog
                    .effect(effect)
                    .ok_or_else(|| anyhow::anyhow!("Unknown effect '{}'", effect))?;
                let target = self.agent(target)?;
                let context = self
                    .world
                    .make_context(self.agent(source)?, Some(target), None, None);
                match self.world.try_apply_effect_to_target(spec, context, None) {
                    Ok(handle) => StepOutcome::Applied { handle },
                    Err(err) => StepOutcome::Rejected {
                        reason: err.to_string(),
                    },
                }
            }
            ScenarioAction::RemoveEffectsWithTag { agent, tag } => {
                let agent = self.agent(agent)?;
                let query: TagContainer = std::iter::once(tag.clone()).collect();
                let count = self.world.remove_effects_with_tags(agent, &query);
                StepOutcome::Removed { count }
            }
            ScenarioAction::Despawn { agent } => {
                let agent = self.agent(agent)?;
                if self.world.despawn(agent) {
                    StepOutcome::Despawned
                } else {
                    StepOutcome::Ignored
                }
            }
        };
        Ok(outcome)
    }
}
