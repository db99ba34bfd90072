//! Scripted encounters: named agents spawned from templates plus a timeline
//! of inputs and effect applications.

use abilities_core::Tag;

/// An agent taking part in a scenario.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScenarioAgent {
    pub name: String,
    pub template: String,
}

/// Something the script does at a point in time.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScenarioAction {
    Press { agent: String, input: Tag },
    Release { agent: String, input: Tag },
    Activate { agent: String, ability: Tag },
    /// Confirms a waiting activation, optionally aimed at another agent.
    Confirm {
        agent: String,
        ability: Tag,
        #[cfg_attr(feature = "serde", serde(default))]
        target: Option<String>,
    },
    Cancel { agent: String, ability: Tag },
    ApplyEffect {
        source: String,
        target: String,
        effect: String,
    },
    RemoveEffectsWithTag { agent: String, tag: Tag },
    Despawn { agent: String },
}

impl ScenarioAction {
    /// Every agent name the action refers to.
    pub fn agents(&self) -> Vec<&str> {
        match self {
            ScenarioAction::Press { agent, .. }
            | ScenarioAction::Release { agent, .. }
            | ScenarioAction::Activate { agent, .. }
            | ScenarioAction::Cancel { agent, .. }
            | ScenarioAction::RemoveEffectsWithTag { agent, .. }
            | ScenarioAction::Despawn { agent } => vec![agent.as_str()],
            ScenarioAction::Confirm { agent, target, .. } => {
                std::iter::once(agent.as_str()).chain(target.as_deref()).collect()
            }
            ScenarioAction::ApplyEffect { source, target, .. } => {
                vec![source.as_str(), target.as_str()]
            }
        }
    }
}

/// An action and the time, in seconds, at which it happens.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScenarioStep {
    pub at: f32,
    pub action: ScenarioAction,
}

/// A complete scripted encounter.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Scenario {
    pub name: String,
    pub agents: Vec<ScenarioAgent>,
    pub steps: Vec<ScenarioStep>,
    /// Keeps the clock running after the last step so timers can play out.
    #[cfg_attr(feature = "serde", serde(default))]
    pub settle: f32,
}

impl Scenario {
    /// Time of the last step plus the settle period.
    pub fn end_seconds(&self) -> f32 {
        let last = self.steps.iter().map(|step| step.at).fold(0.0, f32::max);
        last + self.settle.max(0.0)
    }

    /// Checks ordering and agent references.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        for (index, agent) in self.agents.iter().enumerate() {
            if self.agents[..index].iter().any(|other| other.name == agent.name) {
                return Err(ScenarioError::DuplicateAgent(agent.name.clone()));
            }
        }
        let mut previous = 0.0;
        for (index, step) in self.steps.iter().enumerate() {
            if !step.at.is_finite() || step.at < previous {
                return Err(ScenarioError::OutOfOrder { index, at: step.at });
            }
            previous = step.at;
            if let Some(unknown) = step
                .action
                .agents()
                .into_iter()
                .find(|name| !self.agents.iter().any(|agent| agent.name == *name))
            {
                return Err(ScenarioError::UnknownAgent {
                    index,
                    agent: unknown.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// A scenario that cannot be run as written.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ScenarioError {
    #[error("agent '{0}' is declared twice")]
    DuplicateAgent(String),

    #[error("step {index} at {at}s is earlier than the step before it")]
    OutOfOrder { index: usize, at: f32 },

    #[error("step {index} refers to undeclared agent '{agent}'")]
    UnknownAgent { index: usize, agent: String },
}
