use super::{EffectError, Magnitude, MagnitudeContext};
use crate::attributes::{AttributeId, ModOp, Modifier};
use crate::config::EngineConfig;
use crate::cues::Delivery;
use crate::tags::{Tag, TagContainer};

/// Lifetime class of an effect.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EffectKind {
    /// Executes once on application and is retired immediately.
    Instant,
    /// Lives for `duration`. A non-positive duration behaves like `Instant`.
    Duration,
    /// Lives until removed.
    Infinite,
    /// Executes every `period`, for `duration` if positive, otherwise until removed.
    Periodic,
}

/// What happens when a spec is applied again by the same instigator while a
/// previous application is still live.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Stacking {
    /// Keep the live instance, reset its timers and re-run its application.
    #[default]
    Refresh,
    /// Remove the live instance, then apply a new one.
    Replace,
    /// Every application is its own instance.
    Independent,
}

/// One authored modifier: the magnitude is evaluated when the effect applies
/// (live modifiers) or executes (instant and periodic effects).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModifierSpec {
    pub attribute: AttributeId,
    pub op: ModOp,
    pub magnitude: Magnitude,
}

impl ModifierSpec {
    pub fn new(attribute: impl Into<AttributeId>, op: ModOp, magnitude: impl Into<Magnitude>) -> Self {
        Self {
            attribute: attribute.into(),
            op,
            magnitude: magnitude.into(),
        }
    }

    pub fn evaluate(&self, ctx: &MagnitudeContext<'_>) -> Result<Modifier, EffectError> {
        Ok(Modifier::new(
            self.attribute.clone(),
            self.op,
            self.magnitude.evaluate(ctx)?,
        ))
    }
}

/// Immutable effect template, shared behind an `Arc`.
///
/// The name is the spec's identity for stacking.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectSpec {
    pub name: String,
    pub kind: EffectKind,
    /// Seconds.
    #[cfg_attr(feature = "serde", serde(default))]
    pub duration: Magnitude,
    /// Seconds between executions. Zero disables periodic execution.
    #[cfg_attr(feature = "serde", serde(default))]
    pub period: Magnitude,
    #[cfg_attr(feature = "serde", serde(default))]
    pub modifiers: Vec<ModifierSpec>,
    /// Tags identifying the effect itself.
    #[cfg_attr(feature = "serde", serde(default))]
    pub owned_tags: TagContainer,
    /// Tags granted to the target while the effect is live.
    #[cfg_attr(feature = "serde", serde(default))]
    pub apply_tags: TagContainer,
    /// Live effects on the target whose tags match are removed on application.
    #[cfg_attr(feature = "serde", serde(default))]
    pub remove_effects_with_tags: TagContainer,
    /// `None` falls back to `EngineConfig::default_stacking`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub stacking: Option<Stacking>,
    /// Periodic effects execute once when applied.
    #[cfg_attr(feature = "serde", serde(default = "yes"))]
    pub execute_on_application: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cue_tag: Option<Tag>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub delivery: Delivery,
}

#[cfg(feature = "serde")]
fn yes() -> bool {
    true
}

impl EffectSpec {
    pub fn new(name: impl Into<String>, kind: EffectKind) -> Self {
        Self {
            name: name.into(),
            kind,
            duration: Magnitude::ZERO,
            period: Magnitude::ZERO,
            modifiers: Vec::new(),
            owned_tags: TagContainer::new(),
            apply_tags: TagContainer::new(),
            remove_effects_with_tags: TagContainer::new(),
            stacking: None,
            execute_on_application: true,
            cue_tag: None,
            delivery: Delivery::All,
        }
    }

    pub fn instant(name: impl Into<String>) -> Self {
        Self::new(name, EffectKind::Instant)
    }

    pub fn lasting(name: impl Into<String>, seconds: f32) -> Self {
        Self::new(name, EffectKind::Duration).with_duration(seconds)
    }

    pub fn infinite(name: impl Into<String>) -> Self {
        Self::new(name, EffectKind::Infinite)
    }

    pub fn periodic(name: impl Into<String>, seconds: f32, period: f32) -> Self {
        Self::new(name, EffectKind::Periodic)
            .with_duration(seconds)
            .with_period(period)
    }

    pub fn with_duration(mut self, duration: impl Into<Magnitude>) -> Self {
        self.duration = duration.into();
        self
    }

    pub fn with_period(mut self, period: impl Into<Magnitude>) -> Self {
        self.period = period.into();
        self
    }

    pub fn with_modifier(
        mut self,
        attribute: impl Into<AttributeId>,
        op: ModOp,
        magnitude: impl Into<Magnitude>,
    ) -> Self {
        self.modifiers.push(ModifierSpec::new(attribute, op, magnitude));
        self
    }

    pub fn with_owned_tag(mut self, tag: impl Into<Tag>) -> Self {
        self.owned_tags.insert(tag.into());
        self
    }

    pub fn with_apply_tag(mut self, tag: impl Into<Tag>) -> Self {
        self.apply_tags.insert(tag.into());
        self
    }

    pub fn removing_effects_with(mut self, tag: impl Into<Tag>) -> Self {
        self.remove_effects_with_tags.insert(tag.into());
        self
    }

    pub fn with_stacking(mut self, stacking: Stacking) -> Self {
        self.stacking = Some(stacking);
        self
    }

    pub fn with_cue(mut self, tag: impl Into<Tag>) -> Self {
        self.cue_tag = Some(tag.into());
        self
    }

    pub fn with_delivery(mut self, delivery: Delivery) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn skip_execution_on_application(mut self) -> Self {
        self.execute_on_application = false;
        self
    }

    pub fn stacking(&self, config: &EngineConfig) -> Stacking {
        self.stacking.unwrap_or(config.default_stacking)
    }

    /// Structural checks that do not depend on any agent.
    pub fn validate(&self) -> Result<(), EffectError> {
        if self.name.trim().is_empty() {
            return Err(EffectError::InvalidSpec("effect spec has no name".into()));
        }
        if self.kind == EffectKind::Periodic {
            if let Some(period) = self.period.as_constant() {
                if period <= 0.0 {
                    return Err(EffectError::InvalidSpec(format!(
                        "periodic effect '{}' needs a positive period",
                        self.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Every attribute the spec's modifiers write to.
    pub fn attributes(&self) -> impl Iterator<Item = &AttributeId> {
        self.modifiers.iter().map(|modifier| &modifier.attribute)
    }

    /// Resolves how an application of this spec lives, in ticks.
    pub fn timing(
        &self,
        ctx: &MagnitudeContext<'_>,
        config: &EngineConfig,
    ) -> Result<EffectTiming, EffectError> {
        let duration = config.ticks_for_seconds(self.duration.evaluate(ctx)?);
        let period = config.ticks_for_seconds(self.period.evaluate(ctx)?);
        let timing = match self.kind {
            EffectKind::Instant => EffectTiming::INSTANT,
            EffectKind::Duration if duration == 0 => EffectTiming::INSTANT,
            EffectKind::Duration => EffectTiming {
                duration: Some(duration),
                period: (period > 0).then_some(period),
                instant: false,
            },
            EffectKind::Infinite => EffectTiming {
                duration: None,
                period: (period > 0).then_some(period),
                instant: false,
            },
            EffectKind::Periodic if period == 0 => {
                return Err(EffectError::InvalidSpec(format!(
                    "periodic effect '{}' resolved to a zero period",
                    self.name
                )));
            }
            EffectKind::Periodic => EffectTiming {
                duration: (duration > 0).then_some(duration),
                period: Some(period),
                instant: false,
            },
        };
        Ok(timing)
    }
}

/// Resolved lifetime of one application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EffectTiming {
    /// Ticks until natural expiry. `None` lives until removed.
    pub duration: Option<u64>,
    /// Ticks between executions. `None` means modifiers are live instead.
    pub period: Option<u64>,
    pub instant: bool,
}

impl EffectTiming {
    pub const INSTANT: Self = Self {
        duration: None,
        period: None,
        instant: true,
    };

    /// Modifiers change base values on each execution.
    pub fn executes(&self) -> bool {
        self.instant || self.period.is_some()
    }
}
