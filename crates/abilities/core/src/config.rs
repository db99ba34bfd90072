use crate::attributes::{InvalidModifierOrder, ModifierOrder};
use crate::effects::Stacking;

/// Engine configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Number of simulation ticks per authored second. Effect durations and
    /// periods are authored in seconds and converted with this rate.
    pub ticks_per_second: u32,
    /// Order in which live modifiers are folded into an attribute.
    pub modifier_order: ModifierOrder,
    /// Stacking policy used by specs that do not name one.
    pub default_stacking: Stacking,
    /// Upper bound on live effects per agent.
    pub max_effects_per_agent: usize,
    /// Upper bound on lifecycle callbacks dispatched by one world operation.
    pub max_callback_chain: usize,
}

impl EngineConfig {
    // ===== compile-time limits =====
    /// Hard cap on `max_effects_per_agent`.
    pub const MAX_EFFECTS_PER_AGENT: usize = 1024;
    /// Hard cap on `max_callback_chain`.
    pub const MAX_CALLBACK_CHAIN: usize = 4096;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_TICKS_PER_SECOND: u32 = 1000;
    pub const DEFAULT_MAX_EFFECTS_PER_AGENT: usize = 64;
    pub const DEFAULT_MAX_CALLBACK_CHAIN: usize = 256;

    pub fn new() -> Self {
        Self {
            ticks_per_second: Self::DEFAULT_TICKS_PER_SECOND,
            modifier_order: ModifierOrder::DEFAULT,
            default_stacking: Stacking::Refresh,
            max_effects_per_agent: Self::DEFAULT_MAX_EFFECTS_PER_AGENT,
            max_callback_chain: Self::DEFAULT_MAX_CALLBACK_CHAIN,
        }
    }

    pub fn with_ticks_per_second(mut self, ticks_per_second: u32) -> Self {
        self.ticks_per_second = ticks_per_second;
        self
    }

    pub fn with_modifier_order(mut self, order: ModifierOrder) -> Self {
        self.modifier_order = order;
        self
    }

    /// Converts authored seconds into ticks, rounding to the nearest tick.
    ///
    /// Non-positive and non-finite durations map to zero.
    pub fn ticks_for_seconds(&self, seconds: f32) -> u64 {
        if !seconds.is_finite() || seconds <= 0.0 {
            return 0;
        }
        (f64::from(seconds) * f64::from(self.ticks_per_second)).round() as u64
    }

    /// Converts ticks back into seconds.
    pub fn seconds_for_ticks(&self, ticks: u64) -> f32 {
        (ticks as f64 / f64::from(self.ticks_per_second.max(1))) as f32
    }

    /// Rejects configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ticks_per_second == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        if self.max_effects_per_agent == 0
            || self.max_effects_per_agent > Self::MAX_EFFECTS_PER_AGENT
        {
            return Err(ConfigError::EffectLimit(self.max_effects_per_agent));
        }
        if self.max_callback_chain == 0 || self.max_callback_chain > Self::MAX_CALLBACK_CHAIN {
            return Err(ConfigError::CallbackChain(self.max_callback_chain));
        }
        ModifierOrder::new(self.modifier_order.ops())?;
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Invalid engine configuration.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("ticks_per_second must be positive")]
    ZeroTickRate,

    #[error("max_effects_per_agent must be in 1..={max} (got {0})", max = EngineConfig::MAX_EFFECTS_PER_AGENT)]
    EffectLimit(usize),

    #[error("max_callback_chain must be in 1..={max} (got {0})", max = EngineConfig::MAX_CALLBACK_CHAIN)]
    CallbackChain(usize),

    #[error(transparent)]
    ModifierOrder(#[from] InvalidModifierOrder),
}

impl crate::error::GameError for ConfigError {
    fn severity(&self) -> crate::error::ErrorSeverity {
        crate::error::ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            ConfigError::ZeroTickRate => "CONFIG_ZERO_TICK_RATE",
            ConfigError::EffectLimit(_) => "CONFIG_EFFECT_LIMIT",
            ConfigError::CallbackChain(_) => "CONFIG_CALLBACK_CHAIN",
            ConfigError::ModifierOrder(_) => "CONFIG_INVALID_MODIFIER_ORDER",
        }
    }
}
