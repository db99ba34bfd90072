//! Deterministic gameplay-effect and ability-activation engine.
//!
//! `abilities-core` owns the effect lifecycle (apply, execute, expire,
//! remove), the attribute-modification pipeline those effects drive, and the
//! per-agent ability activation state machine. All mutation happens on the
//! simulation thread and flows through [`world::World`], which routes
//! cross-agent operations, fires timers and dispatches lifecycle callbacks
//! back to the abilities that bound them.
pub mod abilities;
pub mod attributes;
pub mod common;
pub mod component;
pub mod config;
pub mod cues;
pub mod effects;
pub mod env;
pub mod error;
pub mod scheduler;
pub mod tags;
pub mod world;

pub use abilities::{
    AbilityContainer, AbilityCounters, AbilityDef, AbilityId, AbilityInstance, AbilitySet,
    AbilitySetEntry, AbilityState, AbilityTask, ActivationError, ConfirmPolicy, FollowUpEffect,
    FollowUpTarget, InputBehavior, InputOutcome, MontageRequest,
};
pub use attributes::{
    AttributeBounds, AttributeChange, AttributeDef, AttributeError, AttributeId, AttributeSet,
    AttributeSnapshot, AttributeValue, InvalidModifierOrder, ModOp, Modifier, ModifierOrder,
};
pub use common::{AgentId, CauserId, HitData, Location, Tick};
pub use component::{AbilitiesComponent, AbilitySummary, ComponentSnapshot};
pub use config::{ConfigError, EngineConfig};
pub use cues::{
    CueBroadcaster, CueEvent, CueKind, CueObserver, CueParams, CueRecorder, Delivery, ObserverId,
};
pub use effects::{
    ApplyRequest, AttributeBased, AttributeSource, CustomMagnitude, EffectCallbacks,
    EffectContainer, EffectContext, EffectError, EffectHandle, EffectId, EffectInstance,
    EffectKey, EffectKind, EffectSpec, EffectSummary, EffectTarget, EffectTiming, Magnitude,
    MagnitudeContext, ModifierSpec, Stacking,
};
pub use env::{AbilityHook, CallbackBinding, Env, HostRequest};
pub use error::{ErrorSeverity, GameError};
pub use scheduler::{Scheduler, TimerId, TimerQueue, TimerTask};
pub use tags::{Tag, TagContainer, TagCountContainer};
pub use world::{AgentSetup, World};
