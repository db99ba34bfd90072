use std::fmt;

slotmap::new_key_type! {
    /// Generation-tagged reference to an agent owned by the [`World`](crate::world::World).
    ///
    /// Holding an `AgentId` never keeps the agent alive; lookups fail cleanly
    /// once the agent has been despawned, even if its slot is reused.
    pub struct AgentId;
}

/// Discrete simulation time.
///
/// The engine never assumes a wall-clock unit; `EngineConfig::ticks_per_second`
/// converts authored seconds into ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Self = Self(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Ticks elapsed since `earlier`, zero if `earlier` is in the future.
    pub fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0.saturating_add(rhs))
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Opaque reference to the object that caused an effect (projectile, item, ability).
///
/// Supplied by the host; the engine only carries it through contexts and cues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CauserId(pub u64);

/// World-space location reported by the host's trace/physics layer.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Location {
    pub const ORIGIN: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Hit information attached to an effect context or an ability confirmation.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HitData {
    pub location: Location,
    /// Agent that was hit, if the trace resolved to one.
    pub agent: Option<AgentId>,
}

impl HitData {
    pub fn at(location: Location) -> Self {
        Self {
            location,
            agent: None,
        }
    }

    pub fn agent(agent: AgentId, location: Location) -> Self {
        Self {
            location,
            agent: Some(agent),
        }
    }
}
