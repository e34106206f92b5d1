//! The phase contract and the per-tick context phases share.
//!
//! A phase is a named, independently testable update stage. The
//! orchestrator runs every registered phase once per tick in ascending
//! `order`, lending each the world state, the run's generator, and a
//! [`TickContext`] that is cleared at the start of every tick.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use takeoff_agents::{AgentError, SimRng};
use takeoff_types::{Event, WorldState};

/// Well-known [`TickContext`] keys written by the built-in phases.
pub mod keys {
    /// Frontier capability after this tick's growth.
    pub const FRONTIER_CAPABILITY: &str = "frontier.capability";
    /// Agents created this tick.
    pub const CREATED: &str = "lifecycle.created";
    /// Agents retired by hazard this tick.
    pub const RETIRED: &str = "lifecycle.retired";
    /// Retired agents purged this tick.
    pub const PURGED: &str = "lifecycle.purged";
    /// Whether creation was throttled by the population cap.
    pub const CAP_REACHED: &str = "lifecycle.cap_reached";
    /// Successful breaches this tick.
    pub const BREACHES: &str = "security.breaches";
    /// Security spread multiplier used this tick.
    pub const SPREAD_MULTIPLIER: &str = "security.spread_multiplier";
    /// Breach probability used this tick.
    pub const BREACH_PROBABILITY: &str = "security.breach_probability";
    /// True-positive detections this tick.
    pub const DETECTIONS: &str = "detection.detected";
    /// False-positive flags this tick.
    pub const FALSE_POSITIVES: &str = "detection.false_positives";
    /// Removal actions that changed something this tick.
    pub const REMOVALS: &str = "detection.removals";
}

// ---------------------------------------------------------------------------
// TickContext
// ---------------------------------------------------------------------------

/// A value stored in the tick context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContextValue {
    /// A flag.
    Bool(bool),
    /// A number. Counters are stored as whole numbers.
    Number(f64),
    /// Free text.
    Text(String),
}

/// Tick-scoped key/value map for signalling between phases.
///
/// Keys are ordered so that iteration, and anything serialized from it,
/// is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickContext {
    values: BTreeMap<String, ContextValue>,
}

impl TickContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Store a value, replacing any previous value under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: ContextValue) {
        self.values.insert(key.into(), value);
    }

    /// Store a number.
    pub fn set_number(&mut self, key: impl Into<String>, value: f64) {
        self.insert(key, ContextValue::Number(value));
    }

    /// Store a counter.
    pub fn set_count(&mut self, key: impl Into<String>, value: u32) {
        self.insert(key, ContextValue::Number(f64::from(value)));
    }

    /// Store a flag.
    pub fn set_flag(&mut self, key: impl Into<String>, value: bool) {
        self.insert(key, ContextValue::Bool(value));
    }

    /// Raw lookup.
    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.values.get(key)
    }

    /// Numeric lookup. `None` if absent or not a number.
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.values.get(key) {
            Some(ContextValue::Number(n)) => Some(*n),
            Some(ContextValue::Bool(_) | ContextValue::Text(_)) | None => None,
        }
    }

    /// Counter lookup; absent, negative, or non-numeric entries read as zero.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn count(&self, key: &str) -> u32 {
        self.number(key)
            .filter(|n| n.is_finite() && *n >= 0.0)
            .map_or(0, |n| n.min(f64::from(u32::MAX)) as u32)
    }

    /// Flag lookup; absent or non-boolean entries read as `false`.
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.values.get(key), Some(ContextValue::Bool(true)))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the context is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContextValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Immutable identity of a phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseDescriptor {
    /// Unique id, e.g. `"population-lifecycle"`.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Sort key; lower runs first.
    pub order: f64,
}

impl PhaseDescriptor {
    /// Create a descriptor.
    pub fn new(id: impl Into<String>, name: impl Into<String>, order: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            order,
        }
    }
}

/// What a phase produced during one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseOutput {
    /// Events emitted, in emission order.
    pub events: Vec<Event>,
}

impl PhaseOutput {
    /// An output with no events.
    pub const fn empty() -> Self {
        Self { events: Vec::new() }
    }

    /// An output carrying `events`.
    pub const fn from_events(events: Vec<Event>) -> Self {
        Self { events }
    }
}

/// Errors a phase can return from [`Phase::execute`].
///
/// The orchestrator logs these and moves on to the next phase.
#[derive(Debug, thiserror::Error)]
pub enum PhaseError {
    /// The world state is inconsistent in a way the phase cannot repair.
    #[error("invalid world state: {reason}")]
    InvalidState {
        /// What was wrong.
        reason: String,
    },

    /// An agent model failed.
    #[error("agent error: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: AgentError,
    },
}

/// An independently testable update stage of the tick pipeline.
///
/// Phases take `&self` and keep no references into the world across
/// ticks; everything they need between ticks lives in [`WorldState`].
pub trait Phase: Send {
    /// The phase's identity and sort key.
    fn descriptor(&self) -> &PhaseDescriptor;

    /// Advance the world by one tick.
    fn execute(
        &self,
        state: &mut WorldState,
        rng: &mut SimRng,
        context: &mut TickContext,
    ) -> Result<PhaseOutput, PhaseError>;
}
