//! Shared type definitions for the Takeoff simulation.
//!
//! Every crate in the workspace depends on this one. It holds data only:
//!
//! - [`ids`] -- Type-safe identifiers ([`AgentId`]).
//! - [`enums`] -- Lifecycle, deployment, severity, event, and outcome enums.
//! - [`structs`] -- [`Agent`], [`Event`], and the shared [`WorldState`].

pub mod enums;
pub mod ids;
pub mod structs;

pub use enums::{DeploymentType, EventType, LifecycleState, Outcome, Severity};
pub use ids::AgentId;
pub use structs::{
    Agent, AggregateMetrics, CapabilityProfile, CyberDefense, DefenderCapabilities, Event,
    OutcomeStreaks, OutcomeVerdict, PolicyInputs, RESENTMENT_PENALTY_WEIGHT, SocietalScalars,
    StateCounts, TickSignals, WorldState,
};
