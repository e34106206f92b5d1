//! Phase pipeline, outcome classification, and run loop for Takeoff.
//!
//! This crate owns the tick: an ordered pipeline of independent phases
//! that advance a shared [`takeoff_types::WorldState`] once per month.
//!
//! # Modules
//!
//! - [`phase`] -- The [`Phase`] contract and the per-tick [`TickContext`].
//! - [`orchestrator`] -- Registration, ordering, and failure-isolated
//!   execution ([`PhaseOrchestrator`]).
//! - [`phases`] -- The five built-in phases.
//! - [`metrics`] -- Aggregate metrics and effective control.
//! - [`outcome`] -- The pure outcome classifier.
//! - [`config`] -- Loading `takeoff-config.yaml` ([`SimulationConfig`]).
//! - [`pipeline`] -- Wiring config into phases and the initial world.
//! - [`runner`] -- The bounded run loop ([`run_simulation`]).
//!
//! [`Phase`]: phase::Phase
//! [`TickContext`]: phase::TickContext
//! [`PhaseOrchestrator`]: orchestrator::PhaseOrchestrator
//! [`SimulationConfig`]: config::SimulationConfig
//! [`run_simulation`]: runner::run_simulation

pub mod config;
pub mod metrics;
pub mod orchestrator;
pub mod outcome;
pub mod phase;
pub mod phases;
pub mod pipeline;
pub mod runner;

pub use config::{ConfigError, SimulationConfig};
pub use orchestrator::{OrchestratorError, PhaseFailure, PhaseOrchestrator, TickReport};
pub use outcome::{OutcomeConfig, OutcomeInputs, classify};
pub use phase::{ContextValue, Phase, PhaseDescriptor, PhaseError, PhaseOutput, TickContext};
pub use pipeline::{build_pipeline, initial_world};
pub use runner::{
    NoOpCallback, RunnerError, SimulationEndReason, SimulationResult, TickCallback,
    log_simulation_end, run_simulation,
};
