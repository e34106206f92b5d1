//! Population dynamics, security arms race, and detection for Takeoff.
//!
//! This crate holds the stochastic models that operate on agents without
//! knowing anything about phases or orchestration. It sits between
//! `takeoff-types` (data) and `takeoff-core` (pipeline).
//!
//! # Modules
//!
//! - [`rng`] -- The single deterministic generator ([`SimRng`])
//! - [`guard`] -- Sanitizers for corrupt scalars
//! - [`config`] -- Tunable parameters ([`LifecycleConfig`], [`SecurityConfig`], [`DetectionConfig`])
//! - [`factory`] -- Sampling of new agents
//! - [`spread`] -- Per-tick copy-count dynamics
//! - [`retirement`] -- Retirement hazard
//! - [`lifecycle`] -- The population lifecycle manager ([`LifecycleManager`])
//! - [`security`] -- Attack/defense ratio, spread multiplier, breaches ([`SecurityModel`])
//! - [`detection`] -- Detection, false positives, and removal ([`DetectionModel`])
//! - [`error`] -- Error types ([`AgentError`])

pub mod config;
pub mod detection;
pub mod error;
pub mod factory;
pub mod guard;
pub mod lifecycle;
pub mod retirement;
pub mod rng;
pub mod security;
pub mod spread;

pub use config::{
    CreationConfig, DEFAULT_MISALIGNMENT_THRESHOLD, DeploymentMix, DetectionConfig,
    LifecycleConfig, MAX_SPREAD_COUNT, RetirementConfig, SecurityConfig, SpreadConfig,
};
pub use detection::{DetectionModel, DetectionReport, RemovalOutcome, RemovalReport};
pub use error::AgentError;
pub use factory::{AlignmentBucket, CreationContext};
pub use lifecycle::{LifecycleManager, LifecycleReport, count_states};
pub use rng::SimRng;
pub use security::{BreachReport, SecurityAssessment, SecurityModel};
