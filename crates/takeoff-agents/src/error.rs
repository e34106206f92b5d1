//! Error types for the takeoff-agents crate.
//!
//! Stochastic failures (a detection that misses, a breach that does not
//! happen) are ordinary branches, not errors. Errors here are reserved for
//! bad configuration and for lookups that name an unknown agent.

use takeoff_types::AgentId;

/// Errors that can occur during population, security, or detection work.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// A configuration value is out of its permitted range.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the offending value.
        reason: String,
    },

    /// Agent with the given ID was not found in the population.
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),
}
