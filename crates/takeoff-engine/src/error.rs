//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps every failure
//! mode during startup, the run itself, and summary output.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: takeoff_core::ConfigError,
    },

    /// The phase pipeline could not be assembled.
    #[error("pipeline error: {source}")]
    Pipeline {
        /// The underlying orchestrator error.
        #[from]
        source: takeoff_core::OrchestratorError,
    },

    /// Simulation runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: takeoff_core::RunnerError,
    },

    /// The end-of-run summary could not be serialized.
    #[error("summary error: {source}")]
    Summary {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}
