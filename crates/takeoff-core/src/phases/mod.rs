//! The built-in phases, in default execution order.
//!
//! | Order | Phase |
//! |------:|-------|
//! | 10 | [`CapabilityFrontierPhase`] |
//! | 20 | [`PopulationLifecyclePhase`] |
//! | 30 | [`DetectionPhase`] |
//! | 40 | [`MetricsPhase`] |
//! | 50 | [`OutcomePhase`] |

pub mod detection;
pub mod frontier;
pub mod lifecycle;
pub mod metrics;
pub mod outcome;

pub use detection::DetectionPhase;
pub use frontier::{CapabilityFrontierPhase, FrontierConfig};
pub use lifecycle::PopulationLifecyclePhase;
pub use metrics::MetricsPhase;
pub use outcome::OutcomePhase;

/// Default order keys for the built-in phases.
pub mod order {
    /// [`super::CapabilityFrontierPhase`].
    pub const FRONTIER: f64 = 10.0;
    /// [`super::PopulationLifecyclePhase`].
    pub const LIFECYCLE: f64 = 20.0;
    /// [`super::DetectionPhase`].
    pub const DETECTION: f64 = 30.0;
    /// [`super::MetricsPhase`].
    pub const METRICS: f64 = 40.0;
    /// [`super::OutcomePhase`].
    pub const OUTCOME: f64 = 50.0;
}
