//! Closed enumerations shared by every crate in the workspace.
//!
//! Lifecycle and deployment are modelled as exhaustive enums so that every
//! transition site has to handle every variant; adding a state forces all
//! consumers to be revisited.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// LifecycleState
// ---------------------------------------------------------------------------

/// Where an agent sits in its lifecycle.
///
/// The legal path is `Training -> Testing -> {DeployedClosed | DeployedOpen}
/// -> Retired`. The only non-forward move is a breach that turns a
/// `DeployedClosed` system into `DeployedOpen`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Being trained; not yet evaluated.
    Training,
    /// Under pre-deployment evaluation.
    Testing,
    /// Deployed behind an access boundary (API, enterprise, lab).
    DeployedClosed,
    /// Weights are publicly available.
    DeployedOpen,
    /// Permanently out of service. Terminal.
    Retired,
}

impl LifecycleState {
    /// Whether the agent still counts toward the active population.
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Retired)
    }

    /// Whether the agent is in one of the two deployed states.
    pub const fn is_deployed(self) -> bool {
        matches!(self, Self::DeployedClosed | Self::DeployedOpen)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    ///
    /// Staying in the same state is always legal.
    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Training, Self::Training | Self::Testing | Self::Retired)
            | (
                Self::Testing,
                Self::Testing | Self::DeployedClosed | Self::DeployedOpen | Self::Retired,
            )
            | (Self::DeployedClosed, Self::DeployedClosed | Self::DeployedOpen | Self::Retired)
            | (Self::DeployedOpen, Self::DeployedOpen | Self::Retired)
            | (Self::Retired, Self::Retired) => true,
            (Self::Training, Self::DeployedClosed | Self::DeployedOpen)
            | (Self::Testing, Self::Training)
            | (Self::DeployedClosed, Self::Training | Self::Testing)
            | (Self::DeployedOpen, Self::Training | Self::Testing | Self::DeployedClosed)
            | (
                Self::Retired,
                Self::Training | Self::Testing | Self::DeployedClosed | Self::DeployedOpen,
            ) => false,
        }
    }
}

impl core::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Training => write!(f, "training"),
            Self::Testing => write!(f, "testing"),
            Self::DeployedClosed => write!(f, "deployed_closed"),
            Self::DeployedOpen => write!(f, "deployed_open"),
            Self::Retired => write!(f, "retired"),
        }
    }
}

// ---------------------------------------------------------------------------
// DeploymentType
// ---------------------------------------------------------------------------

/// How an agent is distributed. Governs spread dynamics and removability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DeploymentType {
    /// Proprietary, served behind an API.
    Closed,
    /// Weights published; copies cannot be recalled.
    OpenWeights,
    /// Licensed into enterprise installations.
    Enterprise,
    /// Lab-internal research system.
    Research,
}

impl core::fmt::Display for DeploymentType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::OpenWeights => write!(f, "open_weights"),
            Self::Enterprise => write!(f, "enterprise"),
            Self::Research => write!(f, "research"),
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// How serious an emitted event is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Routine bookkeeping.
    Info,
    /// Something a policy maker should notice.
    Warning,
    /// A loss of control or a subsystem failure.
    Critical,
}

/// A type of event emitted by a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventType {
    // --- Lifecycle ---
    /// A new agent entered training.
    AgentCreated,
    /// An agent finished training and entered evaluation.
    TestingStarted,
    /// An agent was deployed.
    AgentDeployed,
    /// An agent was retired from service.
    AgentRetired,
    /// Retired agents were dropped from memory.
    RetiredAgentsPurged,
    /// Creation was throttled by the population cap.
    PopulationCapReached,
    /// A state invariant was found broken and repaired.
    InvariantCorrected,

    // --- Security ---
    /// A closed system's weights leaked.
    SecurityBreach,

    // --- Detection ---
    /// A genuinely misaligned agent was flagged.
    MisalignmentDetected,
    /// An aligned agent was wrongly flagged.
    FalsePositiveFlag,
    /// A flagged agent was fully removed.
    AgentRemoved,
    /// A flagged enterprise deployment was partly rolled back.
    PartialRemoval,
    /// Distribution of a flagged open-weights agent was halted.
    DistributionHalted,

    // --- World ---
    /// The capability frontier crossed a whole-number milestone.
    CapabilityMilestone,
    /// The outcome verdict changed.
    OutcomeChanged,

    // --- System ---
    /// A phase returned an error and was skipped for this tick.
    PhaseFailed,
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Terminal classification of the whole world state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// No terminal condition holds yet.
    Active,
    /// Sustained flourishing under aligned systems.
    Utopia,
    /// Stable but oppressive control.
    Dystopia,
    /// Loss of humanity's future.
    Extinction,
}

impl Outcome {
    /// Whether this verdict ends the game.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }
}

impl core::fmt::Display for Outcome {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Utopia => write!(f, "utopia"),
            Self::Dystopia => write!(f, "dystopia"),
            Self::Extinction => write!(f, "extinction"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [LifecycleState; 5] = [
        LifecycleState::Training,
        LifecycleState::Testing,
        LifecycleState::DeployedClosed,
        LifecycleState::DeployedOpen,
        LifecycleState::Retired,
    ];

    #[test]
    fn forward_path_is_legal() {
        assert!(LifecycleState::Training.can_transition_to(LifecycleState::Testing));
        assert!(LifecycleState::Testing.can_transition_to(LifecycleState::DeployedClosed));
        assert!(LifecycleState::Testing.can_transition_to(LifecycleState::DeployedOpen));
        assert!(LifecycleState::DeployedOpen.can_transition_to(LifecycleState::Retired));
    }

    #[test]
    fn breach_is_the_only_sideways_move() {
        assert!(LifecycleState::DeployedClosed.can_transition_to(LifecycleState::DeployedOpen));
        assert!(!LifecycleState::DeployedOpen.can_transition_to(LifecycleState::DeployedClosed));
    }

    #[test]
    fn nothing_leaves_retired() {
        for next in ALL {
            assert_eq!(
                LifecycleState::Retired.can_transition_to(next),
                next == LifecycleState::Retired
            );
        }
    }

    #[test]
    fn backward_moves_are_illegal() {
        assert!(!LifecycleState::DeployedOpen.can_transition_to(LifecycleState::Testing));
        assert!(!LifecycleState::Testing.can_transition_to(LifecycleState::Training));
        assert!(!LifecycleState::Training.can_transition_to(LifecycleState::DeployedOpen));
    }

    #[test]
    fn only_retired_is_inactive() {
        for state in ALL {
            assert_eq!(state.is_active(), state != LifecycleState::Retired);
        }
    }

    #[test]
    fn active_outcome_is_not_terminal() {
        assert!(!Outcome::Active.is_terminal());
        assert!(Outcome::Extinction.is_terminal());
    }
}
