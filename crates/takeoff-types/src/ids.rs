//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Agent identifiers are derived from bytes drawn from the run's seeded
//! generator rather than from the wall clock, so two runs with the same
//! seed assign the same identifiers in the same order.

use serde::{Deserialize, Serialize};
use uuid::{Builder, Uuid};

/// Unique identifier for an agent in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub Uuid);

impl AgentId {
    /// Build an identifier from 16 random bytes (UUID v4 layout).
    ///
    /// Callers supply the bytes from the simulation generator; this type
    /// never reaches for an ambient source of randomness.
    pub const fn from_random_bytes(bytes: [u8; 16]) -> Self {
        Self(Builder::from_random_bytes(bytes).into_uuid())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl core::fmt::Display for AgentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for AgentId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<AgentId> for Uuid {
    fn from(id: AgentId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_bytes_same_id() {
        let a = AgentId::from_random_bytes([7; 16]);
        let b = AgentId::from_random_bytes([7; 16]);
        assert_eq!(a, b);
    }

    #[test]
    fn different_bytes_different_id() {
        let a = AgentId::from_random_bytes([1; 16]);
        let b = AgentId::from_random_bytes([2; 16]);
        assert_ne!(a, b);
    }

    #[test]
    fn id_is_version_4() {
        let id = AgentId::from_random_bytes([0xAB; 16]);
        assert_eq!(id.into_inner().get_version_num(), 4);
    }

    #[test]
    fn id_serializes_as_string() {
        let id = AgentId::from_random_bytes([3; 16]);
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert!(json.starts_with('"'));
        assert!(json.contains(&id.to_string()));
    }
}
