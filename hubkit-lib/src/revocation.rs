//! Per-address revocation floors.
//!
//! A floor is the oldest `iat` still accepted for an address. Floors only
//! move forward. Updates take the map shard's lock for a single entry, so
//! bumps for unrelated addresses do not contend on one global lock, and a
//! bump that has returned is visible to every later read.

use dashmap::DashMap;

/// Process-lifetime store of revocation floors, keyed by address.
#[derive(Debug, Default)]
pub struct RevocationRegistry {
    floors: DashMap<String, i64>,
}

impl RevocationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the floor for `address` to `timestamp` if that is higher.
    ///
    /// Returns the floor in effect after the call.
    pub fn bump(&self, address: &str, timestamp: i64) -> i64 {
        let mut floor = self
            .floors
            .entry(address.to_string())
            .or_insert(timestamp);
        if timestamp > *floor {
            *floor = timestamp;
        }
        *floor
    }

    /// Oldest accepted issue time for `address`, or `None` when no floor is set.
    pub fn floor_for(&self, address: &str) -> Option<i64> {
        self.floors.get(address).map(|floor| *floor)
    }

    /// Number of addresses with a floor.
    pub fn len(&self) -> usize {
        self.floors.len()
    }

    /// Whether no floor has been set.
    pub fn is_empty(&self) -> bool {
        self.floors.is_empty()
    }
}
