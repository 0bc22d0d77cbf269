//! Shared error types.

use std::error::Error;
use std::fmt;

use crate::id::MapId;

/// A map tick failed.
///
/// Captured by the update scheduler as its first error and re-raised to
/// the next caller of `wait()` or `schedule_update()`. Cloneable so the
/// captured value can be surfaced more than once without losing it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickError {
    /// The map whose tick failed.
    pub map: MapId,
    /// Human-readable description of the failure.
    pub reason: String,
}

impl TickError {
    /// Construct a tick error for `map`.
    pub fn new(map: MapId, reason: impl Into<String>) -> Self {
        Self {
            map,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for TickError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "map {} tick failed: {}", self.map, self.reason)
    }
}

impl Error for TickError {}
