//! The map-handle surface the update scheduler drives.

use std::time::Duration;

use crate::error::TickError;
use crate::id::MapId;

/// A map instance as the update scheduler sees it.
///
/// `tick` advances the instance by an elapsed-time delta and is
/// synchronous from the scheduler's point of view: it runs to
/// completion on one worker thread with no internal suspension points.
///
/// Implementations take `&self` because the handle is shared with the
/// worker pool; a typical implementation wraps its mutable state in a
/// `Mutex` that is uncontended as long as the caller honors per-map
/// exclusivity (never two outstanding requests for one map).
pub trait Tickable: Send + Sync {
    /// The map this handle ticks.
    fn map_id(&self) -> MapId;

    /// Advance the map by `elapsed`.
    fn tick(&self, elapsed: Duration) -> Result<(), TickError>;
}
