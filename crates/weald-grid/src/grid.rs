//! One grid: a matrix of cell containers plus its unload lifecycle.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use weald_core::{EntityRef, GridId, ObjectGuid, ObjectKind};

use crate::container::CellContainer;
use crate::coords::{GridCoord, IntraCoord, CELLS_PER_GRID};
use crate::notify::Notifier;

/// Lifecycle state of a grid.
///
/// `Invalid → Active → Idle → Removal → unloaded` (terminal: the grid
/// object is discarded). `Idle` is a single-tick passthrough that
/// decouples "just went quiet" from "eligible for unload" by one full
/// unload-delay interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridState {
    /// Constructed but not yet populated.
    Invalid,
    /// Populated and in use.
    Active,
    /// Went quiet this tick; transitions to `Removal` on the next.
    Idle,
    /// Counting down to unload, unless pinned by a lock.
    Removal,
}

impl fmt::Display for GridState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GridState::Invalid => "invalid",
            GridState::Active => "active",
            GridState::Idle => "idle",
            GridState::Removal => "removal",
        };
        write!(f, "{name}")
    }
}

/// Countdown timer driven by tick deltas.
#[derive(Clone, Copy, Debug)]
pub struct ExpiryTimer {
    remaining: Duration,
}

impl ExpiryTimer {
    /// A timer with `interval` left on the clock.
    pub fn new(interval: Duration) -> Self {
        Self {
            remaining: interval,
        }
    }

    /// Advance by `diff`. Returns whether the timer has now expired.
    pub fn update(&mut self, diff: Duration) -> bool {
        self.remaining = self.remaining.saturating_sub(diff);
        self.passed()
    }

    /// Whether the countdown has reached zero.
    pub fn passed(&self) -> bool {
        self.remaining.is_zero()
    }

    /// Rewind to a fresh `interval`.
    pub fn reset(&mut self, interval: Duration) {
        self.remaining = interval;
    }

    /// Time left on the clock.
    pub fn remaining(&self) -> Duration {
        self.remaining
    }
}

/// A `CELLS_PER_GRID × CELLS_PER_GRID` block of cell containers with its
/// own load/unload lifecycle.
///
/// Container access is mediated: insert/remove go through the grid so
/// the per-grid occupancy counters (total world objects, players) stay
/// consistent with the cells. The unload guard has two independent
/// sources — a reference-counted lock for nested pin reasons (atomic:
/// active-object spawn logic touches it from outside the owning map's
/// tick) and one explicit boolean for administrative pinning. A grid
/// with either source active is never eligible for unload.
pub struct Grid {
    coord: GridCoord,
    state: GridState,
    cells: Vec<CellContainer>,
    expiry: ExpiryTimer,
    relocation: ExpiryTimer,
    unload_refs: AtomicU32,
    explicit_lock: AtomicBool,
    world_objects: usize,
    players: usize,
}

impl Grid {
    /// A new, unpopulated grid in the `Invalid` state.
    pub fn new(coord: GridCoord, expiry: Duration, relocation: Duration) -> Self {
        let cell_count = (CELLS_PER_GRID * CELLS_PER_GRID) as usize;
        Self {
            coord,
            state: GridState::Invalid,
            cells: (0..cell_count).map(|_| CellContainer::default()).collect(),
            expiry: ExpiryTimer::new(expiry),
            relocation: ExpiryTimer::new(relocation),
            unload_refs: AtomicU32::new(0),
            explicit_lock: AtomicBool::new(false),
            world_objects: 0,
            players: 0,
        }
    }

    /// Grid-space address.
    pub fn coord(&self) -> GridCoord {
        self.coord
    }

    /// Owning-grid id.
    pub fn id(&self) -> GridId {
        self.coord.id()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> GridState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: GridState) {
        self.state = state;
    }

    fn cell_index(intra: IntraCoord) -> usize {
        debug_assert!(intra.is_valid(), "intra-grid coordinate out of range");
        (intra.x * CELLS_PER_GRID + intra.y) as usize
    }

    /// The container of one cell.
    pub fn cell(&self, intra: IntraCoord) -> &CellContainer {
        &self.cells[Self::cell_index(intra)]
    }

    /// Insert a mobile entity into a cell's world partition.
    pub fn insert_world(&mut self, intra: IntraCoord, entity: EntityRef) {
        if entity.kind() == ObjectKind::Player {
            self.players += 1;
        }
        self.world_objects += 1;
        self.cells[Self::cell_index(intra)].world.insert(entity);
    }

    /// Insert a map-bound entity into a cell's grid partition.
    ///
    /// Players are world-partition only; routing one here is a violated
    /// design invariant.
    pub fn insert_grid(&mut self, intra: IntraCoord, entity: EntityRef) {
        debug_assert!(
            entity.kind() != ObjectKind::Player,
            "player {} inserted into grid partition",
            entity.guid()
        );
        self.cells[Self::cell_index(intra)].grid.insert(entity);
    }

    /// Remove by guid from either partition of a cell.
    pub fn remove(&mut self, intra: IntraCoord, guid: ObjectGuid) -> Option<EntityRef> {
        let container = &mut self.cells[Self::cell_index(intra)];
        if let Some(entity) = container.world.remove(guid) {
            self.world_objects -= 1;
            if entity.kind() == ObjectKind::Player {
                self.players -= 1;
            }
            return Some(entity);
        }
        container.grid.remove(guid)
    }

    /// Mobile entities currently in the grid.
    pub fn world_object_count(&self) -> usize {
        self.world_objects
    }

    /// Players currently in the grid.
    pub fn player_count(&self) -> usize {
        self.players
    }

    /// Run the traversal protocol over every cell of the grid.
    pub fn visit_all(&self, notifier: &mut Notifier<'_>) {
        for container in &self.cells {
            container.visit(notifier);
        }
    }

    // ── Unload locking ───────────────────────────────────────────

    /// Take one reference-counted unload pin.
    pub fn inc_unload_lock(&self) {
        self.unload_refs.fetch_add(1, Ordering::AcqRel);
    }

    /// Release one reference-counted unload pin.
    pub fn dec_unload_lock(&self) {
        let prev = self.unload_refs.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(prev > 0, "unload lock underflow on grid {}", self.id());
    }

    /// Current reference-counted pin count.
    pub fn unload_lock_count(&self) -> u32 {
        self.unload_refs.load(Ordering::Acquire)
    }

    /// Set or clear the explicit administrative lock.
    pub fn set_explicit_lock(&self, locked: bool) {
        self.explicit_lock.store(locked, Ordering::Release);
    }

    /// Whether any lock source pins this grid.
    pub fn unload_locked(&self) -> bool {
        self.explicit_lock.load(Ordering::Acquire) || self.unload_lock_count() > 0
    }

    // ── Timers ───────────────────────────────────────────────────

    /// Advance the expiry timer; returns whether it has expired.
    pub(crate) fn update_expiry(&mut self, diff: Duration) -> bool {
        self.expiry.update(diff)
    }

    /// Rewind the expiry timer.
    pub(crate) fn reset_expiry(&mut self, interval: Duration) {
        self.expiry.reset(interval);
    }

    /// Advance the relocation-notification timer; returns whether it
    /// has expired.
    pub(crate) fn update_relocation(&mut self, diff: Duration) -> bool {
        self.relocation.update(diff)
    }

    /// Rewind the relocation-notification timer.
    pub(crate) fn reset_relocation(&mut self, interval: Duration) {
        self.relocation.reset(interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use weald_core::Position;
    use weald_test_utils::TestEntity;

    fn entity(guid: u64, kind: ObjectKind) -> EntityRef {
        Arc::new(TestEntity::new(guid, kind, Position::new(0.0, 0.0)))
    }

    fn grid() -> Grid {
        Grid::new(
            GridCoord::new(2, 3),
            Duration::from_secs(300),
            Duration::from_secs(1),
        )
    }

    #[test]
    fn expiry_timer_counts_down_and_resets() {
        let mut t = ExpiryTimer::new(Duration::from_secs(10));
        assert!(!t.update(Duration::from_secs(4)));
        assert!(!t.passed());
        assert!(t.update(Duration::from_secs(6)));
        assert!(t.passed());
        t.reset(Duration::from_secs(3));
        assert!(!t.passed());
        assert_eq!(t.remaining(), Duration::from_secs(3));
    }

    #[test]
    fn expiry_timer_saturates_past_zero() {
        let mut t = ExpiryTimer::new(Duration::from_secs(1));
        assert!(t.update(Duration::from_secs(100)));
        assert!(t.update(Duration::from_secs(1)));
    }

    #[test]
    fn occupancy_counters_follow_inserts() {
        let mut g = grid();
        let at = IntraCoord::new(1, 1);
        g.insert_world(at, entity(1, ObjectKind::Player));
        g.insert_world(at, entity(2, ObjectKind::Creature));
        g.insert_grid(IntraCoord::new(0, 0), entity(3, ObjectKind::Structure));

        assert_eq!(g.world_object_count(), 2);
        assert_eq!(g.player_count(), 1);

        g.remove(at, ObjectGuid(1));
        assert_eq!(g.world_object_count(), 1);
        assert_eq!(g.player_count(), 0);

        // Grid-partition removal leaves world counters alone.
        g.remove(IntraCoord::new(0, 0), ObjectGuid(3));
        assert_eq!(g.world_object_count(), 1);
    }

    #[test]
    fn lock_sources_combine() {
        let g = grid();
        assert!(!g.unload_locked());

        g.inc_unload_lock();
        g.inc_unload_lock();
        assert!(g.unload_locked());
        assert_eq!(g.unload_lock_count(), 2);

        g.dec_unload_lock();
        assert!(g.unload_locked());
        g.dec_unload_lock();
        assert!(!g.unload_locked());

        g.set_explicit_lock(true);
        assert!(g.unload_locked());
        g.set_explicit_lock(false);
        assert!(!g.unload_locked());
    }

    #[test]
    fn new_grid_is_invalid_and_empty() {
        let g = grid();
        assert_eq!(g.state(), GridState::Invalid);
        assert_eq!(g.world_object_count(), 0);
        for x in 0..CELLS_PER_GRID {
            for y in 0..CELLS_PER_GRID {
                assert!(g.cell(IntraCoord::new(x, y)).is_empty());
            }
        }
    }
}
