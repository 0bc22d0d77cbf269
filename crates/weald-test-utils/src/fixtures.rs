//! Reusable fixtures for container, lifecycle, and scheduler tests.
//!
//! - [`TestEntity`] — a configurable [`WorldEntity`] with a movable position.
//! - [`CountingMap`] / [`FailingMap`] / [`PanickingMap`] — instrumented
//!   [`Tickable`] targets for scheduler tests, plus the
//!   [`ConcurrencyGauge`] that tracks their peak overlap.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use weald_core::{
    MapId, ObjectGuid, ObjectKind, Position, TickError, Tickable, WorldEntity,
};

// ── TestEntity ───────────────────────────────────────────────────

/// A world entity with fixed identity and a movable position.
pub struct TestEntity {
    guid: ObjectGuid,
    kind: ObjectKind,
    position: Mutex<Position>,
    active: bool,
}

impl TestEntity {
    /// An inactive entity of `kind` standing at `position`.
    pub fn new(guid: u64, kind: ObjectKind, position: Position) -> Self {
        Self {
            guid: ObjectGuid(guid),
            kind,
            position: Mutex::new(position),
            active: false,
        }
    }

    /// Mark the entity as a grid keep-alive.
    pub fn active(mut self) -> Self {
        self.active = true;
        self
    }

    /// Teleport the entity (position reads are live).
    pub fn move_to(&self, position: Position) {
        *self.position.lock().expect("position poisoned") = position;
    }
}

impl WorldEntity for TestEntity {
    fn guid(&self) -> ObjectGuid {
        self.guid
    }

    fn kind(&self) -> ObjectKind {
        self.kind
    }

    fn position(&self) -> Position {
        *self.position.lock().expect("position poisoned")
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

// ── Scheduler targets ────────────────────────────────────────────

/// Tracks how many ticks overlap in time and the peak overlap seen.
#[derive(Default)]
pub struct ConcurrencyGauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyGauge {
    /// Note one tick entering. Returns the overlap including it.
    pub fn enter(&self) -> usize {
        let now = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak.fetch_max(now, Ordering::AcqRel);
        now
    }

    /// Note one tick leaving.
    pub fn exit(&self) {
        self.current.fetch_sub(1, Ordering::AcqRel);
    }

    /// Highest overlap observed.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }
}

/// A tick target that counts invocations, optionally holding its worker
/// for a fixed duration and reporting to a shared gauge/journal.
pub struct CountingMap {
    id: MapId,
    ticks: AtomicUsize,
    hold: Duration,
    gauge: Option<Arc<ConcurrencyGauge>>,
    journal: Option<Arc<Mutex<Vec<MapId>>>>,
}

impl CountingMap {
    /// A target that ticks instantly.
    pub fn new(id: MapId) -> Self {
        Self {
            id,
            ticks: AtomicUsize::new(0),
            hold: Duration::ZERO,
            gauge: None,
            journal: None,
        }
    }

    /// Hold the worker for `hold` on every tick.
    pub fn with_hold(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }

    /// Report overlap to a shared gauge.
    pub fn with_gauge(mut self, gauge: Arc<ConcurrencyGauge>) -> Self {
        self.gauge = Some(gauge);
        self
    }

    /// Append this map's id to a shared journal at tick start.
    pub fn with_journal(mut self, journal: Arc<Mutex<Vec<MapId>>>) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Ticks completed so far.
    pub fn ticks(&self) -> usize {
        self.ticks.load(Ordering::Acquire)
    }
}

impl Tickable for CountingMap {
    fn map_id(&self) -> MapId {
        self.id
    }

    fn tick(&self, _elapsed: Duration) -> Result<(), TickError> {
        if let Some(journal) = &self.journal {
            journal.lock().expect("journal poisoned").push(self.id);
        }
        if let Some(gauge) = &self.gauge {
            gauge.enter();
        }
        if !self.hold.is_zero() {
            std::thread::sleep(self.hold);
        }
        if let Some(gauge) = &self.gauge {
            gauge.exit();
        }
        self.ticks.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

/// A tick target that always fails with a fixed reason.
pub struct FailingMap {
    id: MapId,
    reason: String,
}

impl FailingMap {
    /// A target failing with `reason`.
    pub fn new(id: MapId, reason: impl Into<String>) -> Self {
        Self {
            id,
            reason: reason.into(),
        }
    }
}

impl Tickable for FailingMap {
    fn map_id(&self) -> MapId {
        self.id
    }

    fn tick(&self, _elapsed: Duration) -> Result<(), TickError> {
        Err(TickError::new(self.id, self.reason.clone()))
    }
}

/// A tick target that panics, for exercising worker fault capture.
pub struct PanickingMap {
    id: MapId,
}

impl PanickingMap {
    /// A target that panics on every tick.
    pub fn new(id: MapId) -> Self {
        Self { id }
    }
}

impl Tickable for PanickingMap {
    fn map_id(&self) -> MapId {
        self.id
    }

    fn tick(&self, _elapsed: Duration) -> Result<(), TickError> {
        panic!("scripted panic in map {}", self.id);
    }
}
