//! Grid-trait test collaborators used by this crate's unit tests.
//!
//! - [`ScriptedSpawnSource`] — a static per-cell spawn table.
//! - [`RecordingNav`] / [`RecordingHooks`] — collaborators that count calls.
//!
//! These implement traits defined in `weald-grid` itself, so they live
//! here rather than in `weald-test-utils` (which would otherwise form a
//! dependency cycle with this crate's own test build).

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use weald_core::{
    CellId, DifficultyId, EntityRef, MapId, ObjectGuid, ObjectKind, Position, SpawnId,
};
use weald_test_utils::TestEntity;

use crate::{CellCoord, GridCoord, GridHooks, NavError, NavMesh, SpawnData, SpawnSource};

// ── ScriptedSpawnSource ──────────────────────────────────────────

/// A spawn source backed by a static table, keyed by the cell each
/// spawn's position falls in. Materialized entities are [`TestEntity`]s
/// whose guid equals the spawn id.
#[derive(Default)]
pub struct ScriptedSpawnSource {
    by_cell: HashMap<CellId, Vec<SpawnId>>,
    data: HashMap<SpawnId, (SpawnData, ObjectKind)>,
}

impl ScriptedSpawnSource {
    /// Add one spawn entry at `position`.
    pub fn with_spawn(mut self, spawn: SpawnId, position: Position, kind: ObjectKind) -> Self {
        let cell = CellCoord::from_world(position.x, position.y).id();
        self.by_cell.entry(cell).or_default().push(spawn);
        self.data.insert(
            spawn,
            (
                SpawnData {
                    position,
                    group_flags: 0,
                },
                kind,
            ),
        );
        self
    }
}

impl SpawnSource for ScriptedSpawnSource {
    fn cell_spawns(&self, _map: MapId, _difficulty: DifficultyId, cell: CellId) -> Vec<SpawnId> {
        self.by_cell.get(&cell).cloned().unwrap_or_default()
    }

    fn spawn_data(&self, spawn: SpawnId) -> Option<SpawnData> {
        self.data.get(&spawn).map(|(data, _)| *data)
    }

    fn materialize(&self, spawn: SpawnId, data: &SpawnData) -> Option<EntityRef> {
        let (_, kind) = self.data.get(&spawn)?;
        Some(Arc::new(TestEntity::new(spawn.0, *kind, data.position)))
    }
}

// ── RecordingNav ─────────────────────────────────────────────────

/// A navigation collaborator that counts tile loads and unloads.
/// Optionally fails every tile load, for exercising the non-fatal
/// failure path.
#[derive(Default)]
pub struct RecordingNav {
    loads: AtomicUsize,
    unloads: AtomicUsize,
    fail_loads: bool,
}

impl RecordingNav {
    /// Make every `load_tile` call fail with a missing-tile error.
    pub fn failing() -> Self {
        Self {
            fail_loads: true,
            ..Self::default()
        }
    }

    /// Tiles loaded so far.
    pub fn loaded_tiles(&self) -> usize {
        self.loads.load(Ordering::Acquire)
    }

    /// Tiles unloaded so far.
    pub fn unloaded_tiles(&self) -> usize {
        self.unloads.load(Ordering::Acquire)
    }
}

impl NavMesh for RecordingNav {
    fn load_map_params(&self, _map: MapId) -> Result<(), NavError> {
        Ok(())
    }

    fn load_tile(&self, map: MapId, tile_x: u32, tile_y: u32) -> Result<(), NavError> {
        if self.fail_loads {
            return Err(NavError::TileMissing {
                map,
                tile_x,
                tile_y,
            });
        }
        self.loads.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn unload_tile(&self, _map: MapId, _tile_x: u32, _tile_y: u32) -> Result<(), NavError> {
        self.unloads.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn tile_refs(&self, _map: MapId, _tile_x: u32, _tile_y: u32) -> u32 {
        self.loads
            .load(Ordering::Acquire)
            .saturating_sub(self.unloads.load(Ordering::Acquire)) as u32
    }
}

// ── RecordingHooks ───────────────────────────────────────────────

/// Grid hooks that record every halt batch and relocation signal.
#[derive(Default)]
pub struct RecordingHooks {
    halted: Mutex<Vec<ObjectGuid>>,
    relocations: AtomicUsize,
    last_grid: Mutex<Option<GridCoord>>,
}

impl RecordingHooks {
    /// Guids delivered through `halt`, in delivery order.
    pub fn halted_guids(&self) -> Vec<ObjectGuid> {
        self.halted.lock().expect("halted poisoned").clone()
    }

    /// Number of relocation signals received.
    pub fn relocations(&self) -> usize {
        self.relocations.load(Ordering::Acquire)
    }

    /// Grid of the most recent relocation signal.
    pub fn last_relocated_grid(&self) -> Option<GridCoord> {
        *self.last_grid.lock().expect("last_grid poisoned")
    }
}

impl GridHooks for RecordingHooks {
    fn halt(&self, entities: &[EntityRef]) {
        self.halted
            .lock()
            .expect("halted poisoned")
            .extend(entities.iter().map(|e| e.guid()));
    }

    fn on_relocation_due(&self, grid: GridCoord) {
        self.relocations.fetch_add(1, Ordering::AcqRel);
        *self.last_grid.lock().expect("last_grid poisoned") = Some(grid);
    }
}
