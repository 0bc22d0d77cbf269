//! The persistent-spawn collaborator seam.
//!
//! Grid population asks this collaborator what to materialize; the
//! spatial core never reads spawn storage itself. Injected into
//! [`Map`](crate::Map) at construction — there is no ambient registry.

use weald_core::{CellId, DifficultyId, EntityRef, MapId, Position, SpawnId};

/// Static metadata for one persistent spawn entry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnData {
    /// Where the spawned object stands.
    pub position: Position,
    /// Spawn-group flags, opaque to the core.
    pub group_flags: u32,
}

/// Source of persistent objects, consumed during grid population only.
pub trait SpawnSource: Send + Sync {
    /// The spawn entries that belong to one cell of one map/difficulty.
    fn cell_spawns(&self, map: MapId, difficulty: DifficultyId, cell: CellId) -> Vec<SpawnId>;

    /// Static metadata for a spawn entry, or `None` if unknown.
    fn spawn_data(&self, spawn: SpawnId) -> Option<SpawnData>;

    /// Build the live entity for a spawn entry. `None` skips the entry
    /// (e.g. the spawn is conditionally disabled).
    fn materialize(&self, spawn: SpawnId, data: &SpawnData) -> Option<EntityRef>;
}

/// A spawn source with nothing in it. Useful for maps populated purely
/// at runtime and as a test default.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptySpawnSource;

impl SpawnSource for EmptySpawnSource {
    fn cell_spawns(&self, _map: MapId, _difficulty: DifficultyId, _cell: CellId) -> Vec<SpawnId> {
        Vec::new()
    }

    fn spawn_data(&self, _spawn: SpawnId) -> Option<SpawnData> {
        None
    }

    fn materialize(&self, _spawn: SpawnId, _data: &SpawnData) -> Option<EntityRef> {
        None
    }
}
