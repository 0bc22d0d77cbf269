//! Weald: the spatial-partitioning and concurrent map-tick core of a
//! persistent world server.
//!
//! This is the top-level facade crate that re-exports the public API
//! from all Weald sub-crates. For most users, adding `weald` as a
//! single dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use std::time::Duration;
//! use weald::prelude::*;
//!
//! // A map with no persistent spawns and default lifecycle intervals.
//! let map = Map::new(
//!     MapId(0),
//!     MapConfig::default(),
//!     Arc::new(EmptySpawnSource),
//! )
//! .unwrap();
//! let map = Arc::new(TickedMap(Mutex::new(map)));
//!
//! // A map handle the scheduler can drive: tick = advance lifecycles.
//! struct TickedMap(Mutex<Map>);
//! impl Tickable for TickedMap {
//!     fn map_id(&self) -> MapId {
//!         self.0.lock().unwrap().id()
//!     }
//!     fn tick(&self, elapsed: Duration) -> Result<(), TickError> {
//!         self.0.lock().unwrap().update(elapsed);
//!         Ok(())
//!     }
//! }
//!
//! // Query 40 yards around the origin without forcing grids to load.
//! {
//!     let mut guard = map.0.lock().unwrap();
//!     let spec = QuerySpec::new(Position::new(0.0, 0.0), 40.0).no_create(true);
//!     let mut players = 0usize;
//!     let mut notifier = Notifier::new(PartitionMask::WORLD)
//!         .on(ObjectKind::Player, |batch| players += batch.len());
//!     guard.visit_radius(&spec, &mut notifier);
//! }
//!
//! // Tick it on the worker pool and drain.
//! let mut updater = MapUpdater::new(&UpdaterConfig::default());
//! updater
//!     .schedule_update(map, Duration::from_millis(100))
//!     .unwrap();
//! updater.wait().unwrap();
//! updater.deactivate();
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in
//! the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `weald-core` | IDs, object kinds, positions, the entity trait |
//! | [`grid`] | `weald-grid` | Coordinates, containers, grids, maps, queries |
//! | [`engine`] | `weald-engine` | The concurrent map update scheduler |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, ids, and the entity trait (`weald-core`).
pub use weald_core as types;

/// Spatial index, traversal protocol, and radius queries (`weald-grid`).
pub use weald_grid as grid;

/// Concurrent map update scheduling (`weald-engine`).
pub use weald_engine as engine;

/// Common imports for typical Weald usage.
///
/// ```rust
/// use weald::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use weald_core::{
        AreaPredicate, CellId, DifficultyId, EntityRef, GridId, MapId, ObjectGuid, ObjectKind,
        Position, SpawnId, TickError, Tickable, WorldEntity,
    };

    // Spatial index
    pub use weald_grid::{
        Cell, CellContainer, CellCoord, EmptySpawnSource, Grid, GridCoord, GridHooks, GridState,
        IntraCoord, Map, MapConfig, NavError, NavMesh, NavTileHeader, Notifier, PartitionMask,
        QueryPlan, QuerySpec, SpawnData, SpawnSource,
    };

    // Scheduler
    pub use weald_engine::{MapUpdater, ScheduleError, UpdaterConfig};
}
