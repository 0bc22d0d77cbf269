//! Spatial partitioning for Weald world servers.
//!
//! This crate is the spatial core: a fixed two-level grid/cell index
//! with typed per-cell containers, the capability-based traversal
//! protocol that queries or mutates objects in a cell without knowing
//! concrete kinds, the radius query engine that compiles world-space
//! discs into cell visitation plans, and the per-map grid table with
//! its load/unload lifecycle.
//!
//! # Layout
//!
//! - [`coords`]: cell-space and grid-space coordinates, world-position
//!   conversion, the map's dimensional constants
//! - [`Cell`] / [`CellContainer`]: addressed, partitioned object storage
//! - [`Notifier`] / [`PartitionMask`]: the traversal protocol
//! - [`Grid`] / [`GridState`]: one grid and its unload lifecycle
//! - [`Map`]: the grid table, population, and the lifecycle driver
//! - [`QuerySpec`] / [`QueryPlan`]: radius queries
//! - [`SpawnSource`] / [`NavMesh`]: injected external collaborators

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cell;
pub mod container;
pub mod coords;
pub mod grid;
pub mod map;
pub mod nav;
pub mod notify;
pub mod query;
pub mod spawn;

#[cfg(test)]
mod testing;

pub use cell::Cell;
pub use container::{CellContainer, KindPartition};
pub use coords::{
    CellCoord, Coordinate, GridCoord, IntraCoord, CELLS_PER_GRID, CELL_SIZE_YARDS,
    GRID_SIZE_YARDS, MAX_GRIDS, TOTAL_CELLS_PER_MAP,
};
pub use grid::{ExpiryTimer, Grid, GridState};
pub use map::{GridHooks, Map, MapConfig, MapConfigError};
pub use nav::{NavError, NavMesh, NavTileHeader};
pub use notify::{Notifier, PartitionMask};
pub use query::{QueryPlan, QuerySpec};
pub use spawn::{EmptySpawnSource, SpawnData, SpawnSource};
