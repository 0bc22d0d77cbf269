//! Strongly-typed identifiers used across the Weald workspace.

use std::fmt;

/// Identifies a map (one independent world instance).
///
/// Maps are the unit of concurrent scheduling: the update scheduler
/// guarantees at most one in-flight tick per map handle it is given.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MapId(pub u32);

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for MapId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a grid within a map.
///
/// Derived from grid-space coordinates as `grid_x * MAX_GRIDS + grid_y`,
/// so it doubles as a dense index into per-map grid tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridId(pub u32);

impl fmt::Display for GridId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for GridId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a cell within a map.
///
/// Dense: `cell_x * TOTAL_CELLS_PER_MAP + cell_y`. Used as the key when
/// asking the persistent spawn collaborator what to materialize.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub u32);

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for CellId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a persistent spawn entry in external storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpawnId(pub u64);

impl fmt::Display for SpawnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SpawnId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Globally unique identifier of a world object.
///
/// Allocation policy belongs to the domain layer; the spatial core only
/// compares guids for container membership checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectGuid(pub u64);

impl fmt::Display for ObjectGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ObjectGuid {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Map difficulty selector, forwarded opaquely to the spawn collaborator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DifficultyId(pub u8);

impl fmt::Display for DifficultyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for DifficultyId {
    fn from(v: u8) -> Self {
        Self(v)
    }
}
