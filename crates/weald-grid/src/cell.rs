//! Cell addresses with query-mode flag.

use std::fmt;
use std::hash::{Hash, Hasher};

use weald_core::GridId;

use crate::coords::{CellCoord, GridCoord, IntraCoord, CELLS_PER_GRID};

/// One grid-space/cell-space location, plus the `no_create` query flag.
///
/// Cells are value-like: equality and hashing cover the four coordinate
/// components only. `no_create` is traversal state — it marks a cell as
/// query-only, suppressing lazy grid materialization during the visit —
/// and two cells naming the same location are the same cell regardless
/// of it.
#[derive(Clone, Copy, Debug)]
pub struct Cell {
    grid: GridCoord,
    intra: IntraCoord,
    no_create: bool,
}

impl Cell {
    /// Build from a map-wide cell coordinate. The input is normalized
    /// first, so out-of-range coordinates clamp to border cells.
    pub fn from_cell_coord(coord: CellCoord) -> Self {
        let coord = coord.normalized();
        Self {
            grid: GridCoord::containing(coord),
            intra: coord.intra_grid(),
            no_create: false,
        }
    }

    /// Build from a continuous world position.
    pub fn from_world(x: f32, y: f32) -> Self {
        Self::from_cell_coord(CellCoord::from_world(x, y))
    }

    /// Owning grid address.
    pub fn grid(&self) -> GridCoord {
        self.grid
    }

    /// Address within the owning grid.
    pub fn intra(&self) -> IntraCoord {
        self.intra
    }

    /// Owning grid id.
    pub fn grid_id(&self) -> GridId {
        self.grid.id()
    }

    /// Reconstruct the map-wide cell coordinate.
    pub fn cell_coord(&self) -> CellCoord {
        CellCoord::new(
            self.grid.x * CELLS_PER_GRID + self.intra.x,
            self.grid.y * CELLS_PER_GRID + self.intra.y,
        )
    }

    /// Whether this cell is query-only: visiting it must not trigger
    /// grid creation or persistent-spawn materialization.
    pub fn no_create(&self) -> bool {
        self.no_create
    }

    /// Set the query-only flag in place.
    pub fn set_no_create(&mut self, flag: bool) {
        self.no_create = flag;
    }

    /// Copy of this cell with the query-only flag replaced. The radius
    /// engine clones every visited cell from the standing cell's flag
    /// through this.
    pub fn with_no_create(self, flag: bool) -> Self {
        Self {
            no_create: flag,
            ..self
        }
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.grid == other.grid && self.intra == other.intra
    }
}

impl Eq for Cell {}

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.grid.hash(state);
        self.intra.hash(state);
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "grid ({}, {}) cell ({}, {})",
            self.grid.x, self.grid.y, self.intra.x, self.intra.y
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::TOTAL_CELLS_PER_MAP;

    #[test]
    fn equality_ignores_no_create() {
        let a = Cell::from_cell_coord(CellCoord::new(100, 200));
        let b = a.with_no_create(true);
        assert_eq!(a, b);
        assert!(!a.no_create());
        assert!(b.no_create());
    }

    #[test]
    fn cell_coord_round_trips() {
        for &(x, y) in &[(0, 0), (7, 7), (8, 8), (100, 200), (511, 511)] {
            let coord = CellCoord::new(x, y);
            assert_eq!(Cell::from_cell_coord(coord).cell_coord(), coord);
        }
    }

    #[test]
    fn out_of_range_coord_clamps_to_border() {
        let cell = Cell::from_cell_coord(CellCoord::new(TOTAL_CELLS_PER_MAP + 3, 1));
        assert_eq!(cell.cell_coord().x, TOTAL_CELLS_PER_MAP - 1);
    }

    #[test]
    fn grid_split_is_division_and_remainder() {
        let cell = Cell::from_cell_coord(CellCoord::new(83, 14));
        assert_eq!(cell.grid(), GridCoord::new(10, 1));
        assert_eq!(cell.intra(), IntraCoord::new(3, 6));
    }
}
