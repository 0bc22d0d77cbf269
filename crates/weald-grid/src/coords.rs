//! Two-level discrete coordinate spaces and world-position conversion.
//!
//! A map is carved into `MAX_GRIDS × MAX_GRIDS` grids, each holding
//! `CELLS_PER_GRID × CELLS_PER_GRID` cells. Cell-space addresses a cell
//! map-wide (`[0, TOTAL_CELLS_PER_MAP)` per axis); grid-space addresses
//! a grid (`[0, MAX_GRIDS)` per axis). Both spaces expose the same
//! contract through one const-generic type, parameterized only by limit.

use weald_core::{CellId, GridId};

/// Grids per map axis.
pub const MAX_GRIDS: u32 = 64;

/// Cells per grid axis.
pub const CELLS_PER_GRID: u32 = 8;

/// Cells per map axis.
pub const TOTAL_CELLS_PER_MAP: u32 = MAX_GRIDS * CELLS_PER_GRID;

/// Side length of one grid in world yards.
pub const GRID_SIZE_YARDS: f32 = 533.333_3;

/// Side length of one cell in world yards.
pub const CELL_SIZE_YARDS: f32 = GRID_SIZE_YARDS / CELLS_PER_GRID as f32;

/// Cell index of the map origin: world (0, 0) falls in the center cell.
const CENTER_CELL: f64 = (TOTAL_CELLS_PER_MAP / 2) as f64;

/// A discrete (x, y) pair in a square coordinate space bounded by `LIMIT`.
///
/// Out-of-range values are representable (conversion from world space can
/// overshoot at map edges); [`is_valid`](Self::is_valid) reports whether
/// both components are in range and [`normalized`](Self::normalized)
/// clamps. Spatial queries degrade by clamping, never by failing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Coordinate<const LIMIT: u32> {
    /// West-east index.
    pub x: u32,
    /// South-north index.
    pub y: u32,
}

/// Map-wide cell address.
pub type CellCoord = Coordinate<TOTAL_CELLS_PER_MAP>;

/// Grid address.
pub type GridCoord = Coordinate<MAX_GRIDS>;

/// Cell address within its owning grid.
pub type IntraCoord = Coordinate<CELLS_PER_GRID>;

impl<const LIMIT: u32> Coordinate<LIMIT> {
    /// Exclusive upper bound for both components.
    pub const fn limit() -> u32 {
        LIMIT
    }

    /// Construct without range checking.
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Both components strictly below the space's limit.
    pub fn is_valid(&self) -> bool {
        self.x < LIMIT && self.y < LIMIT
    }

    /// Clamp out-of-range components to the maximum valid index.
    ///
    /// Idempotent and total: normalizing an already-valid coordinate is
    /// a no-op, and no input fails.
    pub fn normalized(self) -> Self {
        Self {
            x: self.x.min(LIMIT - 1),
            y: self.y.min(LIMIT - 1),
        }
    }

    /// Shift the x component by `delta`, saturating at `[0, LIMIT - 1]`.
    pub fn step_x(self, delta: i32) -> Self {
        Self {
            x: shift_clamped(self.x, delta, LIMIT),
            y: self.y,
        }
    }

    /// Shift the y component by `delta`, saturating at `[0, LIMIT - 1]`.
    pub fn step_y(self, delta: i32) -> Self {
        Self {
            x: self.x,
            y: shift_clamped(self.y, delta, LIMIT),
        }
    }
}

fn shift_clamped(v: u32, delta: i32, limit: u32) -> u32 {
    if delta >= 0 {
        v.saturating_add(delta as u32).min(limit - 1)
    } else {
        v.saturating_sub(delta.unsigned_abs())
    }
}

impl CellCoord {
    /// Map a continuous world position into cell space.
    ///
    /// The map is centered: world (0, 0) lands in cell
    /// (`TOTAL_CELLS_PER_MAP / 2`, `TOTAL_CELLS_PER_MAP / 2`). Positions
    /// beyond the playable area clamp to the border cells.
    pub fn from_world(x: f32, y: f32) -> Self {
        Self {
            x: world_axis_to_cell(x),
            y: world_axis_to_cell(y),
        }
    }

    /// Cell address within its owning grid (remainder by `CELLS_PER_GRID`).
    pub fn intra_grid(&self) -> IntraCoord {
        IntraCoord {
            x: self.x % CELLS_PER_GRID,
            y: self.y % CELLS_PER_GRID,
        }
    }

    /// Dense map-wide cell id.
    pub fn id(&self) -> CellId {
        CellId(self.x * TOTAL_CELLS_PER_MAP + self.y)
    }
}

fn world_axis_to_cell(v: f32) -> u32 {
    let offset = f64::from(v) / f64::from(CELL_SIZE_YARDS);
    let idx = offset + CENTER_CELL + 0.5;
    if idx < 0.0 {
        0
    } else {
        (idx.floor() as u32).min(TOTAL_CELLS_PER_MAP - 1)
    }
}

impl GridCoord {
    /// The grid containing `cell` (integer division by `CELLS_PER_GRID`).
    pub fn containing(cell: CellCoord) -> Self {
        Self {
            x: cell.x / CELLS_PER_GRID,
            y: cell.y / CELLS_PER_GRID,
        }
    }

    /// Owning-grid id: `x * MAX_GRIDS + y`.
    pub fn id(&self) -> GridId {
        GridId(self.x * MAX_GRIDS + self.y)
    }
}
