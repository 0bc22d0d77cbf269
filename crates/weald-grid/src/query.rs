//! Radius queries: compile a world-space disc into an ordered cell plan.
//!
//! A [`QuerySpec`] names a center, radius, and query mode; compiling it
//! yields a [`QueryPlan`] — the minimal cell set to visit and an
//! efficient visiting order. Small areas use a tight row-major rectangle
//! scan with the standing cell forced first (bounds worst-case latency
//! for the common case); large areas use an octagon fill that
//! approximates the disc without per-cell distance checks.
//! [`Map::visit_radius`](crate::Map::visit_radius) executes plans
//! against live containers.

use weald_core::Position;

use crate::coords::{CellCoord, GRID_SIZE_YARDS};

/// A radius query over a map.
#[derive(Clone, Copy, Debug)]
pub struct QuerySpec {
    /// Query center in world space.
    pub center: Position,
    /// Disc radius in world yards. Non-positive means "standing cell
    /// only". Radii beyond one grid edge are clamped — a useful radius
    /// cannot exceed the grid's physical size.
    pub radius: f32,
    /// Query-only mode: visited cells never trigger grid creation or
    /// spawn materialization.
    pub no_create: bool,
}

impl QuerySpec {
    /// A creating query around `center`.
    pub fn new(center: Position, radius: f32) -> Self {
        Self {
            center,
            radius,
            no_create: false,
        }
    }

    /// Switch the query-only flag.
    pub fn no_create(mut self, flag: bool) -> Self {
        self.no_create = flag;
        self
    }

    /// Resolve the cells to visit and their order.
    pub fn compile(&self) -> QueryPlan {
        let standing = CellCoord::from_world(self.center.x, self.center.y);

        if self.radius <= 0.0 {
            return QueryPlan::single(standing, self.no_create);
        }

        let radius = self.radius.min(GRID_SIZE_YARDS);
        let low = CellCoord::from_world(self.center.x - radius, self.center.y - radius);
        let high = CellCoord::from_world(self.center.x + radius, self.center.y + radius);

        if low == high {
            return QueryPlan::single(standing, self.no_create);
        }

        let span_x = high.x - low.x + 1;
        let span_y = high.y - low.y + 1;
        if span_x > 4 && span_y > 4 {
            QueryPlan {
                standing,
                cells: octagon_fill(low, high),
                octagon: true,
                no_create: self.no_create,
            }
        } else {
            QueryPlan {
                standing,
                cells: rect_scan(low, high, standing),
                octagon: false,
                no_create: self.no_create,
            }
        }
    }
}

/// Compiled cell visitation plan.
#[derive(Clone, Debug)]
pub struct QueryPlan {
    standing: CellCoord,
    cells: Vec<CellCoord>,
    octagon: bool,
    no_create: bool,
}

impl QueryPlan {
    fn single(standing: CellCoord, no_create: bool) -> Self {
        Self {
            standing,
            cells: vec![standing],
            octagon: false,
            no_create,
        }
    }

    /// The cell containing the query center.
    pub fn standing(&self) -> CellCoord {
        self.standing
    }

    /// Cells in visiting order.
    pub fn cells(&self) -> &[CellCoord] {
        &self.cells
    }

    /// Number of cells the plan visits.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the plan visits nothing. Plans never are — the standing
    /// cell is always included — but the accessor keeps the container
    /// convention.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Whether compilation took the octagon-fill path.
    pub fn used_octagon(&self) -> bool {
        self.octagon
    }

    /// The query-only flag every visited cell inherits.
    pub fn no_create(&self) -> bool {
        self.no_create
    }
}

/// Standing cell first, then the rest of the rectangle row-major.
fn rect_scan(low: CellCoord, high: CellCoord, standing: CellCoord) -> Vec<CellCoord> {
    let capacity = ((high.x - low.x + 1) * (high.y - low.y + 1)) as usize;
    let mut cells = Vec::with_capacity(capacity);
    cells.push(standing);
    for x in low.x..=high.x {
        for y in low.y..=high.y {
            let cell = CellCoord::new(x, y);
            if cell != standing {
                cells.push(cell);
            }
        }
    }
    cells
}

/// Approximate the disc with a cell-grid octagon.
///
/// A full-height central strip covers most of the rectangle; shrinking
/// side columns cut the corner cells a square scan would visit outside
/// the true radius. `shift = ceil(width * 0.3 - 0.5)` columns are cut
/// from each side, and each side column at distance `step` loses `step`
/// rows from both ends.
fn octagon_fill(low: CellCoord, high: CellCoord) -> Vec<CellCoord> {
    let width = high.x - low.x;
    let shift = ((width as f32) * 0.3 - 0.5).ceil().max(0.0) as u32;
    let start = low.x + shift;
    let end = high.x - shift;

    let capacity = ((width + 1) * (high.y - low.y + 1)) as usize;
    let mut cells = Vec::with_capacity(capacity);

    for x in start..=end {
        for y in low.y..=high.y {
            cells.push(CellCoord::new(x, y));
        }
    }
    if shift == 0 {
        return cells;
    }

    for step in 1..=shift {
        let y_lo = low.y + step;
        let y_hi = match high.y.checked_sub(step) {
            Some(v) if v >= y_lo => v,
            _ => break,
        };
        for y in y_lo..=y_hi {
            cells.push(CellCoord::new(start - step, y));
        }
        for y in y_lo..=y_hi {
            cells.push(CellCoord::new(end + step, y));
        }
    }
    cells
}
