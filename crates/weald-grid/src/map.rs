//! A map instance's grid table: creation on first access, persistent
//! population, active-object pinning, and the lifecycle driver.
//!
//! The map owns its grids and is the only thing that mutates them; the
//! update scheduler guarantees one tick at a time per map, so no
//! locking happens here beyond the grids' atomic unload guards (which
//! active-object spawn logic may touch from outside the tick).

use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use smallvec::SmallVec;

use weald_core::{DifficultyId, EntityRef, GridId, MapId, ObjectGuid, Position};

use crate::cell::Cell;
use crate::coords::{CellCoord, GridCoord, IntraCoord, CELLS_PER_GRID, GRID_SIZE_YARDS};
use crate::grid::{Grid, GridState};
use crate::nav::NavMesh;
use crate::notify::{Notifier, PartitionMask};
use crate::query::QuerySpec;
use crate::spawn::SpawnSource;

// ── MapConfig ────────────────────────────────────────────────────

/// Tuning intervals for grid lifecycle and relocation batching.
#[derive(Clone, Copy, Debug)]
pub struct MapConfig {
    /// Time a quiet grid waits in `Removal` before unload, and the
    /// initial `Active` expiry. Default: 300 s.
    pub unload_delay: Duration,
    /// "Check again soon" interval when an `Active` grid turns out to
    /// still be in use at expiry. Default: 30 s.
    pub recheck_interval: Duration,
    /// Period of the per-grid relocation-notification timer.
    /// Default: 1 s.
    pub relocation_interval: Duration,
    /// Radius around an active object within which grids are pinned
    /// loaded. Default: one grid edge.
    pub activation_radius: f32,
    /// Difficulty forwarded to the spawn collaborator.
    pub difficulty: DifficultyId,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            unload_delay: Duration::from_secs(300),
            recheck_interval: Duration::from_secs(30),
            relocation_interval: Duration::from_secs(1),
            activation_radius: GRID_SIZE_YARDS,
            difficulty: DifficultyId::default(),
        }
    }
}

impl MapConfig {
    /// Check structural invariants at map construction.
    pub fn validate(&self) -> Result<(), MapConfigError> {
        if self.unload_delay.is_zero() {
            return Err(MapConfigError::ZeroUnloadDelay);
        }
        if self.recheck_interval.is_zero() {
            return Err(MapConfigError::ZeroRecheckInterval);
        }
        if self.relocation_interval.is_zero() {
            return Err(MapConfigError::ZeroRelocationInterval);
        }
        if !self.activation_radius.is_finite() || self.activation_radius <= 0.0 {
            return Err(MapConfigError::InvalidActivationRadius {
                value: self.activation_radius,
            });
        }
        Ok(())
    }
}

/// Errors detected during [`MapConfig::validate`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MapConfigError {
    /// `unload_delay` must be nonzero.
    ZeroUnloadDelay,
    /// `recheck_interval` must be nonzero.
    ZeroRecheckInterval,
    /// `relocation_interval` must be nonzero.
    ZeroRelocationInterval,
    /// `activation_radius` must be finite and positive.
    InvalidActivationRadius {
        /// The invalid value.
        value: f32,
    },
}

impl fmt::Display for MapConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroUnloadDelay => write!(f, "unload_delay must be nonzero"),
            Self::ZeroRecheckInterval => write!(f, "recheck_interval must be nonzero"),
            Self::ZeroRelocationInterval => write!(f, "relocation_interval must be nonzero"),
            Self::InvalidActivationRadius { value } => {
                write!(f, "activation_radius must be finite and positive, got {value}")
            }
        }
    }
}

impl Error for MapConfigError {}

// ── GridHooks ────────────────────────────────────────────────────

/// Domain-side callbacks reached through the traversal protocol.
///
/// The spatial core knows how to find objects, not what to do to them;
/// these hooks are where the domain layer plugs in. Both default to
/// no-ops.
pub trait GridHooks: Send + Sync {
    /// A grid is going idle: halt domain activity for these world
    /// objects (cancel combat, clear threat, force AI evade). Delivered
    /// per cell via the world-partition umbrella list.
    fn halt(&self, entities: &[EntityRef]) {
        let _ = entities;
    }

    /// A grid's relocation-notification timer elapsed; run the
    /// visibility/relocation batch for it.
    fn on_relocation_due(&self, grid: GridCoord) {
        let _ = grid;
    }
}

// ── Map ──────────────────────────────────────────────────────────

struct ActiveEntry {
    entity: EntityRef,
    /// Grids pinned at registration time. Released exactly once on
    /// deregistration, so nested pins from overlapping activation radii
    /// balance.
    pinned: SmallVec<[GridId; 4]>,
}

/// One world instance's spatial state.
///
/// Collaborators are injected at construction; the map holds no ambient
/// registries. All mutation happens on the owning tick except the
/// grids' atomic unload guards.
pub struct Map {
    id: MapId,
    config: MapConfig,
    grids: IndexMap<GridId, Grid>,
    active: IndexMap<ObjectGuid, ActiveEntry>,
    spawns: Arc<dyn SpawnSource>,
    nav: Option<Arc<dyn NavMesh>>,
    hooks: Option<Arc<dyn GridHooks>>,
    nav_params_loaded: bool,
}

impl Map {
    /// Create an empty map over the given spawn collaborator.
    pub fn new(
        id: MapId,
        config: MapConfig,
        spawns: Arc<dyn SpawnSource>,
    ) -> Result<Self, MapConfigError> {
        config.validate()?;
        Ok(Self {
            id,
            config,
            grids: IndexMap::new(),
            active: IndexMap::new(),
            spawns,
            nav: None,
            hooks: None,
            nav_params_loaded: false,
        })
    }

    /// Attach the navigation collaborator. Tiles load and unload with
    /// their grids.
    pub fn with_nav(mut self, nav: Arc<dyn NavMesh>) -> Self {
        self.nav = nav.into();
        self
    }

    /// Attach the domain hook surface.
    pub fn with_hooks(mut self, hooks: Arc<dyn GridHooks>) -> Self {
        self.hooks = hooks.into();
        self
    }

    /// This map's id.
    pub fn id(&self) -> MapId {
        self.id
    }

    /// The configured intervals.
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Number of grids currently loaded.
    pub fn loaded_grid_count(&self) -> usize {
        self.grids.len()
    }

    /// Whether a grid is currently loaded.
    pub fn is_grid_loaded(&self, grid: GridCoord) -> bool {
        self.grids.contains_key(&grid.id())
    }

    /// The grid at `coord`, if loaded.
    pub fn grid(&self, coord: GridCoord) -> Option<&Grid> {
        self.grids.get(&coord.id())
    }

    // ── Entity placement ─────────────────────────────────────────

    /// Insert a mobile entity at its current position, creating the
    /// owning grid if needed. Returns the cell it landed in.
    pub fn add_world_entity(&mut self, entity: EntityRef) -> Cell {
        let pos = entity.position();
        let cell = Cell::from_world(pos.x, pos.y);
        let grid = self.ensure_grid(cell.grid());
        grid.insert_world(cell.intra(), entity);
        cell
    }

    /// Insert a map-bound entity at its current position, creating the
    /// owning grid if needed. Returns the cell it landed in.
    pub fn add_grid_entity(&mut self, entity: EntityRef) -> Cell {
        let pos = entity.position();
        let cell = Cell::from_world(pos.x, pos.y);
        let grid = self.ensure_grid(cell.grid());
        grid.insert_grid(cell.intra(), entity);
        cell
    }

    /// Remove an entity by guid from the cell covering `position`.
    /// Returns `None` if the grid is not loaded or the guid is absent.
    pub fn remove_entity(&mut self, guid: ObjectGuid, position: &Position) -> Option<EntityRef> {
        let cell = Cell::from_world(position.x, position.y);
        let grid = self.grids.get_mut(&cell.grid_id())?;
        grid.remove(cell.intra(), guid)
    }

    // ── Active objects ───────────────────────────────────────────

    /// Register a keep-alive object: every grid within the activation
    /// radius of its position is loaded and pinned against unload.
    pub fn add_active(&mut self, entity: EntityRef) {
        let guid = entity.guid();
        if self.active.contains_key(&guid) {
            debug_assert!(false, "active object {guid} registered twice");
            return;
        }
        let mut pinned = SmallVec::new();
        for gc in grids_in_radius(entity.position(), self.config.activation_radius) {
            self.ensure_grid(gc).inc_unload_lock();
            pinned.push(gc.id());
        }
        self.active.insert(guid, ActiveEntry { entity, pinned });
    }

    /// Deregister a keep-alive object, releasing the pins taken at
    /// registration.
    pub fn remove_active(&mut self, guid: ObjectGuid) -> Option<EntityRef> {
        let entry = self.active.swap_remove(&guid)?;
        for gid in &entry.pinned {
            // Pinned grids cannot have unloaded while locked.
            if let Some(grid) = self.grids.get(gid) {
                grid.dec_unload_lock();
            }
        }
        Some(entry.entity)
    }

    /// Whether any registered active object's activation circle covers
    /// `grid`. Evaluated against *current* positions, so an active
    /// object that wandered near a grid keeps it alive even if its
    /// registration-time pins are elsewhere.
    pub fn active_objects_near_grid(&self, grid: GridCoord) -> bool {
        self.active.values().any(|entry| {
            grids_in_radius(entry.entity.position(), self.config.activation_radius)
                .contains(&grid)
        })
    }

    // ── Traversal ────────────────────────────────────────────────

    /// Run the traversal protocol against one cell. Creates the owning
    /// grid first unless the cell is marked `no_create`.
    pub fn visit_cell(&mut self, cell: &Cell, notifier: &mut Notifier<'_>) {
        let gid = cell.grid_id();
        if !self.grids.contains_key(&gid) {
            if cell.no_create() {
                return;
            }
            self.ensure_grid(cell.grid());
        }
        self.grids[&gid].cell(cell.intra()).visit(notifier);
    }

    /// Compile and execute a radius query. Every visited cell inherits
    /// the spec's `no_create` flag, so query-only callers never trigger
    /// lazy materialization.
    pub fn visit_radius(&mut self, spec: &QuerySpec, notifier: &mut Notifier<'_>) {
        let plan = spec.compile();
        for coord in plan.cells() {
            let cell = Cell::from_cell_coord(*coord).with_no_create(plan.no_create());
            self.visit_cell(&cell, notifier);
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Advance every grid's lifecycle and relocation timer by `diff`.
    ///
    /// Called once per map tick by the simulation step. Grids that
    /// reach unload eligibility are removed after the pass.
    pub fn update(&mut self, diff: Duration) {
        let ids: Vec<GridId> = self.grids.keys().copied().collect();
        let mut unloads: Vec<GridId> = Vec::new();
        for gid in ids {
            self.update_grid_lifecycle(gid, diff, &mut unloads);
            self.update_grid_relocation(gid, diff);
        }
        for gid in unloads {
            self.unload_grid(gid);
        }
    }

    fn update_grid_lifecycle(&mut self, gid: GridId, diff: Duration, unloads: &mut Vec<GridId>) {
        let state = match self.grids.get(&gid) {
            Some(grid) => grid.state(),
            None => return,
        };
        match state {
            GridState::Invalid => {}
            GridState::Active => {
                let expired = self
                    .grids
                    .get_mut(&gid)
                    .is_some_and(|g| g.update_expiry(diff));
                if !expired {
                    return;
                }
                let (gc, players) = {
                    let grid = &self.grids[&gid];
                    (grid.coord(), grid.player_count())
                };
                if players > 0 || self.active_objects_near_grid(gc) {
                    self.grids
                        .get_mut(&gid)
                        .expect("grid present")
                        .reset_expiry(self.config.recheck_interval);
                } else {
                    self.suspend_grid(gid);
                    self.grids
                        .get_mut(&gid)
                        .expect("grid present")
                        .set_state(GridState::Idle);
                    log::debug!("map {}: grid ({}, {}) idle", self.id, gc.x, gc.y);
                }
            }
            GridState::Idle => {
                // Passthrough: decouple "just went quiet" from "eligible
                // for unload" by one full interval.
                let grid = self.grids.get_mut(&gid).expect("grid present");
                grid.reset_expiry(self.config.unload_delay);
                grid.set_state(GridState::Removal);
                let gc = grid.coord();
                log::debug!(
                    "map {}: grid ({}, {}) awaiting removal",
                    self.id,
                    gc.x,
                    gc.y
                );
            }
            GridState::Removal => {
                // A pinned grid stays put; the timer does not even run.
                if self.grids[&gid].unload_locked() {
                    return;
                }
                let expired = self
                    .grids
                    .get_mut(&gid)
                    .is_some_and(|g| g.update_expiry(diff));
                if !expired {
                    return;
                }
                let (gc, occupied) = {
                    let grid = &self.grids[&gid];
                    (grid.coord(), grid.world_object_count() > 0)
                };
                if occupied || self.active_objects_near_grid(gc) {
                    // Unload refused: someone came back. Retry later.
                    self.grids
                        .get_mut(&gid)
                        .expect("grid present")
                        .reset_expiry(self.config.unload_delay);
                } else {
                    unloads.push(gid);
                }
            }
        }
    }

    fn update_grid_relocation(&mut self, gid: GridId, diff: Duration) {
        let Some(grid) = self.grids.get_mut(&gid) else {
            return;
        };
        if grid.state() != GridState::Active {
            return;
        }
        if grid.update_relocation(diff) {
            grid.reset_relocation(self.config.relocation_interval);
            let gc = grid.coord();
            if let Some(hooks) = &self.hooks {
                hooks.on_relocation_due(gc);
            }
        }
    }

    /// Halt in-grid activity through the visitor surface before the
    /// grid goes idle.
    fn suspend_grid(&mut self, gid: GridId) {
        let Some(hooks) = self.hooks.clone() else {
            return;
        };
        let Some(grid) = self.grids.get(&gid) else {
            return;
        };
        let mut notifier =
            Notifier::new(PartitionMask::WORLD).on_any_world(|batch| hooks.halt(batch));
        grid.visit_all(&mut notifier);
    }

    fn unload_grid(&mut self, gid: GridId) {
        let Some(grid) = self.grids.shift_remove(&gid) else {
            return;
        };
        let gc = grid.coord();
        debug_assert!(!grid.unload_locked(), "unloading a locked grid");
        if let Some(nav) = &self.nav {
            if let Err(e) = nav.unload_tile(self.id, gc.x, gc.y) {
                log::warn!(
                    "map {}: nav tile ({}, {}) unload failed: {e}",
                    self.id,
                    gc.x,
                    gc.y
                );
            }
        }
        log::debug!("map {}: grid ({}, {}) unloaded", self.id, gc.x, gc.y);
    }

    // ── Grid creation ────────────────────────────────────────────

    fn ensure_grid(&mut self, gc: GridCoord) -> &mut Grid {
        let gid = gc.id();
        if !self.grids.contains_key(&gid) {
            let grid = self.load_grid(gc);
            self.grids.insert(gid, grid);
        }
        self.grids.get_mut(&gid).expect("grid just ensured")
    }

    fn load_grid(&mut self, gc: GridCoord) -> Grid {
        let mut grid = Grid::new(
            gc,
            self.config.unload_delay,
            self.config.relocation_interval,
        );
        self.load_nav_tile(gc);
        self.populate_grid(&mut grid);
        grid.set_state(GridState::Active);
        log::debug!("map {}: grid ({}, {}) loaded", self.id, gc.x, gc.y);
        grid
    }

    fn load_nav_tile(&mut self, gc: GridCoord) {
        let Some(nav) = &self.nav else {
            return;
        };
        if !self.nav_params_loaded {
            match nav.load_map_params(self.id) {
                Ok(()) => self.nav_params_loaded = true,
                Err(e) => {
                    log::warn!("map {}: nav params load failed: {e}", self.id);
                    return;
                }
            }
        }
        if let Err(e) = nav.load_tile(self.id, gc.x, gc.y) {
            log::warn!(
                "map {}: nav tile ({}, {}) load failed: {e}",
                self.id,
                gc.x,
                gc.y
            );
        }
    }

    /// Materialize persistent spawns for every cell of a fresh grid.
    fn populate_grid(&self, grid: &mut Grid) {
        let gc = grid.coord();
        for ix in 0..CELLS_PER_GRID {
            for iy in 0..CELLS_PER_GRID {
                let coord = CellCoord::new(
                    gc.x * CELLS_PER_GRID + ix,
                    gc.y * CELLS_PER_GRID + iy,
                );
                for spawn in
                    self.spawns
                        .cell_spawns(self.id, self.config.difficulty, coord.id())
                {
                    let Some(data) = self.spawns.spawn_data(spawn) else {
                        log::warn!("map {}: spawn {spawn} has no data", self.id);
                        continue;
                    };
                    if let Some(entity) = self.spawns.materialize(spawn, &data) {
                        grid.insert_grid(IntraCoord::new(ix, iy), entity);
                    }
                }
            }
        }
    }
}

/// Grids whose area intersects the square of `radius` around `pos`.
fn grids_in_radius(pos: Position, radius: f32) -> SmallVec<[GridCoord; 9]> {
    let low = GridCoord::containing(CellCoord::from_world(pos.x - radius, pos.y - radius));
    let high = GridCoord::containing(CellCoord::from_world(pos.x + radius, pos.y + radius));
    let mut out = SmallVec::new();
    for x in low.x..=high.x {
        for y in low.y..=high.y {
            out.push(GridCoord::new(x, y));
        }
    }
    out
}
