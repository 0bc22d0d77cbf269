//! Per-cell typed object storage.
//!
//! Each cell holds two partitions: *world* objects (players and other
//! mobile, transient entities) and *grid* objects (map-bound entities).
//! A partition keeps an umbrella list of everything plus one list per
//! [`ObjectKind`], so kind-filtered counts and iteration stay O(1)-class.
//! Insert and remove are the only places in the system that fan out on
//! the kind tag; everything downstream is kind-agnostic.

use std::sync::Arc;

use weald_core::{EntityRef, ObjectGuid, ObjectKind};

/// One container partition: umbrella list plus per-kind index.
///
/// Invariant: an entity present in a kind list is always also present in
/// the umbrella list, and vice versa. Both are updated together in
/// `insert`/`remove`, so the invariant holds between any two calls.
///
/// Removal uses `swap_remove`, so iteration order within a kind is
/// container order: insertion order, not stable across removals.
#[derive(Default)]
pub struct KindPartition {
    all: Vec<EntityRef>,
    by_kind: [Vec<EntityRef>; ObjectKind::COUNT],
}

impl KindPartition {
    /// Add an entity to the umbrella list and its kind list.
    ///
    /// Inserting a guid twice is a violated design invariant (duplicate
    /// spawn entries), checked in debug builds only.
    pub fn insert(&mut self, entity: EntityRef) {
        debug_assert!(
            !self.contains(entity.guid()),
            "duplicate insert of guid {}",
            entity.guid()
        );
        self.by_kind[entity.kind().index()].push(Arc::clone(&entity));
        self.all.push(entity);
    }

    /// Remove by guid, returning the entity if it was present.
    pub fn remove(&mut self, guid: ObjectGuid) -> Option<EntityRef> {
        let pos = self.all.iter().position(|e| e.guid() == guid)?;
        let entity = self.all.swap_remove(pos);
        let kind_list = &mut self.by_kind[entity.kind().index()];
        if let Some(kpos) = kind_list.iter().position(|e| e.guid() == guid) {
            kind_list.swap_remove(kpos);
        } else {
            debug_assert!(false, "guid {guid} missing from its kind list");
        }
        Some(entity)
    }

    /// Membership by guid.
    pub fn contains(&self, guid: ObjectGuid) -> bool {
        self.all.iter().any(|e| e.guid() == guid)
    }

    /// Number of entities of `kind`.
    pub fn count_of(&self, kind: ObjectKind) -> usize {
        self.by_kind[kind.index()].len()
    }

    /// Total entities in the partition.
    pub fn len(&self) -> usize {
        self.all.len()
    }

    /// Whether the partition holds nothing.
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// The umbrella list.
    pub fn all(&self) -> &[EntityRef] {
        &self.all
    }

    /// The kind-indexed list for `kind`.
    pub fn of_kind(&self, kind: ObjectKind) -> &[EntityRef] {
        &self.by_kind[kind.index()]
    }
}

/// The heterogeneous object storage of one cell.
#[derive(Default)]
pub struct CellContainer {
    /// Mobile, player-like entities.
    pub world: KindPartition,
    /// Map-bound entities.
    pub grid: KindPartition,
}

impl CellContainer {
    /// Membership by guid in either partition.
    pub fn contains(&self, guid: ObjectGuid) -> bool {
        self.world.contains(guid) || self.grid.contains(guid)
    }

    /// Entities of `kind` across both partitions.
    pub fn count_of(&self, kind: ObjectKind) -> usize {
        self.world.count_of(kind) + self.grid.count_of(kind)
    }

    /// Total entities in the cell.
    pub fn len(&self) -> usize {
        self.world.len() + self.grid.len()
    }

    /// Whether the cell holds nothing.
    pub fn is_empty(&self) -> bool {
        self.world.is_empty() && self.grid.is_empty()
    }
}
