//! The traversal protocol: partition masks and capability notifiers.
//!
//! A traversal carries a [`PartitionMask`] selecting which container
//! partitions to touch and a [`Notifier`] declaring, slot by slot, which
//! object kinds it wants delivered. Dispatch is a static field check:
//! for each selected partition, each filled kind slot receives that
//! kind's list, and the `any_world` slot receives the world partition's
//! umbrella list. A handler is never invoked for a kind it did not
//! request, and empty lists are not delivered.
//!
//! The same mechanism serves structural traversals (halting a grid that
//! is going idle) and simulation traversals (perception and relocation
//! scans), so new kinds can be added without touching every consumer.

use std::ops::BitOr;

use weald_core::{EntityRef, ObjectKind};

use crate::container::{CellContainer, KindPartition};

/// Selects which partitions of a cell container a traversal touches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PartitionMask(u8);

impl PartitionMask {
    /// Map-bound (grid) objects only.
    pub const GRID: PartitionMask = PartitionMask(0b01);
    /// Mobile (world) objects only.
    pub const WORLD: PartitionMask = PartitionMask(0b10);
    /// Both partitions.
    pub const ALL: PartitionMask = PartitionMask(0b11);

    /// Whether every partition in `other` is selected by `self`.
    pub fn contains(self, other: PartitionMask) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for PartitionMask {
    type Output = PartitionMask;

    fn bitor(self, rhs: PartitionMask) -> PartitionMask {
        PartitionMask(self.0 | rhs.0)
    }
}

type Handler<'a> = Box<dyn FnMut(&[EntityRef]) + 'a>;

/// A capability-bearing traversal callback.
///
/// Built with [`on`](Self::on) / [`on_any_world`](Self::on_any_world);
/// each call fills one capability slot. Delivery order across kinds is
/// unspecified; within a kind, batches arrive in container order.
///
/// ```
/// use weald_grid::{CellContainer, Notifier, PartitionMask};
/// use weald_core::ObjectKind;
///
/// let container = CellContainer::default();
/// let mut seen = 0usize;
/// let mut notifier = Notifier::new(PartitionMask::WORLD)
///     .on(ObjectKind::Player, |batch| seen += batch.len());
/// container.visit(&mut notifier);
/// ```
pub struct Notifier<'a> {
    mask: PartitionMask,
    kind_handlers: [Option<Handler<'a>>; ObjectKind::COUNT],
    any_world: Option<Handler<'a>>,
}

impl<'a> Notifier<'a> {
    /// A notifier with no capabilities over the given partitions.
    pub fn new(mask: PartitionMask) -> Self {
        Self {
            mask,
            kind_handlers: std::array::from_fn(|_| None),
            any_world: None,
        }
    }

    /// Request delivery of `kind` batches. Replaces any handler already
    /// registered for that kind.
    pub fn on(mut self, kind: ObjectKind, handler: impl FnMut(&[EntityRef]) + 'a) -> Self {
        self.kind_handlers[kind.index()] = Some(Box::new(handler));
        self
    }

    /// Request delivery of the world partition's umbrella list — every
    /// world object regardless of kind. Only fires when the mask
    /// selects the world partition.
    pub fn on_any_world(mut self, handler: impl FnMut(&[EntityRef]) + 'a) -> Self {
        self.any_world = Some(Box::new(handler));
        self
    }

    /// The partitions this traversal touches.
    pub fn mask(&self) -> PartitionMask {
        self.mask
    }

    fn deliver_kinds(&mut self, partition: &KindPartition) {
        for kind in ObjectKind::ALL {
            if let Some(handler) = &mut self.kind_handlers[kind.index()] {
                let batch = partition.of_kind(kind);
                if !batch.is_empty() {
                    handler(batch);
                }
            }
        }
    }
}

impl CellContainer {
    /// Run the traversal protocol against this cell.
    pub fn visit(&self, notifier: &mut Notifier<'_>) {
        if notifier.mask().contains(PartitionMask::GRID) {
            notifier.deliver_kinds(&self.grid);
        }
        if notifier.mask().contains(PartitionMask::WORLD) {
            notifier.deliver_kinds(&self.world);
            if let Some(handler) = &mut notifier.any_world {
                let batch = self.world.all();
                if !batch.is_empty() {
                    handler(batch);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use weald_core::{ObjectGuid, Position};
    use weald_test_utils::TestEntity;

    fn entity(guid: u64, kind: ObjectKind) -> EntityRef {
        Arc::new(TestEntity::new(guid, kind, Position::new(0.0, 0.0)))
    }

    fn populated() -> CellContainer {
        let mut c = CellContainer::default();
        c.world.insert(entity(1, ObjectKind::Player));
        c.world.insert(entity(2, ObjectKind::Creature));
        c.grid.insert(entity(3, ObjectKind::Creature));
        c.grid.insert(entity(4, ObjectKind::Structure));
        c
    }

    #[test]
    fn mask_selects_partitions() {
        assert!(PartitionMask::ALL.contains(PartitionMask::GRID));
        assert!(PartitionMask::ALL.contains(PartitionMask::WORLD));
        assert!(!PartitionMask::GRID.contains(PartitionMask::WORLD));
        assert_eq!(PartitionMask::GRID | PartitionMask::WORLD, PartitionMask::ALL);
    }

    #[test]
    fn only_requested_kinds_are_delivered() {
        let c = populated();
        let mut seen: Vec<ObjectGuid> = Vec::new();
        {
            let mut n = Notifier::new(PartitionMask::ALL).on(ObjectKind::Creature, |batch| {
                seen.extend(batch.iter().map(|e| e.guid()));
            });
            c.visit(&mut n);
        }
        seen.sort();
        assert_eq!(seen, vec![ObjectGuid(2), ObjectGuid(3)]);
    }

    #[test]
    fn grid_mask_skips_world_partition() {
        let c = populated();
        let mut creatures = 0usize;
        let mut any_world = 0usize;
        {
            let mut n = Notifier::new(PartitionMask::GRID)
                .on(ObjectKind::Creature, |batch| creatures += batch.len())
                .on_any_world(|batch| any_world += batch.len());
            c.visit(&mut n);
        }
        // Only the grid-partition creature; the umbrella capability is
        // world-only and must not fire under a grid-only mask.
        assert_eq!(creatures, 1);
        assert_eq!(any_world, 0);
    }

    #[test]
    fn any_world_receives_umbrella_list() {
        let c = populated();
        let mut guids: Vec<ObjectGuid> = Vec::new();
        {
            let mut n =
                Notifier::new(PartitionMask::WORLD).on_any_world(|batch| {
                    guids.extend(batch.iter().map(|e| e.guid()));
                });
            c.visit(&mut n);
        }
        guids.sort();
        assert_eq!(guids, vec![ObjectGuid(1), ObjectGuid(2)]);
    }

    #[test]
    fn empty_batches_are_not_delivered() {
        let c = CellContainer::default();
        let calls = std::cell::Cell::new(0usize);
        {
            let mut n = Notifier::new(PartitionMask::ALL)
                .on(ObjectKind::Player, |_| calls.set(calls.get() + 1))
                .on_any_world(|_| calls.set(calls.get() + 1));
            c.visit(&mut n);
        }
        assert_eq!(calls.get(), 0);
    }
}
