//! The closed set of world-object kinds.
//!
//! Spatial containers fan out on this tag to keep a per-kind index next
//! to their umbrella list. Adding a kind means adding a variant here and
//! nowhere else: the visitor protocol and the containers are generic
//! over [`ObjectKind::ALL`].

use std::fmt;

/// Concrete kind of a world object.
///
/// This is a deliberately closed set. Everything a consumer needs to do
/// with an object it does through [`WorldEntity`](crate::WorldEntity);
/// the kind tag exists so containers can keep exact per-kind indices and
/// the traversal protocol can deliver kind-filtered batches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// AI-driven creature (static or mobile).
    Creature,
    /// Player character.
    Player,
    /// Map-bound structure (doors, chests, buildings).
    Structure,
    /// Short-lived area effect.
    TransientEffect,
    /// Player or creature corpse.
    Corpse,
    /// Invisible trigger volume.
    TriggerVolume,
    /// Scripted scene object.
    SceneObject,
    /// Staged conversation actor.
    Conversation,
}

impl ObjectKind {
    /// Number of kinds. Sizes per-kind index arrays.
    pub const COUNT: usize = 8;

    /// Every kind, in index order.
    pub const ALL: [ObjectKind; Self::COUNT] = [
        ObjectKind::Creature,
        ObjectKind::Player,
        ObjectKind::Structure,
        ObjectKind::TransientEffect,
        ObjectKind::Corpse,
        ObjectKind::TriggerVolume,
        ObjectKind::SceneObject,
        ObjectKind::Conversation,
    ];

    /// Dense index in `[0, COUNT)`, stable across a build.
    pub fn index(self) -> usize {
        match self {
            ObjectKind::Creature => 0,
            ObjectKind::Player => 1,
            ObjectKind::Structure => 2,
            ObjectKind::TransientEffect => 3,
            ObjectKind::Corpse => 4,
            ObjectKind::TriggerVolume => 5,
            ObjectKind::SceneObject => 6,
            ObjectKind::Conversation => 7,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Creature => "creature",
            ObjectKind::Player => "player",
            ObjectKind::Structure => "structure",
            ObjectKind::TransientEffect => "transient-effect",
            ObjectKind::Corpse => "corpse",
            ObjectKind::TriggerVolume => "trigger-volume",
            ObjectKind::SceneObject => "scene-object",
            ObjectKind::Conversation => "conversation",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_is_in_index_order() {
        for (i, kind) in ObjectKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn indices_are_dense() {
        let mut seen = [false; ObjectKind::COUNT];
        for kind in ObjectKind::ALL {
            assert!(!seen[kind.index()], "duplicate index for {kind}");
            seen[kind.index()] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }
}
