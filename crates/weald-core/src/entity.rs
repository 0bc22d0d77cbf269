//! The entity trait stored by spatial containers.

use std::sync::Arc;

use crate::id::ObjectGuid;
use crate::kind::ObjectKind;
use crate::position::Position;

/// Minimal surface a world object exposes to the spatial core.
///
/// Domain behavior (combat, AI, interaction) stays entirely behind this
/// trait; the containers and the visitor protocol only need identity,
/// kind, position, and whether the object keeps surrounding grids alive.
///
/// # Thread safety
///
/// `Send + Sync` is required because entity references are delivered to
/// traversal callbacks during map ticks that run on scheduler worker
/// threads. Implementations that mutate internally must carry their own
/// synchronization.
pub trait WorldEntity: Send + Sync {
    /// Globally unique object identifier. Container membership is
    /// decided by guid equality, not pointer identity.
    fn guid(&self) -> ObjectGuid;

    /// The object's concrete kind tag.
    fn kind(&self) -> ObjectKind;

    /// Current world position.
    fn position(&self) -> Position;

    /// Whether this object keeps grids within its activation radius
    /// loaded. Players are implicitly active through the per-grid
    /// player count; this flag is for non-player keep-alives.
    fn is_active(&self) -> bool {
        false
    }
}

/// Shared handle to a world entity.
pub type EntityRef = Arc<dyn WorldEntity>;
