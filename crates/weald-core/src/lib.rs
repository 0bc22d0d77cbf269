//! Core types and traits for the Weald world-server framework.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions used throughout the Weald workspace:
//! strongly-typed identifiers, the closed set of world-object kinds,
//! float-precision positions, the entity trait that spatial containers
//! store, and shared error types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod entity;
pub mod error;
pub mod id;
pub mod kind;
pub mod position;
pub mod tick;

pub use entity::{EntityRef, WorldEntity};
pub use error::TickError;
pub use id::{CellId, DifficultyId, GridId, MapId, ObjectGuid, SpawnId};
pub use kind::ObjectKind;
pub use position::{AreaPredicate, Inverted, Position};
pub use tick::Tickable;
