//! Concurrent map update scheduling for Weald world servers.
//!
//! [`MapUpdater`] is a bounded worker pool that accepts "advance this
//! map by Δt" requests, dispatches them to workers in FIFO submission
//! order with capped concurrency, and exposes synchronous drain and
//! shutdown. One map's failure never stops other in-flight ticks; the
//! first failure is captured and re-raised to the next caller.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod updater;

pub use config::UpdaterConfig;
pub use updater::{MapUpdater, ScheduleError};
