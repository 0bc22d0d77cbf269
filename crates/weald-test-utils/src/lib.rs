//! Test utilities and mock collaborators for Weald development.

#![forbid(unsafe_code)]

mod fixtures;

pub use fixtures::{
    ConcurrencyGauge, CountingMap, FailingMap, PanickingMap, TestEntity,
};
