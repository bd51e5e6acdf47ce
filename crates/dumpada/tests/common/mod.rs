//! Shared test utilities for dumpada integration tests.
//!
//! This module provides:
//! - `TestHarness` wiring a migrated database to the managers
//! - Builders for sample and work front inputs

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
