//! Common test utilities for disk-interface integration tests.

pub mod assertions;
pub mod harness;

pub use assertions::*;
pub use harness::*;
