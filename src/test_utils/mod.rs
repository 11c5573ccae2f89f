//! Test utilities.
//!
//! This module provides:
//! - Test data factories with sensible defaults
//! - An in-memory persistence implementing every repository trait
//! - A fixed clock and an `AppState` builder for HTTP-level tests

mod app_state_builder;
mod factories;
mod mocks;

pub use app_state_builder::*;
pub use factories::*;
pub use mocks::*;
