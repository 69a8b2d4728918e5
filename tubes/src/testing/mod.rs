//! Testing utilities for tubes pipelines.
//!
//! This module provides:
//! - Mock hooks and a shared call log
//! - Assertions for run results
//! - A pipeline fixture with an event collector
//! - Tracing setup for tests

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_error_at, assert_error_count, assert_no_errors, assert_output};
pub use fixtures::TestPipeline;
pub use mocks::{CallLog, ConstHook, FailingHook, HookCall, RecordingHook, SlowHook};

use tracing_subscriber::EnvFilter;

/// Installs a `tracing` subscriber writing to the test output.
///
/// Honours `RUST_LOG`; defaults to `tubes=debug`. Safe to call from every
/// test, only the first call installs anything.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tubes=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
