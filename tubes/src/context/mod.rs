//! Run context and the handles hooks receive.
//!
//! This module provides:
//! - The run-scoped context shared by every branch of a run
//! - The state record and the (optionally frozen) handle hooks read it through
//! - Per-call context views with a refreshed cursor
//! - The mutation API passed to every hook
//! - A per-call tripwire that keeps structural violations from being swallowed

mod api;
#[cfg(test)]
mod context_tests;
mod run;
mod state;
mod tripwire;
mod view;

pub use api::HookApi;
pub(crate) use run::RunContext;
pub use state::{HookState, State};
pub(crate) use tripwire::Tripwire;
pub use view::{HookContext, OptionsSnapshot};
