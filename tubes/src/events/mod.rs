//! Event sink system for observability.
//!
//! The engine reports run, stage, group and hook lifecycle events to the
//! sink configured on [`crate::Options`]. Event types:
//!
//! - `pipeline.started` / `pipeline.completed` / `pipeline.aborted`
//! - `stage.started` / `stage.completed`
//! - `group.started` / `group.completed`
//! - `hook.failed` / `hook.error_pushed`
//! - `plugin.added`

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
