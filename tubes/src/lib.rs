//! # Tubes
//!
//! A staged plugin pipeline engine.
//!
//! A pipeline is an ordered list of named stages. Plugins bind hooks to the
//! steps of those stages (`<stage>Before`, `<stage>`, `<stage>After`), and the
//! engine threads one artifact and one shared state record through them:
//!
//! - **Deterministic order**: stages in list order, steps in fixed order,
//!   hooks in plugin registration order
//! - **Pass-through and short-circuit**: a hook returning nothing leaves the
//!   artifact alone; a main step ends as soon as the artifact is truthy
//! - **Error capture**: hook failures are recorded with their cursor and the
//!   run continues
//! - **Parallel fan-out**: a nested stage list runs once per element of the
//!   incoming array, concurrently, with outputs kept in input order
//! - **Freeze**: hooks can be handed read-only snapshots of state and context
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tubes::prelude::*;
//! use serde_json::json;
//!
//! let greeter = Plugin::new("greeter")
//!     .main("greet", FnHook::new(|name, _, _, _| Ok(Some(json!(format!("hello {name}"))))));
//!
//! let options = Options::new()
//!     .with_stages([StageSpec::stage("load"), StageSpec::group(["greet"])])
//!     .with_plugin(greeter);
//!
//! let result = tubes(json!(["ada", "grace"]), options, None).await?;
//! assert!(result.is_clean());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod context;
pub mod core;
pub mod errors;
pub mod events;
pub mod pipeline;
pub mod plugins;
pub mod testing;
pub mod utils;

pub use pipeline::{tubes, Options, Tubes};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::context::{HookApi, HookContext, HookState, OptionsSnapshot, State};
    pub use crate::core::{is_truthy, Artifact, Cursor, StepId, StepKind, TubesResult};
    pub use crate::errors::{
        ErrorOrigin, FatalError, OptionsValidationError, StepParseError, StructuralError,
        TubesError,
    };
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::pipeline::{tubes, Options, StageCatalog, StageSpec, Tubes, TubesConfig};
    pub use crate::plugins::{AsyncFnHook, FnHook, Hook, HookResult, Plugin};
}
