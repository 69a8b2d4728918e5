//! Pipeline definition and execution.
//!
//! This module provides:
//! - Stage specifications and the validated stage catalog
//! - Run options and their serde configuration form
//! - The driver, stage executor and hook invoker
//! - Parallel fan-out of stage groups

mod driver;
mod fanout;
mod invoker;
mod options;
mod spec;
mod stage;

pub use driver::{tubes, Tubes};
pub use options::{Options, TubesConfig};
pub use spec::{StageCatalog, StageSpec};
