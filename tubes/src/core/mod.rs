//! Core domain model types for tubes.
//!
//! This module contains the fundamental types used throughout the engine:
//! - The artifact value and its truthiness rules
//! - Step kinds and step identifiers
//! - The cursor locating a hook invocation
//! - The run result

mod artifact;
mod cursor;
mod result;
mod step;

pub use artifact::{into_branches, is_truthy, Artifact};
pub use cursor::Cursor;
pub use result::TubesResult;
pub use step::{StepId, StepKind, RESERVED_SUFFIXES};
