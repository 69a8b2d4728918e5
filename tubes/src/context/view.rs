//! Per-call context views handed to hooks.

use super::run::RunContext;
use super::tripwire::Tripwire;
use crate::core::{Artifact, Cursor};
use crate::errors::{StructuralError, TubesError};
use crate::pipeline::StageSpec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// The options of a run as seen from inside a hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionsSnapshot {
    /// The stage list.
    pub stages: Vec<StageSpec>,
    /// Names of the plugins registered so far, in order.
    pub plugins: Vec<String>,
    /// Whether hooks receive frozen snapshots.
    pub freeze: bool,
    /// Whether Start/End observer steps run.
    pub lifecycle_steps: bool,
}

/// Read view of the run for a single hook call.
///
/// The cursor is refreshed for every call. `errors` holds the errors
/// recorded before the call started.
#[derive(Clone)]
pub struct HookContext {
    run_id: Uuid,
    cursor: Cursor,
    input: Arc<Artifact>,
    errors: Vec<TubesError>,
    options: OptionsSnapshot,
    writer: Option<Arc<RunContext>>,
    tripwire: Tripwire,
}

impl HookContext {
    pub(crate) fn new(
        run_id: Uuid,
        cursor: Cursor,
        input: Arc<Artifact>,
        errors: Vec<TubesError>,
        options: OptionsSnapshot,
        writer: Option<Arc<RunContext>>,
        tripwire: Tripwire,
    ) -> Self {
        Self {
            run_id,
            cursor,
            input,
            errors,
            options,
            writer,
            tripwire,
        }
    }

    /// Identifier of the current run.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Where the current hook sits.
    #[must_use]
    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// Current stage name.
    #[must_use]
    pub fn stage(&self) -> &str {
        &self.cursor.stage
    }

    /// Current step identifier.
    #[must_use]
    pub fn step(&self) -> &str {
        &self.cursor.step
    }

    /// Index of the current hook within its step.
    #[must_use]
    pub fn iteration(&self) -> usize {
        self.cursor.iteration
    }

    /// The run's input.
    ///
    /// A live view reflects [`HookContext::set_input`] calls made since it
    /// was built; a frozen view keeps the value it was built with.
    #[must_use]
    pub fn input(&self) -> Arc<Artifact> {
        match &self.writer {
            Some(run) => run.input(),
            None => Arc::clone(&self.input),
        }
    }

    /// Errors recorded before this call.
    #[must_use]
    pub fn errors(&self) -> &[TubesError] {
        &self.errors
    }

    /// The run's options.
    #[must_use]
    pub fn options(&self) -> &OptionsSnapshot {
        &self.options
    }

    /// Whether this view rejects writes.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.writer.is_none()
    }

    /// Replaces the run's recorded input for every later reader.
    ///
    /// # Errors
    ///
    /// Returns [`StructuralError::FrozenContext`] when the view is frozen. The
    /// run aborts after the hook returns even if the error is discarded.
    pub fn set_input(&self, input: Artifact) -> Result<(), StructuralError> {
        match &self.writer {
            Some(run) => {
                run.replace_input(input);
                Ok(())
            }
            None => Err(self.tripwire.trip(StructuralError::FrozenContext {
                field: "input".to_string(),
            })),
        }
    }
}

impl fmt::Debug for HookContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookContext")
            .field("run_id", &self.run_id)
            .field("cursor", &self.cursor)
            .field("input", &self.input)
            .field("errors", &self.errors.len())
            .field("frozen", &self.is_frozen())
            .finish_non_exhaustive()
    }
}
