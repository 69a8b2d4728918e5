//! The mutation API passed to every hook.

use super::run::RunContext;
use super::tripwire::Tripwire;
use crate::core::Cursor;
use crate::errors::{ErrorOrigin, StructuralError, TubesError};
use crate::plugins::Plugin;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Capability object for changing the run from inside a hook.
///
/// Every method tags what it records with the cursor of the hook that
/// received this handle. A [`StructuralError`] returned by any method aborts
/// the run once the hook returns, even if the hook swallows it.
#[derive(Clone)]
pub struct HookApi {
    run: Arc<RunContext>,
    cursor: Cursor,
    plugin: Arc<str>,
    tripwire: Tripwire,
}

impl HookApi {
    pub(crate) fn new(
        run: Arc<RunContext>,
        cursor: Cursor,
        plugin: Arc<str>,
        tripwire: Tripwire,
    ) -> Self {
        Self {
            run,
            cursor,
            plugin,
            tripwire,
        }
    }

    /// Cursor of the hook holding this handle.
    #[must_use]
    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// Name of the plugin whose hook holds this handle.
    #[must_use]
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// Appends a plugin for the rest of the run.
    ///
    /// Steps that have already collected their hooks are not affected.
    ///
    /// # Errors
    ///
    /// Returns [`StructuralError::InvalidPlugin`] if the plugin binds a step
    /// the pipeline does not have.
    pub fn add_plugin(&self, plugin: Plugin) -> Result<(), StructuralError> {
        debug!(cursor = %self.cursor, plugin = %plugin.name(), "Adding plugin at runtime");
        self.run
            .add_plugin(plugin)
            .map_err(|err| self.tripwire.trip(err))
    }

    /// Shallow-merges a JSON object into the run state. Allowed under `freeze`.
    ///
    /// # Errors
    ///
    /// Returns [`StructuralError::InvalidStatePatch`] if `patch` is not an
    /// object.
    pub fn set_state(&self, patch: Value) -> Result<(), StructuralError> {
        match patch {
            Value::Object(map) => {
                self.run.merge_state(map);
                Ok(())
            }
            other => Err(self.tripwire.trip(StructuralError::InvalidStatePatch {
                kind: json_kind(&other).to_string(),
            })),
        }
    }

    /// Records an error without aborting the hook.
    pub fn push_error(&self, error: impl Into<anyhow::Error>) {
        let error = TubesError::new(
            error.into(),
            self.cursor.clone(),
            Some(self.plugin.to_string()),
            ErrorOrigin::Pushed,
        );
        self.run.notify(
            "hook.error_pushed",
            serde_json::json!({
                "cursor": self.cursor.to_value(),
                "plugin": &*self.plugin,
                "message": error.message(),
            }),
        );
        self.run.record_error(error);
    }

    /// Records several errors, in order.
    pub fn push_errors<E>(&self, errors: impl IntoIterator<Item = E>)
    where
        E: Into<anyhow::Error>,
    {
        for error in errors {
            self.push_error(error);
        }
    }
}

impl fmt::Debug for HookApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookApi")
            .field("cursor", &self.cursor)
            .field("plugin", &self.plugin)
            .finish_non_exhaustive()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
