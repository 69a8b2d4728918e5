//! Error types for the tubes engine.
//!
//! Two disjoint classes exist. Fatal errors ([`FatalError`]) abort a run and
//! are returned from [`crate::tubes`] instead of a result. Hook errors are
//! recorded as [`TubesError`] entries in the run's error sink and never abort
//! anything.

use crate::core::Cursor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum FatalError {
    /// The options failed validation before the run started.
    #[error("{0}")]
    Validation(#[from] OptionsValidationError),

    /// A hook violated the engine contract (e.g. wrote to frozen state).
    #[error("{source} (at {cursor})")]
    Structural {
        /// Where the violation happened.
        cursor: Cursor,
        /// The violation.
        #[source]
        source: StructuralError,
    },

    /// A parallel branch task panicked or was torn down.
    #[error("Branch {index} of parallel group aborted: {reason}")]
    BranchAborted {
        /// Index of the branch within its group.
        index: usize,
        /// Description of the failure.
        reason: String,
    },

    /// A hook panicked outside any parallel group.
    #[error("Pipeline run panicked: {reason}")]
    Panicked {
        /// The panic message.
        reason: String,
    },

    /// A generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FatalError {
    /// Returns the structural violation, if this is one.
    #[must_use]
    pub fn as_structural(&self) -> Option<&StructuralError> {
        match self {
            Self::Structural { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Returns the cursor at which the run aborted, if known.
    #[must_use]
    pub fn cursor(&self) -> Option<&Cursor> {
        match self {
            Self::Structural { cursor, .. } => Some(cursor),
            _ => None,
        }
    }
}

/// Contract violations raised through the hook-facing handles.
///
/// The handle that raises one also records it for the current call, so the
/// run aborts once the hook returns whether or not the hook propagates it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    /// A write to a frozen state snapshot.
    #[error("Cannot assign to read only property '{key}' of frozen state")]
    FrozenState {
        /// The key the hook tried to write.
        key: String,
    },

    /// A write to a frozen context.
    #[error("Cannot assign to read only property '{field}' of frozen context")]
    FrozenContext {
        /// The context field the hook tried to write.
        field: String,
    },

    /// `set_state` was given something other than a JSON object.
    #[error("State update must be a JSON object, got {kind}")]
    InvalidStatePatch {
        /// The JSON type that was supplied.
        kind: String,
    },

    /// A plugin added at runtime failed validation.
    #[error("Plugin '{plugin}' rejected: {reason}")]
    InvalidPlugin {
        /// The plugin name.
        plugin: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Error raised when options fail validation.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct OptionsValidationError {
    /// The error message.
    pub message: String,
    /// Stable error code (e.g. `TUBES-UNKNOWN-STAGE`).
    pub code: String,
    /// The stages involved in the error.
    pub stages: Vec<String>,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
}

impl OptionsValidationError {
    /// Creates a new validation error.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            stages: Vec::new(),
            fix_hint: None,
        }
    }

    /// Sets the stages involved.
    #[must_use]
    pub fn with_stages(mut self, stages: Vec<String>) -> Self {
        self.stages = stages;
        self
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Converts to a JSON object.
    #[must_use]
    pub fn to_dict(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert("code".to_string(), serde_json::json!(self.code));
        map.insert("message".to_string(), serde_json::json!(self.message));
        map.insert("stages".to_string(), serde_json::json!(self.stages));
        if let Some(ref hint) = self.fix_hint {
            map.insert("fix_hint".to_string(), serde_json::json!(hint));
        }
        serde_json::Value::Object(map)
    }
}

/// Error raised when a step identifier cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid step identifier '{identifier}': {reason}")]
pub struct StepParseError {
    /// The identifier as given.
    pub identifier: String,
    /// Why it was rejected.
    pub reason: String,
}

impl StepParseError {
    /// Creates a new step parse error.
    #[must_use]
    pub fn new(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            reason: reason.into(),
        }
    }
}

/// How an error entered the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorOrigin {
    /// Returned as `Err` from a hook and caught by the invoker.
    Thrown,
    /// Reported through the hook API without aborting the hook.
    Pushed,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Thrown => write!(f, "thrown"),
            Self::Pushed => write!(f, "pushed"),
        }
    }
}

/// A hook failure tagged with the cursor at which it happened.
///
/// This is the only type stored in a run's error sink.
#[derive(Debug, Clone)]
pub struct TubesError {
    message: String,
    cursor: Cursor,
    plugin: Option<String>,
    origin: ErrorOrigin,
    recorded_at: String,
    source: Arc<anyhow::Error>,
}

impl TubesError {
    /// Wraps a hook error.
    #[must_use]
    pub fn new(
        error: anyhow::Error,
        cursor: Cursor,
        plugin: Option<String>,
        origin: ErrorOrigin,
    ) -> Self {
        Self {
            message: error.to_string(),
            cursor,
            plugin,
            origin,
            recorded_at: crate::utils::iso_timestamp(),
            source: Arc::new(error),
        }
    }

    /// The original error's message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The cursor at the moment of failure.
    #[must_use]
    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// Name of the plugin whose hook failed or reported the error.
    #[must_use]
    pub fn plugin(&self) -> Option<&str> {
        self.plugin.as_deref()
    }

    /// How the error entered the sink.
    #[must_use]
    pub fn origin(&self) -> ErrorOrigin {
        self.origin
    }

    /// When the error was recorded (RFC 3339).
    #[must_use]
    pub fn recorded_at(&self) -> &str {
        &self.recorded_at
    }

    /// The wrapped error.
    #[must_use]
    pub fn inner(&self) -> &anyhow::Error {
        &self.source
    }

    /// Messages of the whole cause chain, outermost first.
    #[must_use]
    pub fn chain(&self) -> Vec<String> {
        self.source.chain().map(ToString::to_string).collect()
    }

    /// Converts to a JSON object.
    #[must_use]
    pub fn to_dict(&self) -> serde_json::Value {
        serde_json::json!({
            "name": "TubesError",
            "message": self.message,
            "cursor": self.cursor.to_value(),
            "plugin": self.plugin,
            "origin": self.origin,
            "recorded_at": self.recorded_at,
            "chain": self.chain(),
        })
    }
}

impl fmt::Display for TubesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TubesError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&**self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_tubes_error_wraps_message_and_cursor() {
        let err = TubesError::new(
            anyhow::anyhow!("disk full"),
            Cursor::new("save", "saveAfter", 1),
            Some("store".to_string()),
            ErrorOrigin::Thrown,
        );

        assert_eq!(err.message(), "disk full");
        assert_eq!(err.to_string(), "disk full");
        assert_eq!(err.cursor(), &Cursor::new("save", "saveAfter", 1));
        assert_eq!(err.plugin(), Some("store"));
        assert_eq!(err.origin(), ErrorOrigin::Thrown);
        assert!(err.recorded_at().contains('T'));
    }

    #[test]
    fn test_tubes_error_chain() {
        let inner: anyhow::Result<()> = Err(anyhow::anyhow!("connection reset"));
        let outer = inner.context("fetch failed").unwrap_err();
        let err = TubesError::new(outer, Cursor::default(), None, ErrorOrigin::Pushed);

        assert_eq!(err.chain(), vec!["fetch failed", "connection reset"]);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_tubes_error_to_dict() {
        let err = TubesError::new(
            anyhow::anyhow!("nope"),
            Cursor::new("do", "do", 0),
            None,
            ErrorOrigin::Pushed,
        );
        let dict = err.to_dict();

        assert_eq!(dict["message"], "nope");
        assert_eq!(dict["origin"], "pushed");
        assert_eq!(dict["cursor"]["step"], "do");
        assert_eq!(dict["cursor"]["iteration"], 0);
    }

    #[test]
    fn test_structural_error_messages() {
        let err = StructuralError::FrozenState { key: "foo".to_string() };
        assert_eq!(
            err.to_string(),
            "Cannot assign to read only property 'foo' of frozen state"
        );

        let fatal = FatalError::Structural {
            cursor: Cursor::new("do", "do", 0),
            source: err.clone(),
        };
        assert_eq!(fatal.as_structural(), Some(&err));
        assert!(fatal.to_string().contains("do/do#0"));
    }

    #[test]
    fn test_structural_error_survives_anyhow() {
        let err: anyhow::Error = StructuralError::FrozenContext {
            field: "input".to_string(),
        }
        .into();
        let err = err.context("while handling request");

        assert!(err.downcast_ref::<StructuralError>().is_some());
    }

    #[test]
    fn test_validation_error_to_dict() {
        let err = OptionsValidationError::new("TUBES-UNKNOWN-STAGE", "unknown stage 'x'")
            .with_stages(vec!["x".to_string()])
            .with_fix_hint("Add 'x' to the stage list.");

        let dict = err.to_dict();
        assert_eq!(dict["code"], "TUBES-UNKNOWN-STAGE");
        assert_eq!(dict["stages"][0], "x");
        assert_eq!(dict["fix_hint"], "Add 'x' to the stage list.");

        let fatal: FatalError = err.into();
        assert!(matches!(fatal, FatalError::Validation(_)));
    }
}
