//! The value returned by a pipeline run.

use super::{Artifact, Cursor};
use crate::errors::TubesError;

/// Outcome of a pipeline run: the final artifact plus every recorded error.
///
/// A run with errors still carries a best-effort output.
#[derive(Debug, Clone)]
pub struct TubesResult {
    /// Errors recorded during the run, in the order they were recorded.
    pub errors: Vec<TubesError>,
    /// The final artifact.
    pub output: Artifact,
}

impl TubesResult {
    /// Creates a result.
    #[must_use]
    pub fn new(errors: Vec<TubesError>, output: Artifact) -> Self {
        Self { errors, output }
    }

    /// Whether the run recorded no errors.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Cursors of every recorded error, in recording order.
    #[must_use]
    pub fn error_cursors(&self) -> Vec<&Cursor> {
        self.errors.iter().map(TubesError::cursor).collect()
    }

    /// Splits the result into its errors and output.
    #[must_use]
    pub fn into_parts(self) -> (Vec<TubesError>, Artifact) {
        (self.errors, self.output)
    }

    /// Converts to a JSON object.
    #[must_use]
    pub fn to_dict(&self) -> serde_json::Value {
        serde_json::json!({
            "errors": self.errors.iter().map(TubesError::to_dict).collect::<Vec<_>>(),
            "output": self.output,
        })
    }
}
