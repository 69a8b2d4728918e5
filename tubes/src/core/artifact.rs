//! The artifact value threaded through a pipeline.

use serde_json::Value;

/// The value flowing through the pipeline, transformed stage by stage.
pub type Artifact = Value;

/// Script-style truthiness used by the main step's short-circuit.
///
/// `null`, `false`, zero and the empty string are falsy. Everything else,
/// including empty arrays and objects, is truthy.
#[must_use]
pub fn is_truthy(value: &Artifact) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Splits an artifact into the inputs of a parallel group.
///
/// Arrays fan out element-wise; any other value becomes a single branch.
#[must_use]
pub fn into_branches(artifact: Artifact) -> Vec<Artifact> {
    match artifact {
        Value::Array(items) => items,
        other => vec![other],
    }
}
