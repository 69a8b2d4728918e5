//! Cursor locating a hook invocation.

use super::StepId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies which hook, within which step of which stage, is executing.
///
/// `iteration` is the hook's position in the ordered hook list of its step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Cursor {
    /// The stage name, empty before the first hook runs.
    pub stage: String,
    /// The step identifier (e.g. `doBefore`), empty before the first hook runs.
    pub step: String,
    /// Index of the hook within its step.
    pub iteration: usize,
}

impl Cursor {
    /// Creates a cursor.
    #[must_use]
    pub fn new(stage: impl Into<String>, step: impl Into<String>, iteration: usize) -> Self {
        Self {
            stage: stage.into(),
            step: step.into(),
            iteration,
        }
    }

    /// Creates the cursor for the hook at `iteration` of `step`.
    #[must_use]
    pub fn at(step: &StepId, iteration: usize) -> Self {
        Self {
            stage: step.stage.clone(),
            step: step.name(),
            iteration,
        }
    }

    /// Whether the cursor has not been positioned on any hook yet.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.stage.is_empty() && self.step.is_empty()
    }

    /// Converts to a JSON object.
    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "stage": self.stage,
            "step": self.step,
            "iteration": self.iteration,
        })
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.stage, self.step, self.iteration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_at_step() {
        let cursor = Cursor::at(&StepId::before("load"), 2);
        assert_eq!(cursor, Cursor::new("load", "loadBefore", 2));
        assert_eq!(cursor.to_string(), "load/loadBefore#2");
    }

    #[test]
    fn test_default_cursor_is_idle() {
        assert!(Cursor::default().is_idle());
        assert!(!Cursor::at(&StepId::main("x"), 0).is_idle());
    }

    #[test]
    fn test_cursor_to_value() {
        let value = Cursor::new("do", "do", 0).to_value();
        assert_eq!(value, serde_json::json!({"stage": "do", "step": "do", "iteration": 0}));
    }
}
