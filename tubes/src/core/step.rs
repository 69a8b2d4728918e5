//! Step kinds and step identifiers.

use crate::errors::StepParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One sub-phase of a stage's execution.
///
/// Every stage expands into `<stage>Before`, `<stage>` and `<stage>After`.
/// When lifecycle steps are enabled the sequence is bracketed by the
/// observer steps `<stage>Start` and `<stage>End`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Observer step that runs before everything else in the stage.
    Start,
    /// Runs every bound hook, piping the artifact.
    Before,
    /// The main step; stops at the first hook that yields a truthy artifact.
    Main,
    /// Runs every bound hook, piping the artifact.
    After,
    /// Observer step that runs after everything else in the stage.
    End,
}

const CORE_SEQUENCE: [StepKind; 3] = [StepKind::Before, StepKind::Main, StepKind::After];

const LIFECYCLE_SEQUENCE: [StepKind; 5] = [
    StepKind::Start,
    StepKind::Before,
    StepKind::Main,
    StepKind::After,
    StepKind::End,
];

/// Suffixes a stage name may not end with, so step identifiers stay unambiguous.
pub const RESERVED_SUFFIXES: [&str; 4] = ["Before", "After", "Start", "End"];

impl StepKind {
    /// Returns the steps a stage executes, in order.
    #[must_use]
    pub fn sequence(lifecycle_steps: bool) -> &'static [StepKind] {
        if lifecycle_steps {
            &LIFECYCLE_SEQUENCE
        } else {
            &CORE_SEQUENCE
        }
    }

    /// The suffix appended to the stage name to form the step identifier.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::Before => "Before",
            Self::Main => "",
            Self::After => "After",
            Self::End => "End",
        }
    }

    /// Observer steps never replace the artifact.
    #[must_use]
    pub const fn is_observer(self) -> bool {
        matches!(self, Self::Start | Self::End)
    }

    /// Whether the step stops once a hook leaves a truthy artifact.
    #[must_use]
    pub const fn short_circuits(self) -> bool {
        matches!(self, Self::Main)
    }

    /// Whether the step only exists when lifecycle steps are enabled.
    #[must_use]
    pub const fn is_lifecycle(self) -> bool {
        self.is_observer()
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Before => write!(f, "before"),
            Self::Main => write!(f, "main"),
            Self::After => write!(f, "after"),
            Self::End => write!(f, "end"),
        }
    }
}

/// A fully qualified step: a stage name plus a step kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StepId {
    /// The stage this step belongs to.
    pub stage: String,
    /// Which step of the stage.
    pub kind: StepKind,
}

impl StepId {
    /// Creates a step identifier.
    #[must_use]
    pub fn new(stage: impl Into<String>, kind: StepKind) -> Self {
        Self {
            stage: stage.into(),
            kind,
        }
    }

    /// The `<stage>Before` step.
    #[must_use]
    pub fn before(stage: impl Into<String>) -> Self {
        Self::new(stage, StepKind::Before)
    }

    /// The `<stage>` main step.
    #[must_use]
    pub fn main(stage: impl Into<String>) -> Self {
        Self::new(stage, StepKind::Main)
    }

    /// The `<stage>After` step.
    #[must_use]
    pub fn after(stage: impl Into<String>) -> Self {
        Self::new(stage, StepKind::After)
    }

    /// The step identifier as plugins name it, e.g. `doBefore`.
    #[must_use]
    pub fn name(&self) -> String {
        format!("{}{}", self.stage, self.kind.suffix())
    }

    /// Parses a step identifier such as `doBefore` or `do`.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is empty or is a bare suffix.
    pub fn parse(identifier: &str) -> Result<Self, StepParseError> {
        if identifier.trim().is_empty() {
            return Err(StepParseError::new(identifier, "step identifier is empty"));
        }

        let suffixed = [
            StepKind::Before,
            StepKind::After,
            StepKind::Start,
            StepKind::End,
        ];
        for kind in suffixed {
            if let Some(stage) = identifier.strip_suffix(kind.suffix()) {
                if stage.is_empty() {
                    return Err(StepParseError::new(
                        identifier,
                        "step identifier has no stage name before its suffix",
                    ));
                }
                return Ok(Self::new(stage, kind));
            }
        }

        Ok(Self::main(identifier))
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.stage, self.kind.suffix())
    }
}

impl FromStr for StepId {
    type Err = StepParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_names() {
        assert_eq!(StepId::before("do").name(), "doBefore");
        assert_eq!(StepId::main("do").name(), "do");
        assert_eq!(StepId::after("do").name(), "doAfter");
        assert_eq!(StepId::new("do", StepKind::Start).to_string(), "doStart");
        assert_eq!(StepId::new("do", StepKind::End).to_string(), "doEnd");
    }

    #[test]
    fn test_parse_suffixed_identifiers() {
        assert_eq!(StepId::parse("fetchBefore").unwrap(), StepId::before("fetch"));
        assert_eq!(StepId::parse("fetchAfter").unwrap(), StepId::after("fetch"));
        assert_eq!(
            "fetchStart".parse::<StepId>().unwrap(),
            StepId::new("fetch", StepKind::Start)
        );
        assert_eq!(
            "fetchEnd".parse::<StepId>().unwrap(),
            StepId::new("fetch", StepKind::End)
        );
    }

    #[test]
    fn test_parse_main_identifier() {
        assert_eq!(StepId::parse("fetch").unwrap(), StepId::main("fetch"));
        // lowercase suffix-lookalikes belong to the stage name
        assert_eq!(StepId::parse("append").unwrap(), StepId::main("append"));
    }

    #[test]
    fn test_parse_rejects_bare_suffix_and_empty() {
        assert!(StepId::parse("Before").is_err());
        assert!(StepId::parse("").is_err());
        assert!(StepId::parse("   ").is_err());
    }

    #[test]
    fn test_sequences() {
        assert_eq!(
            StepKind::sequence(false),
            &[StepKind::Before, StepKind::Main, StepKind::After]
        );
        assert_eq!(StepKind::sequence(true).len(), 5);
        assert_eq!(StepKind::sequence(true)[0], StepKind::Start);
        assert_eq!(StepKind::sequence(true)[4], StepKind::End);
    }

    #[test]
    fn test_step_kind_flags() {
        assert!(StepKind::Main.short_circuits());
        assert!(!StepKind::Before.short_circuits());
        assert!(StepKind::Start.is_observer());
        assert!(StepKind::End.is_lifecycle());
        assert!(!StepKind::After.is_observer());
    }
}
