//! Stage specifications and the validated stage catalog.

use crate::core::{StepId, StepKind, RESERVED_SUFFIXES};
use crate::errors::OptionsValidationError;
use crate::plugins::Plugin;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

static STAGE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("stage name pattern is valid")
});

/// One element of a pipeline definition.
///
/// Serialized untagged: a stage is a string, a parallel group is an array,
/// so `["just", ["do"]]` is a stage followed by a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StageSpec {
    /// A single named stage.
    Stage(String),
    /// A sub-pipeline run once per element of the incoming artifact.
    Group(Vec<StageSpec>),
}

impl StageSpec {
    /// Creates a single-stage spec.
    #[must_use]
    pub fn stage(name: impl Into<String>) -> Self {
        Self::Stage(name.into())
    }

    /// Creates a parallel group from its sub-pipeline.
    #[must_use]
    pub fn group(specs: impl IntoIterator<Item = impl Into<StageSpec>>) -> Self {
        Self::Group(specs.into_iter().map(Into::into).collect())
    }

    /// Whether this is a parallel group.
    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }

    /// Collects every stage name in this spec, depth first.
    pub fn collect_stage_names<'a>(&'a self, into: &mut Vec<&'a str>) {
        match self {
            Self::Stage(name) => into.push(name),
            Self::Group(specs) => {
                for spec in specs {
                    spec.collect_stage_names(into);
                }
            }
        }
    }
}

impl From<&str> for StageSpec {
    fn from(name: &str) -> Self {
        Self::Stage(name.to_string())
    }
}

impl From<String> for StageSpec {
    fn from(name: String) -> Self {
        Self::Stage(name)
    }
}

impl From<Vec<StageSpec>> for StageSpec {
    fn from(specs: Vec<StageSpec>) -> Self {
        Self::Group(specs)
    }
}

impl fmt::Display for StageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stage(name) => write!(f, "{name}"),
            Self::Group(specs) => {
                write!(f, "[")?;
                for (i, spec) in specs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{spec}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// The validated set of stages of a pipeline and their step plans.
///
/// Step identifiers are computed once here rather than per invocation.
#[derive(Debug, Clone)]
pub struct StageCatalog {
    stages: BTreeSet<String>,
    step_plan: HashMap<String, Vec<StepId>>,
    lifecycle_steps: bool,
}

impl StageCatalog {
    /// Validates stage names and builds the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if a stage name is not an identifier or ends in a
    /// reserved step suffix.
    pub fn build(specs: &[StageSpec], lifecycle_steps: bool) -> Result<Self, OptionsValidationError> {
        let mut names = Vec::new();
        for spec in specs {
            spec.collect_stage_names(&mut names);
        }

        let mut stages = BTreeSet::new();
        let mut step_plan = HashMap::new();
        for name in names {
            validate_stage_name(name)?;
            if stages.insert(name.to_string()) {
                let steps = StepKind::sequence(lifecycle_steps)
                    .iter()
                    .map(|kind| StepId::new(name, *kind))
                    .collect();
                step_plan.insert(name.to_string(), steps);
            }
        }

        Ok(Self {
            stages,
            step_plan,
            lifecycle_steps,
        })
    }

    /// Returns the steps of a stage, in execution order.
    #[must_use]
    pub fn steps_for(&self, stage: &str) -> &[StepId] {
        self.step_plan.get(stage).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether the pipeline contains a stage.
    #[must_use]
    pub fn contains(&self, stage: &str) -> bool {
        self.stages.contains(stage)
    }

    /// Returns every distinct stage name, sorted.
    #[must_use]
    pub fn stage_names(&self) -> Vec<String> {
        self.stages.iter().cloned().collect()
    }

    /// Whether Start/End observer steps are part of the plan.
    #[must_use]
    pub fn lifecycle_steps(&self) -> bool {
        self.lifecycle_steps
    }

    /// Checks that every step a plugin binds exists in this pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first unknown step.
    pub fn validate_plugin(&self, plugin: &Plugin) -> Result<(), OptionsValidationError> {
        for step in plugin.steps() {
            if !self.contains(&step.stage) {
                return Err(OptionsValidationError::new(
                    "TUBES-UNKNOWN-STAGE",
                    format!(
                        "Plugin '{}' binds '{}' but the pipeline has no stage '{}'",
                        plugin.name(),
                        step,
                        step.stage
                    ),
                )
                .with_stages(vec![step.stage.clone()])
                .with_fix_hint("Add the stage to the pipeline or remove the hook from the plugin."));
            }
            if step.kind.is_lifecycle() && !self.lifecycle_steps {
                return Err(OptionsValidationError::new(
                    "TUBES-LIFECYCLE-DISABLED",
                    format!(
                        "Plugin '{}' binds '{}' but lifecycle steps are disabled",
                        plugin.name(),
                        step
                    ),
                )
                .with_stages(vec![step.stage.clone()])
                .with_fix_hint("Enable lifecycle steps in the options to use Start/End hooks."));
            }
        }
        Ok(())
    }
}

fn validate_stage_name(name: &str) -> Result<(), OptionsValidationError> {
    if !STAGE_NAME.is_match(name) {
        return Err(OptionsValidationError::new(
            "TUBES-INVALID-STAGE-NAME",
            format!("Stage name '{name}' is not a valid identifier"),
        )
        .with_stages(vec![name.to_string()])
        .with_fix_hint("Use letters, digits and underscores, starting with a letter or underscore."));
    }
    if let Some(suffix) = RESERVED_SUFFIXES.iter().find(|s| name.ends_with(*s)) {
        return Err(OptionsValidationError::new(
            "TUBES-RESERVED-SUFFIX",
            format!("Stage name '{name}' ends with the reserved step suffix '{suffix}'"),
        )
        .with_stages(vec![name.to_string()])
        .with_fix_hint("Rename the stage so its step identifiers stay unambiguous."));
    }
    Ok(())
}
