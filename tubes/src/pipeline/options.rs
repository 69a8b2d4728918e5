//! Run options and their serde configuration form.

use super::{StageCatalog, StageSpec};
use crate::errors::OptionsValidationError;
use crate::events::{EventSink, NoOpEventSink};
use crate::plugins::Plugin;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Options for a pipeline run.
///
/// ```rust,ignore
/// let options = Options::new()
///     .with_stages(["load", "render"])
///     .with_plugin(renderer)
///     .with_freeze(true);
/// ```
#[derive(Clone)]
pub struct Options {
    stages: Vec<StageSpec>,
    plugins: Vec<Arc<Plugin>>,
    freeze: bool,
    lifecycle_steps: bool,
    event_sink: Arc<dyn EventSink>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            stages: Vec::new(),
            plugins: Vec::new(),
            freeze: false,
            lifecycle_steps: false,
            event_sink: Arc::new(NoOpEventSink),
        }
    }
}

impl Options {
    /// Creates empty options: no stages, no plugins, not frozen.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds options from a parsed configuration.
    #[must_use]
    pub fn from_config(config: TubesConfig) -> Self {
        Self::new()
            .with_stages(config.stages)
            .with_freeze(config.freeze)
            .with_lifecycle_steps(config.lifecycle_steps)
    }

    /// Replaces the stage list.
    #[must_use]
    pub fn with_stages<I, S>(mut self, stages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<StageSpec>,
    {
        self.stages = stages.into_iter().map(Into::into).collect();
        self
    }

    /// Appends a stage or group.
    #[must_use]
    pub fn with_stage(mut self, stage: impl Into<StageSpec>) -> Self {
        self.stages.push(stage.into());
        self
    }

    /// Appends a plugin.
    #[must_use]
    pub fn with_plugin(mut self, plugin: Plugin) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    /// Appends several plugins, in order.
    #[must_use]
    pub fn with_plugins(mut self, plugins: impl IntoIterator<Item = Plugin>) -> Self {
        self.plugins.extend(plugins.into_iter().map(Arc::new));
        self
    }

    /// Hands hooks frozen snapshots of state and context.
    #[must_use]
    pub fn with_freeze(mut self, freeze: bool) -> Self {
        self.freeze = freeze;
        self
    }

    /// Adds the `<stage>Start` and `<stage>End` observer steps.
    #[must_use]
    pub fn with_lifecycle_steps(mut self, enabled: bool) -> Self {
        self.lifecycle_steps = enabled;
        self
    }

    /// Sets the sink receiving engine events.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// The stage list.
    #[must_use]
    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    /// The plugins, in registration order.
    #[must_use]
    pub fn plugins(&self) -> &[Arc<Plugin>] {
        &self.plugins
    }

    /// Whether hooks receive frozen snapshots.
    #[must_use]
    pub fn freeze(&self) -> bool {
        self.freeze
    }

    /// Whether Start/End observer steps run.
    #[must_use]
    pub fn lifecycle_steps(&self) -> bool {
        self.lifecycle_steps
    }

    /// The event sink.
    #[must_use]
    pub fn event_sink(&self) -> &Arc<dyn EventSink> {
        &self.event_sink
    }

    /// Validates stage names and plugin bindings.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure found.
    pub fn validate(&self) -> Result<StageCatalog, OptionsValidationError> {
        let catalog = StageCatalog::build(&self.stages, self.lifecycle_steps)?;
        for plugin in &self.plugins {
            catalog.validate_plugin(plugin)?;
        }
        Ok(catalog)
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("stages", &self.stages)
            .field(
                "plugins",
                &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field("freeze", &self.freeze)
            .field("lifecycle_steps", &self.lifecycle_steps)
            .finish_non_exhaustive()
    }
}

/// The serializable part of [`Options`].
///
/// Plugins carry code and are attached after loading:
///
/// ```rust,ignore
/// let config = TubesConfig::from_json_str(r#"{"stages": ["load", ["render"]], "freeze": true}"#)?;
/// let options = config.into_options().with_plugin(renderer);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TubesConfig {
    /// The stage list.
    pub stages: Vec<StageSpec>,
    /// Whether hooks receive frozen snapshots.
    pub freeze: bool,
    /// Whether Start/End observer steps run.
    pub lifecycle_steps: bool,
}

impl TubesConfig {
    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed JSON or unknown fields.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Converts into options without plugins.
    #[must_use]
    pub fn into_options(self) -> Options {
        Options::from_config(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::FnHook;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let options = Options::new();
        assert!(options.stages().is_empty());
        assert!(options.plugins().is_empty());
        assert!(!options.freeze());
        assert!(!options.lifecycle_steps());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_builder_appends() {
        let options = Options::new()
            .with_stages(["a"])
            .with_stage(StageSpec::group(["b"]))
            .with_plugins([Plugin::new("one"), Plugin::new("two")]);

        assert_eq!(
            options.stages(),
            &[StageSpec::stage("a"), StageSpec::group(["b"])]
        );
        let names: Vec<&str> = options.plugins().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["one", "two"]);
    }

    #[test]
    fn test_validate_rejects_plugin_for_unknown_stage() {
        let options = Options::new()
            .with_stages(["do"])
            .with_plugin(Plugin::new("p").after("undo", FnHook::new(|_, _, _, _| Ok(None))));

        let err = options.validate().unwrap_err();
        assert_eq!(err.code, "TUBES-UNKNOWN-STAGE");
        assert_eq!(err.stages, vec!["undo"]);
    }

    #[test]
    fn test_config_from_json() {
        let config = TubesConfig::from_json_str(
            r#"{"stages": ["just", ["do"]], "freeze": true}"#,
        )
        .unwrap();

        assert!(config.freeze);
        assert!(!config.lifecycle_steps);

        let options = config.into_options();
        assert_eq!(options.stages().len(), 2);
        assert!(options.stages()[1].is_group());
        assert!(options.freeze());
    }

    #[test]
    fn test_config_rejects_unknown_fields() {
        assert!(TubesConfig::from_json_str(r#"{"stages": [], "retries": 3}"#).is_err());
        assert_eq!(TubesConfig::from_json_str("{}").unwrap(), TubesConfig::default());
    }
}
