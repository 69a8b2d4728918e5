//! Test fixtures for pipeline testing.

use std::sync::Arc;

use crate::context::State;
use crate::core::{Artifact, TubesResult};
use crate::errors::FatalError;
use crate::events::CollectingEventSink;
use crate::pipeline::{tubes, Options, StageSpec};
use crate::plugins::Plugin;

/// Builds and runs a pipeline with an event collector attached.
#[derive(Debug)]
pub struct TestPipeline {
    options: Options,
    state: State,
    events: Arc<CollectingEventSink>,
}

impl TestPipeline {
    /// Creates a fixture for the given stage list.
    #[must_use]
    pub fn new<I, S>(stages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<StageSpec>,
    {
        let events = Arc::new(CollectingEventSink::new());
        Self {
            options: Options::new()
                .with_stages(stages)
                .with_event_sink(events.clone()),
            state: State::new(),
            events,
        }
    }

    /// Adds a plugin.
    #[must_use]
    pub fn with_plugin(mut self, plugin: Plugin) -> Self {
        self.options = self.options.with_plugin(plugin);
        self
    }

    /// Seeds one initial state key.
    #[must_use]
    pub fn with_state(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.state.insert(key.into(), value);
        self
    }

    /// Enables freeze.
    #[must_use]
    pub fn frozen(mut self) -> Self {
        self.options = self.options.with_freeze(true);
        self
    }

    /// Enables Start/End observer steps.
    #[must_use]
    pub fn with_lifecycle_steps(mut self) -> Self {
        self.options = self.options.with_lifecycle_steps(true);
        self
    }

    /// The events collected so far.
    #[must_use]
    pub fn events(&self) -> &CollectingEventSink {
        &self.events
    }

    /// Runs the pipeline.
    pub async fn run(&self, input: impl Into<Artifact>) -> Result<TubesResult, FatalError> {
        tubes(input, self.options.clone(), Some(self.state.clone())).await
    }

    /// Runs the pipeline, panicking on a fatal error.
    pub async fn run_ok(&self, input: impl Into<Artifact>) -> TubesResult {
        match self.run(input).await {
            Ok(result) => result,
            Err(err) => panic!("pipeline aborted: {err}"),
        }
    }
}
