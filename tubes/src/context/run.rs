//! Run-scoped context shared by every hook and branch of one run.

use super::state::{HookState, SharedState, State};
use super::tripwire::Tripwire;
use super::view::{HookContext, OptionsSnapshot};
use crate::core::{Artifact, Cursor, StepId};
use crate::errors::{StructuralError, TubesError};
use crate::pipeline::{Options, StageCatalog};
use crate::plugins::{BoundHook, Plugin, PluginRegistry};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Everything one run owns: input, error sink, state, plugin table.
///
/// Created once per `tubes()` call and shared by reference across parallel
/// branches. Locks are only held for the duration of a single read or
/// write, never across an await point.
pub(crate) struct RunContext {
    run_id: Uuid,
    input: RwLock<Arc<Artifact>>,
    errors: Mutex<Vec<TubesError>>,
    state: SharedState,
    registry: PluginRegistry,
    options: Arc<Options>,
    catalog: Arc<StageCatalog>,
}

impl RunContext {
    pub(crate) fn new(
        input: Artifact,
        initial_state: State,
        options: Arc<Options>,
        catalog: Arc<StageCatalog>,
    ) -> Self {
        Self {
            run_id: crate::utils::generate_run_id(),
            input: RwLock::new(Arc::new(input)),
            errors: Mutex::new(Vec::new()),
            state: SharedState::new(initial_state),
            registry: PluginRegistry::from_plugins(options.plugins().iter().cloned()),
            options,
            catalog,
        }
    }

    pub(crate) fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub(crate) fn catalog(&self) -> &StageCatalog {
        &self.catalog
    }

    pub(crate) fn is_frozen(&self) -> bool {
        self.options.freeze()
    }

    pub(crate) fn hooks_for(&self, step: &StepId) -> Vec<BoundHook> {
        self.registry.hooks_for(step)
    }

    pub(crate) fn record_error(&self, error: TubesError) {
        self.errors.lock().push(error);
    }

    pub(crate) fn errors_snapshot(&self) -> Vec<TubesError> {
        self.errors.lock().clone()
    }

    pub(crate) fn take_errors(&self) -> Vec<TubesError> {
        std::mem::take(&mut *self.errors.lock())
    }

    #[cfg(test)]
    pub(crate) fn state_snapshot(&self) -> State {
        self.state.snapshot()
    }

    pub(crate) fn merge_state(&self, patch: State) {
        self.state.merge(patch);
    }

    pub(crate) fn input(&self) -> Arc<Artifact> {
        self.input.read().clone()
    }

    pub(crate) fn replace_input(&self, input: Artifact) {
        *self.input.write() = Arc::new(input);
    }

    /// Validates and registers a plugin for the rest of the run.
    pub(crate) fn add_plugin(&self, plugin: Plugin) -> Result<(), StructuralError> {
        self.catalog
            .validate_plugin(&plugin)
            .map_err(|err| StructuralError::InvalidPlugin {
                plugin: plugin.name().to_string(),
                reason: err.message,
            })?;
        let name = plugin.name().to_string();
        self.registry.register(Arc::new(plugin));
        self.notify(
            "plugin.added",
            serde_json::json!({ "plugin": name, "plugins": self.registry.len() }),
        );
        Ok(())
    }

    pub(crate) fn options_snapshot(&self) -> OptionsSnapshot {
        OptionsSnapshot {
            stages: self.options.stages().to_vec(),
            plugins: self.registry.plugin_names(),
            freeze: self.options.freeze(),
            lifecycle_steps: self.options.lifecycle_steps(),
        }
    }

    /// Builds the state handle and context view for one hook call.
    ///
    /// Under `freeze` both are detached copies that reject writes, recording
    /// each rejected write on `tripwire`.
    pub(crate) fn views(
        self: &Arc<Self>,
        cursor: Cursor,
        tripwire: &Tripwire,
    ) -> (HookState, HookContext) {
        let frozen = self.is_frozen();
        let state = if frozen {
            HookState::frozen(self.state.snapshot(), tripwire.clone())
        } else {
            HookState::live(self.state.clone())
        };
        let ctx = HookContext::new(
            self.run_id,
            cursor,
            self.input(),
            self.errors_snapshot(),
            self.options_snapshot(),
            (!frozen).then(|| Arc::clone(self)),
            tripwire.clone(),
        );
        (state, ctx)
    }

    /// Emits an event without awaiting, tagging the payload with the run id.
    pub(crate) fn notify(&self, event_type: &str, data: Value) {
        self.options
            .event_sink()
            .try_emit(event_type, Some(self.tag(data)));
    }

    /// Emits an event through the sink's async path.
    pub(crate) async fn emit(&self, event_type: &str, data: Value) {
        let sink = Arc::clone(self.options.event_sink());
        sink.emit(event_type, Some(self.tag(data))).await;
    }

    fn tag(&self, data: Value) -> Value {
        match data {
            Value::Object(mut map) => {
                map.insert("run_id".to_string(), Value::String(self.run_id.to_string()));
                Value::Object(map)
            }
            other => serde_json::json!({ "run_id": self.run_id.to_string(), "data": other }),
        }
    }
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("run_id", &self.run_id)
            .field("errors", &self.errors.lock().len())
            .field("registry", &self.registry)
            .field("freeze", &self.is_frozen())
            .finish_non_exhaustive()
    }
}
