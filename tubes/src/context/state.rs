//! Run state: the shared key/value record and the handle hooks receive.

use super::tripwire::Tripwire;
use crate::errors::StructuralError;
use parking_lot::RwLock;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Caller-defined key/value record threaded through every hook.
pub type State = serde_json::Map<String, Value>;

/// The run's single state record, shared by every parallel branch.
#[derive(Debug, Clone, Default)]
pub(crate) struct SharedState {
    data: Arc<RwLock<State>>,
}

impl SharedState {
    pub(crate) fn new(initial: State) -> Self {
        Self {
            data: Arc::new(RwLock::new(initial)),
        }
    }

    pub(crate) fn snapshot(&self) -> State {
        self.data.read().clone()
    }

    pub(crate) fn get(&self, key: &str) -> Option<Value> {
        self.data.read().get(key).cloned()
    }

    /// Shallow merge; the patch wins on every key it carries.
    pub(crate) fn merge(&self, patch: State) {
        self.data.write().extend(patch);
    }

    pub(crate) fn insert(&self, key: String, value: Value) {
        self.data.write().insert(key, value);
    }

    pub(crate) fn remove(&self, key: &str) -> Option<Value> {
        self.data.write().remove(key)
    }
}

#[derive(Clone)]
enum StateView {
    Live(SharedState),
    Frozen {
        snapshot: Arc<State>,
        tripwire: Tripwire,
    },
}

/// A hook's handle on the run state.
///
/// Without `freeze` the handle reads and writes the live shared record.
/// Under `freeze` it holds a snapshot taken just before the hook was called
/// and every write returns [`StructuralError::FrozenState`]. The violation
/// aborts the run whether or not the hook propagates the error. Merging through
/// [`crate::context::HookApi::set_state`] is allowed in both modes.
#[derive(Clone)]
pub struct HookState {
    view: StateView,
}

impl HookState {
    pub(crate) fn live(shared: SharedState) -> Self {
        Self {
            view: StateView::Live(shared),
        }
    }

    pub(crate) fn frozen(snapshot: State, tripwire: Tripwire) -> Self {
        Self {
            view: StateView::Frozen {
                snapshot: Arc::new(snapshot),
                tripwire,
            },
        }
    }

    /// Returns a copy of the value under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        match &self.view {
            StateView::Live(shared) => shared.get(key),
            StateView::Frozen { snapshot, .. } => snapshot.get(key).cloned(),
        }
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Returns a copy of the whole record.
    #[must_use]
    pub fn snapshot(&self) -> State {
        match &self.view {
            StateView::Live(shared) => shared.snapshot(),
            StateView::Frozen { snapshot, .. } => (**snapshot).clone(),
        }
    }

    /// Whether writes through this handle are rejected.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        matches!(self.view, StateView::Frozen { .. })
    }

    /// Writes a key directly.
    ///
    /// # Errors
    ///
    /// Returns [`StructuralError::FrozenState`] when the handle is frozen.
    pub fn set(&self, key: impl Into<String>, value: Value) -> Result<(), StructuralError> {
        let key = key.into();
        match &self.view {
            StateView::Live(shared) => {
                shared.insert(key, value);
                Ok(())
            }
            StateView::Frozen { tripwire, .. } => {
                Err(tripwire.trip(StructuralError::FrozenState { key }))
            }
        }
    }

    /// Removes a key directly.
    ///
    /// # Errors
    ///
    /// Returns [`StructuralError::FrozenState`] when the handle is frozen.
    pub fn remove(&self, key: &str) -> Result<Option<Value>, StructuralError> {
        match &self.view {
            StateView::Live(shared) => Ok(shared.remove(key)),
            StateView::Frozen { tripwire, .. } => Err(tripwire.trip(StructuralError::FrozenState {
                key: key.to_string(),
            })),
        }
    }
}

impl fmt::Debug for HookState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookState")
            .field("frozen", &self.is_frozen())
            .field("state", &self.snapshot())
            .finish()
    }
}
