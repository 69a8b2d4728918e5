//! Per-call record of contract violations.

use crate::errors::StructuralError;
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Holds the first structural violation raised through one hook call's
/// handles.
///
/// The state handle, context view and API of a call share one tripwire. The
/// invoker checks it once the hook returns, so a violation aborts the run
/// even if the hook discarded or rewrapped the error it was given.
#[derive(Debug, Clone, Default)]
pub(crate) struct Tripwire(Arc<OnceCell<StructuralError>>);

impl Tripwire {
    /// Records `error` unless an earlier violation is already held, and hands
    /// it back to the caller.
    pub(crate) fn trip(&self, error: StructuralError) -> StructuralError {
        self.0.get_or_init(|| error.clone());
        error
    }

    pub(crate) fn tripped(&self) -> Option<&StructuralError> {
        self.0.get()
    }
}
