//! Branch task group for parallel stage groups.

use crate::errors::FatalError;
use futures::stream::{FuturesUnordered, StreamExt};
use std::any::Any;
use std::fmt;
use std::future::Future;
use tokio::task::{AbortHandle, JoinError, JoinHandle};

/// One tokio task per branch, joined in spawn order.
///
/// The first fatal error aborts every sibling still running. Dropping the
/// group while joining (because an enclosing group was aborted) aborts the
/// branches too.
pub(crate) struct BranchGroup<T> {
    handles: Vec<JoinHandle<Result<T, FatalError>>>,
}

impl<T: Send + 'static> BranchGroup<T> {
    pub(crate) fn new() -> Self {
        Self {
            handles: Vec::new(),
        }
    }

    /// Spawns a branch.
    pub(crate) fn spawn<F>(&mut self, branch: F)
    where
        F: Future<Output = Result<T, FatalError>> + Send + 'static,
    {
        self.handles.push(tokio::spawn(branch));
    }

    /// Waits for every branch and returns their outputs in spawn order.
    ///
    /// Branches complete in any order; the first failure to complete wins.
    pub(crate) async fn join_ordered(self) -> Result<Vec<T>, FatalError> {
        let width = self.handles.len();
        let _guard = AbortOnDrop(self.handles.iter().map(JoinHandle::abort_handle).collect());

        let mut pending: FuturesUnordered<_> = self
            .handles
            .into_iter()
            .enumerate()
            .map(|(index, handle)| async move { (index, handle.await) })
            .collect();

        let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(width).collect();
        while let Some((index, joined)) = pending.next().await {
            let output = joined.map_err(|err| FatalError::BranchAborted {
                index,
                reason: describe_join_error(err),
            })??;
            slots[index] = Some(output);
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| FatalError::Internal(format!("branch {index} produced no output")))
            })
            .collect()
    }
}

impl<T> fmt::Debug for BranchGroup<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BranchGroup")
            .field("branches", &self.handles.len())
            .finish()
    }
}

struct AbortOnDrop(Vec<AbortHandle>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

fn describe_join_error(err: JoinError) -> String {
    if err.is_cancelled() {
        return "branch task was cancelled".to_string();
    }
    match err.try_into_panic() {
        Ok(payload) => format!("branch panicked: {}", panic_message(payload.as_ref())),
        Err(err) => err.to_string(),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
