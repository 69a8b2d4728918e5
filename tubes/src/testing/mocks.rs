//! Mock hooks for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use crate::context::{HookApi, HookContext, HookState, State};
use crate::core::{Artifact, Cursor};
use crate::plugins::{Hook, HookResult};

/// One recorded hook call.
#[derive(Debug, Clone, PartialEq)]
pub struct HookCall {
    /// Where the hook ran.
    pub cursor: Cursor,
    /// The artifact it received.
    pub artifact: Artifact,
    /// The state it saw.
    pub state: State,
}

/// Shared, ordered log of hook calls.
///
/// Clones share the same log, so one log can be handed to several hooks to
/// observe their interleaving.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<HookCall>>>,
}

impl CallLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a call.
    pub fn record(&self, call: HookCall) {
        self.calls.lock().push(call);
    }

    /// Returns every call, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<HookCall> {
        self.calls.lock().clone()
    }

    /// Returns the step identifiers of every call, in order.
    #[must_use]
    pub fn steps(&self) -> Vec<String> {
        self.calls.lock().iter().map(|c| c.cursor.step.clone()).collect()
    }

    /// Returns the artifacts of every call, in order.
    #[must_use]
    pub fn artifacts(&self) -> Vec<Artifact> {
        self.calls.lock().iter().map(|c| c.artifact.clone()).collect()
    }

    /// Returns the number of calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.lock().is_empty()
    }

    /// Forgets every call.
    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

/// A hook that records each call and returns a configurable value.
#[derive(Debug, Clone)]
pub struct RecordingHook {
    log: CallLog,
    returns: Option<Artifact>,
}

impl RecordingHook {
    /// Creates a pass-through recording hook.
    #[must_use]
    pub fn new(log: CallLog) -> Self {
        Self { log, returns: None }
    }

    /// Makes the hook return `value` after recording.
    #[must_use]
    pub fn returning(mut self, value: Artifact) -> Self {
        self.returns = Some(value);
        self
    }
}

#[async_trait]
impl Hook for RecordingHook {
    async fn call(
        &self,
        artifact: Artifact,
        state: HookState,
        ctx: HookContext,
        _api: HookApi,
    ) -> HookResult {
        self.log.record(HookCall {
            cursor: ctx.cursor().clone(),
            artifact,
            state: state.snapshot(),
        });
        Ok(self.returns.clone())
    }
}

/// A hook that always returns the same value.
#[derive(Debug, Clone)]
pub struct ConstHook {
    value: Artifact,
}

impl ConstHook {
    /// Creates a constant hook.
    #[must_use]
    pub fn new(value: impl Into<Artifact>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

#[async_trait]
impl Hook for ConstHook {
    async fn call(
        &self,
        _artifact: Artifact,
        _state: HookState,
        _ctx: HookContext,
        _api: HookApi,
    ) -> HookResult {
        Ok(Some(self.value.clone()))
    }
}

/// A hook that always fails with the configured message.
#[derive(Debug, Clone)]
pub struct FailingHook {
    message: String,
}

impl FailingHook {
    /// Creates a failing hook.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl Hook for FailingHook {
    async fn call(
        &self,
        _artifact: Artifact,
        _state: HookState,
        _ctx: HookContext,
        _api: HookApi,
    ) -> HookResult {
        Err(anyhow::anyhow!("{}", self.message))
    }
}

/// A hook that sleeps before returning.
#[derive(Debug, Clone)]
pub struct SlowHook {
    delay: Duration,
    returns: Option<Artifact>,
}

impl SlowHook {
    /// Creates a pass-through hook with the given delay.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            returns: None,
        }
    }

    /// Creates a slow hook with a delay in milliseconds.
    #[must_use]
    pub fn with_delay_ms(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Makes the hook return `value` after sleeping.
    #[must_use]
    pub fn returning(mut self, value: Artifact) -> Self {
        self.returns = Some(value);
        self
    }
}

#[async_trait]
impl Hook for SlowHook {
    async fn call(
        &self,
        _artifact: Artifact,
        _state: HookState,
        _ctx: HookContext,
        _api: HookApi,
    ) -> HookResult {
        tokio::time::sleep(self.delay).await;
        Ok(self.returns.clone())
    }
}
