//! Hook trait and closure adapters.

use crate::context::{HookApi, HookContext, HookState};
use crate::core::Artifact;
use async_trait::async_trait;
use std::fmt::{self, Debug};
use std::future::Future;
use std::marker::PhantomData;

/// What a hook returns.
///
/// `Ok(None)` passes the artifact through unchanged, `Ok(Some(value))`
/// replaces it, and `Err` is recorded in the run's error sink (unless it is a
/// [`crate::errors::StructuralError`], which aborts the run).
pub type HookResult = anyhow::Result<Option<Artifact>>;

/// A function bound to a step by a plugin.
#[async_trait]
pub trait Hook: Send + Sync {
    /// Runs the hook.
    ///
    /// # Arguments
    ///
    /// * `artifact` - The current artifact
    /// * `state` - Handle on the run state (a frozen snapshot under `freeze`)
    /// * `ctx` - Read-only view of the run with the current cursor
    /// * `api` - Mutation API for the run
    async fn call(
        &self,
        artifact: Artifact,
        state: HookState,
        ctx: HookContext,
        api: HookApi,
    ) -> HookResult;
}

/// A hook backed by a synchronous closure.
pub struct FnHook<F>
where
    F: Fn(Artifact, &HookState, &HookContext, &HookApi) -> HookResult + Send + Sync,
{
    func: F,
}

impl<F> FnHook<F>
where
    F: Fn(Artifact, &HookState, &HookContext, &HookApi) -> HookResult + Send + Sync,
{
    /// Creates a hook from a closure.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Debug for FnHook<F>
where
    F: Fn(Artifact, &HookState, &HookContext, &HookApi) -> HookResult + Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHook").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> Hook for FnHook<F>
where
    F: Fn(Artifact, &HookState, &HookContext, &HookApi) -> HookResult + Send + Sync,
{
    async fn call(
        &self,
        artifact: Artifact,
        state: HookState,
        ctx: HookContext,
        api: HookApi,
    ) -> HookResult {
        (self.func)(artifact, &state, &ctx, &api)
    }
}

/// A hook backed by a closure returning a future.
pub struct AsyncFnHook<F, Fut>
where
    F: Fn(Artifact, HookState, HookContext, HookApi) -> Fut + Send + Sync,
    Fut: Future<Output = HookResult> + Send + 'static,
{
    func: F,
    _phantom: PhantomData<fn() -> Fut>,
}

impl<F, Fut> AsyncFnHook<F, Fut>
where
    F: Fn(Artifact, HookState, HookContext, HookApi) -> Fut + Send + Sync,
    Fut: Future<Output = HookResult> + Send + 'static,
{
    /// Creates a hook from an async closure.
    pub fn new(func: F) -> Self {
        Self {
            func,
            _phantom: PhantomData,
        }
    }
}

impl<F, Fut> Debug for AsyncFnHook<F, Fut>
where
    F: Fn(Artifact, HookState, HookContext, HookApi) -> Fut + Send + Sync,
    Fut: Future<Output = HookResult> + Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncFnHook").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> Hook for AsyncFnHook<F, Fut>
where
    F: Fn(Artifact, HookState, HookContext, HookApi) -> Fut + Send + Sync,
    Fut: Future<Output = HookResult> + Send + 'static,
{
    async fn call(
        &self,
        artifact: Artifact,
        state: HookState,
        ctx: HookContext,
        api: HookApi,
    ) -> HookResult {
        (self.func)(artifact, state, ctx, api).await
    }
}
