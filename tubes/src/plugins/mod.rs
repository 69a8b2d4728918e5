//! Plugins and the hooks they contribute.
//!
//! A [`Plugin`] maps step identifiers to [`Hook`]s. The [`PluginRegistry`]
//! keeps plugins in registration order and answers which hooks are bound to
//! a given step.

mod hook;
mod plugin;
mod registry;

pub use hook::{AsyncFnHook, FnHook, Hook, HookResult};
pub use plugin::Plugin;
pub use registry::{BoundHook, PluginRegistry};
