//! Plugin registry and the `(stage, step) -> hooks` lookup table.

use super::{Hook, Plugin};
use crate::core::StepId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A hook together with the name of the plugin that bound it.
#[derive(Clone)]
pub struct BoundHook {
    /// Name of the contributing plugin.
    pub plugin: Arc<str>,
    /// The hook.
    pub hook: Arc<dyn Hook>,
}

impl fmt::Debug for BoundHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundHook")
            .field("plugin", &self.plugin)
            .finish_non_exhaustive()
    }
}

/// Hooks per step, each list in plugin registration order.
#[derive(Default)]
struct HookTable {
    steps: HashMap<StepId, Vec<BoundHook>>,
}

impl HookTable {
    fn bind(&mut self, plugin: &Plugin) {
        let name: Arc<str> = Arc::from(plugin.name());
        for (step, hook) in plugin.hooks() {
            self.steps.entry(step.clone()).or_default().push(BoundHook {
                plugin: name.clone(),
                hook: hook.clone(),
            });
        }
    }
}

/// Ordered plugin list with a lookup table rebuilt on every registration.
///
/// Readers get an owned copy of a step's hook list, so a plugin registered
/// while a step is running only affects steps that start afterwards.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: RwLock<Vec<Arc<Plugin>>>,
    table: RwLock<HookTable>,
}

impl PluginRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the given plugins, in order.
    #[must_use]
    pub fn from_plugins(plugins: impl IntoIterator<Item = Arc<Plugin>>) -> Self {
        let registry = Self::new();
        for plugin in plugins {
            registry.register(plugin);
        }
        registry
    }

    /// Appends a plugin.
    pub fn register(&self, plugin: Arc<Plugin>) {
        let mut plugins = self.plugins.write();
        self.table.write().bind(&plugin);
        plugins.push(plugin);
    }

    /// Returns the hooks bound to a step, in plugin registration order.
    #[must_use]
    pub fn hooks_for(&self, step: &StepId) -> Vec<BoundHook> {
        self.table
            .read()
            .steps
            .get(step)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the registered plugin names, in order.
    #[must_use]
    pub fn plugin_names(&self) -> Vec<String> {
        self.plugins
            .read()
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    /// Returns the number of registered plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.read().len()
    }

    /// Returns true if no plugin is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.read().is_empty()
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.plugin_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::FnHook;

    fn plugin(name: &str, stage: &str) -> Arc<Plugin> {
        Arc::new(Plugin::new(name).main(stage, FnHook::new(|_, _, _, _| Ok(None))))
    }

    #[test]
    fn test_hooks_follow_registration_order() {
        let registry = PluginRegistry::from_plugins([
            plugin("first", "do"),
            plugin("skipped", "other"),
            plugin("second", "do"),
        ]);

        let hooks = registry.hooks_for(&StepId::main("do"));
        let names: Vec<&str> = hooks.iter().map(|h| &*h.plugin).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert!(registry.hooks_for(&StepId::before("do")).is_empty());
    }

    #[test]
    fn test_register_after_snapshot() {
        let registry = PluginRegistry::from_plugins([plugin("first", "do")]);
        let snapshot = registry.hooks_for(&StepId::main("do"));

        registry.register(plugin("late", "do"));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.hooks_for(&StepId::main("do")).len(), 2);
        assert_eq!(registry.plugin_names(), vec!["first", "late"]);
        assert_eq!(registry.len(), 2);
    }
}
