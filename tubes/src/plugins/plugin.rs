//! Plugin records: named collections of hooks keyed by step.

use super::Hook;
use crate::core::{StepId, StepKind};
use crate::errors::StepParseError;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A named mapping from step identifiers to hooks.
///
/// Registering a second hook for the same step replaces the first.
///
/// ```rust,ignore
/// let plugin = Plugin::new("greeter")
///     .before("render", FnHook::new(|a, _, _, _| Ok(Some(a))))
///     .main("render", FnHook::new(|_, _, _, _| Ok(Some(json!("hello")))));
/// ```
#[derive(Clone)]
pub struct Plugin {
    name: String,
    hooks: BTreeMap<StepId, Arc<dyn Hook>>,
}

impl Plugin {
    /// Creates an empty plugin.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hooks: BTreeMap::new(),
        }
    }

    /// Binds a hook to a step.
    #[must_use]
    pub fn with_hook(mut self, step: StepId, hook: impl Hook + 'static) -> Self {
        self.hooks.insert(step, Arc::new(hook));
        self
    }

    /// Binds an already shared hook to a step.
    #[must_use]
    pub fn with_shared_hook(mut self, step: StepId, hook: Arc<dyn Hook>) -> Self {
        self.hooks.insert(step, hook);
        self
    }

    /// Binds a hook to a step named the way plugins name steps (`doBefore`).
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier cannot be parsed.
    pub fn on(self, step: &str, hook: impl Hook + 'static) -> Result<Self, StepParseError> {
        let step = StepId::parse(step)?;
        Ok(self.with_hook(step, hook))
    }

    /// Binds a `<stage>Start` observer hook.
    #[must_use]
    pub fn start(self, stage: impl Into<String>, hook: impl Hook + 'static) -> Self {
        self.with_hook(StepId::new(stage, StepKind::Start), hook)
    }

    /// Binds a `<stage>Before` hook.
    #[must_use]
    pub fn before(self, stage: impl Into<String>, hook: impl Hook + 'static) -> Self {
        self.with_hook(StepId::before(stage), hook)
    }

    /// Binds a `<stage>` main hook.
    #[must_use]
    pub fn main(self, stage: impl Into<String>, hook: impl Hook + 'static) -> Self {
        self.with_hook(StepId::main(stage), hook)
    }

    /// Binds a `<stage>After` hook.
    #[must_use]
    pub fn after(self, stage: impl Into<String>, hook: impl Hook + 'static) -> Self {
        self.with_hook(StepId::after(stage), hook)
    }

    /// Binds a `<stage>End` observer hook.
    #[must_use]
    pub fn end(self, stage: impl Into<String>, hook: impl Hook + 'static) -> Self {
        self.with_hook(StepId::new(stage, StepKind::End), hook)
    }

    /// Returns the plugin name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the hook bound to a step, if any.
    #[must_use]
    pub fn hook(&self, step: &StepId) -> Option<&Arc<dyn Hook>> {
        self.hooks.get(step)
    }

    /// Returns the steps this plugin binds.
    pub fn steps(&self) -> impl Iterator<Item = &StepId> {
        self.hooks.keys()
    }

    /// Iterates over every binding.
    pub fn hooks(&self) -> impl Iterator<Item = (&StepId, &Arc<dyn Hook>)> {
        self.hooks.iter()
    }

    /// Returns the number of bound steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Returns true if the plugin binds no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field(
                "steps",
                &self.hooks.keys().map(StepId::name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::FnHook;

    fn passthrough() -> impl Hook {
        FnHook::new(|_, _, _, _| Ok(None))
    }

    #[test]
    fn test_builder_binds_steps() {
        let plugin = Plugin::new("p")
            .before("do", passthrough())
            .main("do", passthrough())
            .after("do", passthrough());

        assert_eq!(plugin.name(), "p");
        assert_eq!(plugin.len(), 3);
        assert!(plugin.hook(&StepId::before("do")).is_some());
        assert!(plugin.hook(&StepId::main("do")).is_some());
        assert!(plugin.hook(&StepId::after("do")).is_some());
        assert!(plugin.hook(&StepId::main("other")).is_none());
    }

    #[test]
    fn test_on_parses_step_identifiers() {
        let plugin = Plugin::new("p")
            .on("loadBefore", passthrough())
            .unwrap()
            .on("loadEnd", passthrough())
            .unwrap();

        let steps: Vec<String> = plugin.steps().map(StepId::name).collect();
        assert!(steps.contains(&"loadBefore".to_string()));
        assert!(steps.contains(&"loadEnd".to_string()));
        assert!(Plugin::new("p").on("After", passthrough()).is_err());
    }

    #[test]
    fn test_rebinding_replaces() {
        let plugin = Plugin::new("p")
            .main("do", passthrough())
            .main("do", passthrough());
        assert_eq!(plugin.len(), 1);
    }

    #[test]
    fn test_debug_lists_step_names() {
        let plugin = Plugin::new("p").start("do", passthrough());
        let debug = format!("{plugin:?}");
        assert!(debug.contains("doStart"));
    }
}
