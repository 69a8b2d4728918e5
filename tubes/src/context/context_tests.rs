//! Tests for the run context, its views and the hook API.

#[cfg(test)]
mod tests {
    use crate::context::{HookApi, RunContext, State, Tripwire};
    use crate::core::{Cursor, StepId};
    use crate::errors::{ErrorOrigin, StructuralError};
    use crate::events::CollectingEventSink;
    use crate::pipeline::Options;
    use crate::plugins::{FnHook, Plugin};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn run_for(options: Options) -> Arc<RunContext> {
        let catalog = options.validate().unwrap();
        Arc::new(RunContext::new(
            json!("input"),
            State::new(),
            Arc::new(options),
            Arc::new(catalog),
        ))
    }

    fn api_at(run: &Arc<RunContext>, cursor: Cursor) -> HookApi {
        HookApi::new(Arc::clone(run), cursor, Arc::from("test"), Tripwire::default())
    }

    fn noop_plugin(name: &str, stage: &str) -> Plugin {
        Plugin::new(name).main(stage, FnHook::new(|_, _, _, _| Ok(None)))
    }

    #[test]
    fn test_live_views_write_through() {
        let run = run_for(Options::new().with_stages(["do"]));
        let (state, ctx) = run.views(Cursor::new("do", "do", 0), &Tripwire::default());

        assert!(!state.is_frozen());
        assert!(!ctx.is_frozen());

        state.set("foo", json!("bar")).unwrap();
        assert_eq!(run.state_snapshot().get("foo"), Some(&json!("bar")));

        ctx.set_input(json!("replaced")).unwrap();
        assert_eq!(*ctx.input(), json!("replaced"));
        assert_eq!(*run.input(), json!("replaced"));
    }

    #[test]
    fn test_frozen_views_reject_writes() {
        let run = run_for(Options::new().with_stages(["do"]).with_freeze(true));
        let tripwire = Tripwire::default();
        let (state, ctx) = run.views(Cursor::new("do", "do", 0), &tripwire);

        assert!(state.is_frozen());
        assert!(ctx.is_frozen());
        assert_eq!(
            ctx.set_input(json!("bar")),
            Err(StructuralError::FrozenContext {
                field: "input".to_string()
            })
        );
        assert!(state.set("foo", json!("bar")).is_err());
        assert_eq!(*run.input(), json!("input"));
        assert!(run.state_snapshot().is_empty());
        assert_eq!(
            tripwire.tripped(),
            Some(&StructuralError::FrozenContext {
                field: "input".to_string()
            })
        );
    }

    #[test]
    fn test_live_views_leave_tripwire_untouched() {
        let run = run_for(Options::new().with_stages(["do"]));
        let tripwire = Tripwire::default();
        let (state, ctx) = run.views(Cursor::new("do", "do", 0), &tripwire);

        state.set("foo", json!(1)).unwrap();
        ctx.set_input(json!("next")).unwrap();
        assert!(tripwire.tripped().is_none());
    }

    #[test]
    fn test_context_carries_cursor_and_options() {
        let run = run_for(
            Options::new()
                .with_stages(["load", "save"])
                .with_plugin(noop_plugin("loader", "load")),
        );
        let (_, ctx) = run.views(Cursor::at(&StepId::before("save"), 3), &Tripwire::default());

        assert_eq!(ctx.stage(), "save");
        assert_eq!(ctx.step(), "saveBefore");
        assert_eq!(ctx.iteration(), 3);
        assert_eq!(ctx.run_id(), run.run_id());
        assert_eq!(ctx.options().plugins, vec!["loader"]);
        assert!(!ctx.options().freeze);
        assert_eq!(ctx.options().stages.len(), 2);
    }

    #[test]
    fn test_context_errors_are_a_snapshot() {
        let run = run_for(Options::new().with_stages(["do"]));
        let api = api_at(&run, Cursor::new("do", "do", 0));

        api.push_error(anyhow::anyhow!("first"));
        let (_, ctx) = run.views(Cursor::new("do", "doAfter", 0), &Tripwire::default());
        api.push_error(anyhow::anyhow!("second"));

        assert_eq!(ctx.errors().len(), 1);
        assert_eq!(run.errors_snapshot().len(), 2);
    }

    #[test]
    fn test_set_state_merges_even_when_frozen() {
        let run = run_for(Options::new().with_stages(["do"]).with_freeze(true));
        let api = api_at(&run, Cursor::new("do", "do", 0));

        api.set_state(json!({"a": 1, "b": 1})).unwrap();
        api.set_state(json!({"b": 2})).unwrap();

        let state = run.state_snapshot();
        assert_eq!(state.get("a"), Some(&json!(1)));
        assert_eq!(state.get("b"), Some(&json!(2)));
    }

    #[test]
    fn test_set_state_rejects_non_objects() {
        let run = run_for(Options::new().with_stages(["do"]));
        let tripwire = Tripwire::default();
        let api = HookApi::new(
            Arc::clone(&run),
            Cursor::default(),
            Arc::from("test"),
            tripwire.clone(),
        );

        let expected = StructuralError::InvalidStatePatch {
            kind: "array".to_string(),
        };
        assert_eq!(api.set_state(json!([1, 2])), Err(expected.clone()));
        assert_eq!(tripwire.tripped(), Some(&expected));
    }

    #[test]
    fn test_push_error_tags_cursor_and_emits() {
        let sink = Arc::new(CollectingEventSink::new());
        let run = run_for(
            Options::new()
                .with_stages(["do"])
                .with_event_sink(sink.clone()),
        );
        let api = api_at(&run, Cursor::new("do", "doBefore", 1));

        api.push_errors([anyhow::anyhow!("a"), anyhow::anyhow!("b")]);

        let errors = run.take_errors();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message(), "a");
        assert_eq!(errors[1].cursor(), &Cursor::new("do", "doBefore", 1));
        assert_eq!(errors[1].origin(), ErrorOrigin::Pushed);
        assert_eq!(errors[1].plugin(), Some("test"));
        assert!(run.errors_snapshot().is_empty());

        let pushed = sink.events_of_type("hook.error_pushed");
        assert_eq!(pushed.len(), 2);
        let payload = pushed[0].1.clone().unwrap();
        assert_eq!(payload["run_id"], json!(run.run_id().to_string()));
        assert_eq!(payload["cursor"]["step"], "doBefore");
    }

    #[test]
    fn test_add_plugin_registers_for_later_steps() {
        let sink = Arc::new(CollectingEventSink::new());
        let run = run_for(
            Options::new()
                .with_stages(["do", "then"])
                .with_event_sink(sink.clone()),
        );
        let api = api_at(&run, Cursor::new("do", "do", 0));

        assert!(run.hooks_for(&StepId::main("then")).is_empty());
        api.add_plugin(noop_plugin("late", "then")).unwrap();

        assert_eq!(run.hooks_for(&StepId::main("then")).len(), 1);
        assert_eq!(run.options_snapshot().plugins, vec!["late"]);
        assert_eq!(sink.event_types(), vec!["plugin.added"]);
    }

    #[test]
    fn test_add_plugin_rejects_unknown_stage() {
        let run = run_for(Options::new().with_stages(["do"]));
        let api = api_at(&run, Cursor::new("do", "do", 0));

        let err = api.add_plugin(noop_plugin("stray", "nowhere")).unwrap_err();
        assert!(matches!(err, StructuralError::InvalidPlugin { ref plugin, .. } if plugin == "stray"));
        assert!(run.options_snapshot().plugins.is_empty());
    }
}
