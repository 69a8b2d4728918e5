//! Runs every hook bound to one step.

use crate::context::{HookApi, RunContext, Tripwire};
use crate::core::{is_truthy, Artifact, Cursor, StepId};
use crate::errors::{ErrorOrigin, FatalError, StructuralError, TubesError};
use std::sync::Arc;
use tracing::{debug, warn};

/// Invokes the hooks of `step` in plugin registration order, piping the
/// artifact through them.
///
/// The hook list is collected once when the step starts. A hook error is
/// recorded and the next hook receives the artifact from before the failure.
/// On the main step, the remaining hooks are skipped as soon as the artifact
/// is truthy after a hook, whether that hook replaced it, passed it through
/// or failed.
///
/// A [`StructuralError`] raised through the hook's handles aborts the run,
/// whatever the hook then returned.
pub(crate) async fn invoke_step(
    run: &Arc<RunContext>,
    step: &StepId,
    mut artifact: Artifact,
) -> Result<Artifact, FatalError> {
    let hooks = run.hooks_for(step);

    for (iteration, bound) in hooks.into_iter().enumerate() {
        let cursor = Cursor::at(step, iteration);
        let tripwire = Tripwire::default();
        let (state, ctx) = run.views(cursor.clone(), &tripwire);
        let api = HookApi::new(
            Arc::clone(run),
            cursor.clone(),
            Arc::clone(&bound.plugin),
            tripwire.clone(),
        );

        let outcome = bound.hook.call(artifact.clone(), state, ctx, api).await;

        let violation = tripwire.tripped().cloned().or_else(|| {
            outcome
                .as_ref()
                .err()
                .and_then(|err| err.downcast_ref::<StructuralError>())
                .cloned()
        });
        if let Some(structural) = violation {
            warn!(cursor = %cursor, plugin = %bound.plugin, error = %structural, "Hook violated run contract");
            return Err(FatalError::Structural {
                cursor,
                source: structural,
            });
        }

        match outcome {
            Ok(None) => {}
            Ok(Some(_)) if step.kind.is_observer() => {}
            Ok(Some(value)) => artifact = value,
            Err(err) => {
                warn!(cursor = %cursor, plugin = %bound.plugin, error = %err, "Hook failed");
                run.notify(
                    "hook.failed",
                    serde_json::json!({
                        "cursor": cursor.to_value(),
                        "plugin": &*bound.plugin,
                        "message": err.to_string(),
                    }),
                );
                run.record_error(TubesError::new(
                    err,
                    cursor.clone(),
                    Some(bound.plugin.to_string()),
                    ErrorOrigin::Thrown,
                ));
            }
        }

        if step.kind.short_circuits() && is_truthy(&artifact) {
            debug!(cursor = %cursor, plugin = %bound.plugin, "Step short-circuited");
            return Ok(artifact);
        }
    }

    Ok(artifact)
}
