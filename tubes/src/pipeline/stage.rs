//! Sequences the steps of one stage.

use super::invoker::invoke_step;
use crate::context::RunContext;
use crate::core::Artifact;
use crate::errors::FatalError;
use std::sync::Arc;
use tracing::debug;

/// Runs the planned steps of `stage` in order, piping the artifact.
pub(crate) async fn execute_stage(
    run: &Arc<RunContext>,
    stage: &str,
    mut artifact: Artifact,
) -> Result<Artifact, FatalError> {
    debug!(stage = %stage, "Stage started");
    run.notify("stage.started", serde_json::json!({ "stage": stage }));

    for step in run.catalog().steps_for(stage) {
        artifact = invoke_step(run, step, artifact).await?;
    }

    debug!(stage = %stage, "Stage completed");
    run.notify("stage.completed", serde_json::json!({ "stage": stage }));
    Ok(artifact)
}
