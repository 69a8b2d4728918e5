//! Pipeline driver: walks the stage list and fans out parallel groups.

use super::fanout::{panic_message, BranchGroup};
use super::stage::execute_stage;
use super::{Options, StageCatalog, StageSpec};
use crate::context::{RunContext, State};
use crate::core::{into_branches, Artifact, TubesResult};
use crate::errors::{FatalError, OptionsValidationError};
use futures::future::{BoxFuture, FutureExt};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};

/// Runs `input` through the pipeline described by `options`.
///
/// Hook errors are collected in the result; only fatal errors are returned
/// as `Err`.
///
/// ```rust,ignore
/// let options = Options::new()
///     .with_stages(["do"])
///     .with_plugin(Plugin::new("bar").main("do", FnHook::new(|_, _, _, _| Ok(Some(json!("bar"))))));
///
/// let result = tubes(json!("foo"), options, None).await?;
/// assert_eq!(result.output, json!("bar"));
/// ```
///
/// # Errors
///
/// Returns an error if the options fail validation, a hook violates the
/// run contract or a hook panics. A panic inside a parallel group surfaces
/// as [`FatalError::BranchAborted`]; anywhere else as
/// [`FatalError::Panicked`].
pub async fn tubes(
    input: impl Into<Artifact>,
    options: Options,
    initial_state: Option<State>,
) -> Result<TubesResult, FatalError> {
    Tubes::new(options)?.run(input, initial_state).await
}

/// A validated pipeline that can be run any number of times.
///
/// Every run gets its own error sink, state and plugin table; plugins added
/// at runtime do not outlive the run that added them.
#[derive(Debug, Clone)]
pub struct Tubes {
    options: Arc<Options>,
    catalog: Arc<StageCatalog>,
}

impl Tubes {
    /// Validates options.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid stage names or plugins bound to stages
    /// the pipeline does not have.
    pub fn new(options: Options) -> Result<Self, OptionsValidationError> {
        let catalog = options.validate()?;
        Ok(Self {
            options: Arc::new(options),
            catalog: Arc::new(catalog),
        })
    }

    /// The validated options.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The stage catalog built from the options.
    #[must_use]
    pub fn catalog(&self) -> &StageCatalog {
        &self.catalog
    }

    /// Runs the pipeline once.
    ///
    /// # Errors
    ///
    /// Returns an error if a hook violates the run contract or panics.
    pub async fn run(
        &self,
        input: impl Into<Artifact>,
        initial_state: Option<State>,
    ) -> Result<TubesResult, FatalError> {
        let input = input.into();
        let run = Arc::new(RunContext::new(
            input.clone(),
            initial_state.unwrap_or_default(),
            Arc::clone(&self.options),
            Arc::clone(&self.catalog),
        ));
        let stages: Arc<[StageSpec]> = Arc::from(self.options.stages());
        let span = info_span!("tubes_run", run_id = %run.run_id());

        async move {
            info!(
                stages = stages.len(),
                plugins = self.options.plugins().len(),
                freeze = self.options.freeze(),
                "Pipeline run started"
            );
            run.emit(
                "pipeline.started",
                serde_json::json!({
                    "stages": self.catalog.stage_names(),
                    "plugins": self.options.plugins().iter().map(|p| p.name()).collect::<Vec<_>>(),
                }),
            )
            .await;

            let outcome = AssertUnwindSafe(run_pipeline(Arc::clone(&run), stages, input))
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| {
                    Err(FatalError::Panicked {
                        reason: panic_message(payload.as_ref()).to_string(),
                    })
                });

            match outcome {
                Ok(output) => {
                    let errors = run.take_errors();
                    info!(errors = errors.len(), "Pipeline run completed");
                    run.emit(
                        "pipeline.completed",
                        serde_json::json!({ "errors": errors.len() }),
                    )
                    .await;
                    Ok(TubesResult::new(errors, output))
                }
                Err(err) => {
                    warn!(error = %err, "Pipeline run aborted");
                    run.emit(
                        "pipeline.aborted",
                        serde_json::json!({
                            "error": err.to_string(),
                            "cursor": err.cursor().map(crate::core::Cursor::to_value),
                        }),
                    )
                    .await;
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }
}

/// Evaluates a stage list, piping each spec's output into the next.
///
/// Boxed because groups recurse into it from spawned branch tasks.
fn run_pipeline(
    run: Arc<RunContext>,
    specs: Arc<[StageSpec]>,
    artifact: Artifact,
) -> BoxFuture<'static, Result<Artifact, FatalError>> {
    async move {
        let mut artifact = artifact;
        for spec in specs.iter() {
            artifact = match spec {
                StageSpec::Stage(name) => execute_stage(&run, name, artifact).await?,
                StageSpec::Group(group) => run_group(&run, group, artifact).await?,
            };
        }
        Ok(artifact)
    }
    .boxed()
}

/// Runs a sub-pipeline per element of the artifact, concurrently.
///
/// Arrays split into their elements; any other value runs as a single
/// branch. Outputs come back in input order.
async fn run_group(
    run: &Arc<RunContext>,
    group: &[StageSpec],
    artifact: Artifact,
) -> Result<Artifact, FatalError> {
    let specs: Arc<[StageSpec]> = Arc::from(group);
    let elements = into_branches(artifact);
    let width = elements.len();
    debug!(width, stages = specs.len(), "Parallel group started");
    run.notify("group.started", serde_json::json!({ "width": width }));

    let mut branches = BranchGroup::new();
    for element in elements {
        branches.spawn(run_pipeline(Arc::clone(run), Arc::clone(&specs), element));
    }
    let outputs = branches.join_ordered().await?;

    debug!(width, "Parallel group completed");
    run.notify("group.completed", serde_json::json!({ "width": width }));
    Ok(Artifact::Array(outputs))
}
