use async_trait::async_trait;

use super::BuildContext;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The action a step hands back to the pipeline after running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAction {
    /// Advance to the next step.
    Continue,

    /// Stop the pipeline and begin teardown.
    Halt,
}

//--------------------------------------------------------------------------------------------------
// Traits
//--------------------------------------------------------------------------------------------------

/// A unit of pipeline work with a forward phase and a guaranteed teardown
/// phase.
///
/// `run` advances the build and reports failures through the context rather
/// than a `Result`: a failing step records its error in the residual state,
/// surfaces it through the UI, and returns [`StepAction::Halt`].
///
/// `cleanup` reverses whatever `run` achieved. The pipeline invokes it on
/// every instantiated step during teardown, in reverse order, whether or not
/// that step's `run` was reached; a step that never ran must treat its own
/// cleanup as a no-op.
#[async_trait]
pub trait Step: Send {
    /// A short name used in pipeline logs.
    fn name(&self) -> &str;

    /// Advances the pipeline.
    async fn run(&mut self, ctx: &mut BuildContext) -> StepAction;

    /// Reverses the step's side effects. Best-effort: failures are surfaced
    /// through the UI and never propagate out of teardown.
    async fn cleanup(&mut self, ctx: &mut BuildContext);
}
