use std::{any::Any, panic::AssertUnwindSafe};

use futures::FutureExt;
use tracing::{debug, error};

use crate::VmforgeError;

use super::{BuildContext, Step, StepAction, ERROR_KEY};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Runs an ordered sequence of steps with a guaranteed teardown.
///
/// Steps execute sequentially until one returns [`StepAction::Halt`] or
/// panics; afterwards every step is torn down in reverse order regardless of
/// how the forward pass ended. A panicking step is recorded as a terminal
/// error in the residual state; a panicking cleanup is contained so the
/// remaining steps still tear down.
pub struct Pipeline {
    /// The steps, in forward execution order.
    steps: Vec<Box<dyn Step>>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Pipeline {
    /// Creates a pipeline over the given steps.
    pub fn new(steps: Vec<Box<dyn Step>>) -> Self {
        Self { steps }
    }

    /// Appends a step to the forward execution order.
    pub fn add_step(&mut self, step: Box<dyn Step>) {
        self.steps.push(step);
    }

    /// Runs every step in order, then tears every step down in reverse
    /// order. Returns the action the forward pass ended with so the
    /// embedding tool can set its exit status.
    pub async fn run(&mut self, ctx: &mut BuildContext) -> StepAction {
        let mut action = StepAction::Continue;

        for step in self.steps.iter_mut() {
            debug!(step = step.name(), "running step");

            let outcome = AssertUnwindSafe(step.run(ctx)).catch_unwind().await;
            match outcome {
                Ok(StepAction::Continue) => {}
                Ok(StepAction::Halt) => {
                    debug!(step = step.name(), "step halted the pipeline");
                    action = StepAction::Halt;
                    break;
                }
                Err(panic) => {
                    let message = panic_message(panic);
                    error!(step = step.name(), panic = %message, "step panicked");
                    ctx.bag_mut()
                        .put(ERROR_KEY, VmforgeError::StepPanicked(message));
                    action = StepAction::Halt;
                    break;
                }
            }
        }

        self.teardown(ctx).await;

        action
    }

    /// Tears down every step in reverse order.
    async fn teardown(&mut self, ctx: &mut BuildContext) {
        for step in self.steps.iter_mut().rev() {
            debug!(step = step.name(), "cleaning up step");

            let outcome = AssertUnwindSafe(step.cleanup(ctx)).catch_unwind().await;
            if let Err(panic) = outcome {
                error!(
                    step = step.name(),
                    panic = %panic_message(panic),
                    "step cleanup panicked"
                );
            }
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Extracts a readable message from a panic payload.
fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
