//! Stage descriptors.

use async_trait::async_trait;

use crate::conduit::{Inlet, Outlet, recv_or_halt, send_or_halt};
use crate::error::PipelineError;
use crate::shutdown::Shutdown;

/// One independently scheduled step of the pipeline.
///
/// A stage owns its conduit ends. `run` consumes the stage and returns when
/// the stage is done: its input closed, its output went away, or the pipeline
/// halted.
#[async_trait]
pub trait Stage: Send {
    fn name(&self) -> &'static str;

    async fn run(self: Box<Self>, shutdown: Shutdown) -> Result<(), PipelineError>;
}

/// Shared loop of the one-in/one-out stages: pull, map, push.
///
/// `step` returning `None` drops the item.
pub(crate) async fn relay<I, O, F>(
    input: &mut Inlet<I>,
    output: &Outlet<O>,
    shutdown: &Shutdown,
    mut step: F,
) where
    I: Send,
    O: Send,
    F: FnMut(I) -> Option<O> + Send,
{
    while let Some(item) = recv_or_halt(input, shutdown).await {
        if let Some(out) = step(item) {
            if !send_or_halt(output, out, shutdown).await {
                break;
            }
        }
    }
}
