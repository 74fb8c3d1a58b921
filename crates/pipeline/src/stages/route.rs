//! Routing to the terminal stage.

use async_trait::async_trait;
use tracing::debug;

use pubsub_core::Event;

use crate::conduit::{Inlet, Outlet};
use crate::error::PipelineError;
use crate::shutdown::Shutdown;
use crate::sink::SinkMode;
use crate::stage::{Stage, relay};

/// Multiplexer in front of the terminal stages.
///
/// The destination is resolved once, when the pipeline is wired: the Router is
/// bound to the conduit of the terminal sink selected by [`SinkMode`], and every
/// event goes there. There is no per-event decision.
pub struct Router {
    mode: SinkMode,
    input: Inlet<Event>,
    destination: Outlet<Event>,
}

impl Router {
    pub fn new(mode: SinkMode, input: Inlet<Event>, destination: Outlet<Event>) -> Self {
        Self {
            mode,
            input,
            destination,
        }
    }
}

#[async_trait]
impl Stage for Router {
    fn name(&self) -> &'static str {
        "router"
    }

    async fn run(self: Box<Self>, shutdown: Shutdown) -> Result<(), PipelineError> {
        let Router {
            mode,
            mut input,
            destination,
        } = *self;

        debug!(?mode, "router bound to terminal sink");
        relay(&mut input, &destination, &shutdown, Some).await;
        Ok(())
    }
}
