//! Transport read loop.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use pubsub_transport::Receiver;

use crate::conduit::{Outlet, send_or_halt};
use crate::error::PipelineError;
use crate::shutdown::Shutdown;
use crate::stage::Stage;
use crate::stats::PipelineStats;

/// Pulls frames off the transport into the first conduit.
///
/// Stops reading as soon as the transport reports closed; dropping its outlet
/// then lets the downstream stages drain what is already queued and exit in
/// turn. Never closes the transport itself.
pub struct ReceiverStage {
    receiver: Arc<dyn Receiver>,
    output: Outlet<Vec<u8>>,
    stats: Arc<PipelineStats>,
}

impl ReceiverStage {
    pub fn new(
        receiver: Arc<dyn Receiver>,
        output: Outlet<Vec<u8>>,
        stats: Arc<PipelineStats>,
    ) -> Self {
        Self {
            receiver,
            output,
            stats,
        }
    }
}

#[async_trait]
impl Stage for ReceiverStage {
    fn name(&self) -> &'static str {
        "receiver"
    }

    async fn run(self: Box<Self>, shutdown: Shutdown) -> Result<(), PipelineError> {
        loop {
            if self.receiver.is_closed() {
                debug!("transport closed; receiver stage stopping");
                return Ok(());
            }

            let frame = tokio::select! {
                biased;
                _ = shutdown.halted() => return Ok(()),
                frame = self.receiver.read_frame() => frame?,
            };

            if frame.is_empty() {
                continue;
            }
            self.stats.frame_received();

            if !send_or_halt(&self.output, frame, &shutdown).await {
                return Ok(());
            }
        }
    }
}
