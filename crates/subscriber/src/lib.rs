//! Subscriber service: connect to the publisher and run the event pipeline
//! until interrupted.

pub mod cli;

pub use cli::Cli;

use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use pubsub_observability::{LineSink, TracingSink};
use pubsub_pipeline::{Pipeline, PipelineConfig, Shutdown};
use pubsub_transport::{Receiver, WsReceiver};

/// Run the subscriber described by `cli` until Ctrl-C (or a fatal transport error).
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let interrupt = CancellationToken::new();
    tokio::spawn({
        let interrupt = interrupt.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("interrupt received");
                    interrupt.cancel();
                }
                Err(err) => warn!(error = %err, "failed to listen for Ctrl-C"),
            }
        }
    });

    info!(addr = %cli.addr, filter = %cli.filter, aggregate = cli.agg, "starting subscriber");
    let receiver = Arc::new(WsReceiver::new(cli.addr.clone()));
    serve(receiver, cli.pipeline_config(), Arc::new(TracingSink), interrupt).await
}

/// Connect `receiver` and drive the pipeline until `interrupt` fires and the
/// drain completes.
///
/// An interrupt that arrives while still dialing ends the run successfully.
pub async fn serve(
    receiver: Arc<dyn Receiver>,
    config: PipelineConfig,
    lines: Arc<dyn LineSink>,
    interrupt: CancellationToken,
) -> anyhow::Result<()> {
    tokio::select! {
        _ = interrupt.cancelled() => {
            info!("interrupted before a connection was established");
            return Ok(());
        }
        connected = receiver.connect() => connected.context("connecting to publisher")?,
    }

    let handle = Pipeline::new(receiver, config, lines).spawn_with(Shutdown::with_interrupt(interrupt));
    handle.wait().await.context("subscriber pipeline failed")?;

    info!("subscriber stopped");
    Ok(())
}
