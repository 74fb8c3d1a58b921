use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use pubsub_tracker::{AppState, InMemoryAccountStore, TrackerArgs, TrackerConfig, build_app};
use pubsub_transport::{ReconnectPolicy, TransportError, WsSender};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = TrackerArgs::parse();
    pubsub_observability::init_with(args.log_format);

    let config = TrackerConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let store = InMemoryAccountStore::from_accounts(config.accounts.clone())?;
    tracing::info!(accounts = store.len(), "account store ready");

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("interrupt received");
                    shutdown.cancel();
                }
                Err(err) => tracing::warn!(error = %err, "failed to listen for Ctrl-C"),
            }
        }
    });

    let endpoint = config.publisher_endpoint()?;
    let sender = match WsSender::connect(endpoint, ReconnectPolicy::default(), &shutdown).await {
        Ok(sender) => Arc::new(sender),
        Err(TransportError::Cancelled) => return Ok(()),
        Err(err) => return Err(err).context("connecting to publisher"),
    };

    let app = build_app(AppState::new(Arc::new(store), sender.clone()));
    let listener = tokio::net::TcpListener::bind(&config.address)
        .await
        .with_context(|| format!("failed to bind {}", config.address))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    if let Err(err) = sender.close().await {
        tracing::warn!(error = %err, "failed to close publisher connection");
    }
    Ok(())
}
