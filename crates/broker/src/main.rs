use anyhow::Context;
use clap::Parser;

use pubsub_broker::{BrokerArgs, Broker, build_app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = BrokerArgs::parse();
    pubsub_observability::init_with(args.log_format);

    let listener = tokio::net::TcpListener::bind(&args.addr)
        .await
        .with_context(|| format!("failed to bind {}", args.addr))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, build_app(Broker::new()))
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %err, "failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
            tracing::info!("interrupt received");
        })
        .await?;
    Ok(())
}
