//! Publisher: a WebSocket broker that rebroadcasts every message it receives
//! to every other connected client.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::{
    Extension, Router,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::Response,
    routing::get,
};
use clap::Parser;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use pubsub_observability::LogFormat;

/// First message every client receives.
pub const GREETING: &str = "Successfully connected to publisher";

const FANOUT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Parser)]
#[command(name = "broker", version, about = "Rebroadcast WebSocket messages between clients")]
pub struct BrokerArgs {
    /// Address to listen on.
    #[arg(long, env = "BROKER_ADDR", default_value = "0.0.0.0:8000")]
    pub addr: String,

    /// Log output: `json` or `pretty`.
    #[arg(long, env = "BROKER_LOG_FORMAT", default_value = "json")]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone)]
struct Broadcast {
    from: u64,
    message: Message,
}

/// Shared fan-out state.
#[derive(Debug, Clone)]
pub struct Broker {
    fanout: broadcast::Sender<Broadcast>,
    next_client: Arc<AtomicU64>,
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

impl Broker {
    pub fn new() -> Self {
        let (fanout, _) = broadcast::channel(FANOUT_CAPACITY);
        Self {
            fanout,
            next_client: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Number of clients currently attached.
    pub fn client_count(&self) -> usize {
        self.fanout.receiver_count()
    }

    async fn serve_client(self, socket: WebSocket) {
        let client = self.next_client.fetch_add(1, Ordering::Relaxed);
        let (mut sink, mut stream) = socket.split();

        // Subscribe before greeting so a greeted client never misses a broadcast.
        let mut inbox = self.fanout.subscribe();
        if let Err(err) = sink.send(Message::Text(GREETING.to_string())).await {
            warn!(client, error = %err, "failed to greet client");
            return;
        }
        info!(client, clients = self.client_count(), "client connected");

        let mut outbound = tokio::spawn(async move {
            loop {
                match inbox.recv().await {
                    Ok(Broadcast { from, .. }) if from == client => continue,
                    Ok(Broadcast { message, .. }) => {
                        if sink.send(message).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(client, skipped, "client lagging; messages dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        loop {
            let next = tokio::select! {
                _ = &mut outbound => break,
                next = stream.next() => next,
            };

            let message = match next {
                Some(Ok(message @ (Message::Text(_) | Message::Binary(_)))) => message,
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => continue,
                Some(Err(err)) => {
                    warn!(client, error = %err, "client read failed");
                    break;
                }
            };

            debug!(client, "rebroadcasting message");
            // No receivers simply means nobody else is listening.
            let _ = self.fanout.send(Broadcast {
                from: client,
                message,
            });
        }

        outbound.abort();
        info!(client, "client disconnected");
    }
}

async fn upgrade(ws: WebSocketUpgrade, Extension(broker): Extension<Broker>) -> Response {
    ws.on_upgrade(move |socket| broker.serve_client(socket))
}

pub fn build_app(broker: Broker) -> Router {
    Router::new()
        .route("/", get(upgrade))
        .layer(Extension(broker))
}
