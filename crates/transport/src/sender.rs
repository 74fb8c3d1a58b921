//! Producer-side transport: forward one event per WebSocket message.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use pubsub_core::Event;

use crate::dial::{ReconnectPolicy, WsStream, dial};
use crate::endpoint::Endpoint;
use crate::error::TransportError;

/// Outbound event notification (serialize + single write).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_event(&self, event: &Event) -> Result<(), TransportError>;
}

#[async_trait]
impl<N> Notifier for Arc<N>
where
    N: Notifier + ?Sized,
{
    async fn send_event(&self, event: &Event) -> Result<(), TransportError> {
        (**self).send_event(event).await
    }
}

/// WebSocket [`Notifier`] connected to the broker.
///
/// The read half is drained in a background task: the broker greets every
/// client and rebroadcasts other publishers' events, none of which concern a
/// producer, but unread frames would otherwise stall the connection.
pub struct WsSender {
    endpoint: Endpoint,
    sink: Mutex<SplitSink<WsStream, Message>>,
}

impl WsSender {
    /// Dial the broker, retrying with `policy` until it answers or `cancel` fires.
    pub async fn connect(
        endpoint: Endpoint,
        policy: ReconnectPolicy,
        cancel: &CancellationToken,
    ) -> Result<Self, TransportError> {
        info!(endpoint = %endpoint, "connecting to publisher");
        let stream = dial(&endpoint, policy, cancel).await?;
        info!(endpoint = %endpoint, "successfully connected to publisher");

        let (sink, mut source) = stream.split();
        let drain_endpoint = endpoint.clone();
        tokio::spawn(async move {
            while let Some(msg) = source.next().await {
                match msg {
                    Ok(msg) => debug!(endpoint = %drain_endpoint, ?msg, "ignoring inbound message"),
                    Err(err) => {
                        debug!(endpoint = %drain_endpoint, error = %err, "inbound stream failed");
                        break;
                    }
                }
            }
        });

        Ok(Self {
            endpoint,
            sink: Mutex::new(sink),
        })
    }

    /// Send a close frame and shut the write half down.
    pub async fn close(&self) -> Result<(), TransportError> {
        self.sink.lock().await.close().await?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for WsSender {
    async fn send_event(&self, event: &Event) -> Result<(), TransportError> {
        let payload = event.encode()?;
        debug!(endpoint = %self.endpoint, %payload, "sending message to socket");

        self.sink.lock().await.send(Message::Text(payload)).await?;
        Ok(())
    }
}
