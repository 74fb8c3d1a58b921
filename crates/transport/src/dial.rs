//! Dialing with an infinite, fixed-backoff, cancellable retry policy.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::endpoint::Endpoint;
use crate::error::TransportError;

/// Fixed delay between failed dial attempts.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(3);

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How a transport re-establishes its session.
///
/// No attempt limit: dialing stops only on success or cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub backoff: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl ReconnectPolicy {
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }
}

/// Dial `endpoint` until it answers or `cancel` fires.
pub(crate) async fn dial(
    endpoint: &Endpoint,
    policy: ReconnectPolicy,
    cancel: &CancellationToken,
) -> Result<WsStream, TransportError> {
    let url = endpoint.url();
    let mut attempt: u64 = 0;

    loop {
        attempt += 1;

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransportError::Cancelled),
            res = connect_async(url.as_str()) => res,
        };

        match result {
            Ok((stream, _response)) => {
                debug!(endpoint = %endpoint, attempt, "websocket handshake complete");
                return Ok(stream);
            }
            Err(err) => {
                warn!(
                    endpoint = %endpoint,
                    attempt,
                    backoff_ms = policy.backoff.as_millis() as u64,
                    error = %err,
                    "dial failed; retrying"
                );
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransportError::Cancelled),
            _ = tokio::time::sleep(policy.backoff) => {}
        }
    }
}
