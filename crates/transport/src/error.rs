use thiserror::Error;

use tokio_tungstenite::tungstenite;

/// Transport-level failure.
///
/// Transient failures (dial errors, a dropped peer) are retried inside the
/// transport and never reach the caller; what escapes is either a local
/// condition (closed, cancelled) or [`TransportError::Unrecoverable`].
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("transport is not connected")]
    NotConnected,

    #[error("transport is closed")]
    Closed,

    #[error("connect cancelled")]
    Cancelled,

    #[error("peer closed the connection")]
    PeerClosed,

    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    /// A reconnect succeeded but the retried read failed as well.
    #[error("unrecoverable transport failure: {0}")]
    Unrecoverable(String),
}

impl TransportError {
    pub fn unrecoverable(msg: impl Into<String>) -> Self {
        Self::Unrecoverable(msg.into())
    }

    pub fn is_unrecoverable(&self) -> bool {
        matches!(self, Self::Unrecoverable(_))
    }
}
