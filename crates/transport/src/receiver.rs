//! Subscriber-side transport contract.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransportError;

/// A reconnecting, frame-oriented session to a single broker endpoint.
///
/// ## Closing
///
/// [`Receiver::send_close_frame`] and [`Receiver::close`] both mark the receiver
/// closed *before* touching the socket. The closed flag is the only state shared
/// between the reading task and the task that tears the session down; once a
/// reader observes `is_closed() == true` it must stop reading and must not try
/// to reconnect.
///
/// ## Reading
///
/// `read_frame` blocks until one application frame arrives. An empty frame
/// means "nothing to deliver" (the receiver is closed or closing). Transient
/// failures are retried internally; only [`TransportError::Unrecoverable`]
/// (or a cancelled reconnect) escapes.
#[async_trait]
pub trait Receiver: Send + Sync {
    /// Establish the session, retrying until it succeeds or is cancelled.
    async fn connect(&self) -> Result<(), TransportError>;

    /// Block until the next frame arrives.
    async fn read_frame(&self) -> Result<Vec<u8>, TransportError>;

    /// Mark closed and release the underlying socket.
    async fn close(&self) -> Result<(), TransportError>;

    /// Mark closed and send a protocol-level close notification to the peer.
    async fn send_close_frame(&self) -> Result<(), TransportError>;

    fn is_closed(&self) -> bool;
}

#[async_trait]
impl<R> Receiver for Arc<R>
where
    R: Receiver + ?Sized,
{
    async fn connect(&self) -> Result<(), TransportError> {
        (**self).connect().await
    }

    async fn read_frame(&self) -> Result<Vec<u8>, TransportError> {
        (**self).read_frame().await
    }

    async fn close(&self) -> Result<(), TransportError> {
        (**self).close().await
    }

    async fn send_close_frame(&self) -> Result<(), TransportError> {
        (**self).send_close_frame().await
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}
