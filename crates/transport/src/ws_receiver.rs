//! WebSocket-backed [`Receiver`].

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::dial::{ReconnectPolicy, WsStream, dial};
use crate::endpoint::Endpoint;
use crate::error::TransportError;
use crate::receiver::Receiver;

type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Reconnecting WebSocket receiver.
///
/// The socket is split so that a reader blocked in [`Receiver::read_frame`]
/// does not prevent the shutdown path from writing the close frame.
///
/// `closed` is written with release and read with acquire ordering: everything the
/// closing task did before flipping the flag is visible to a reader that sees
/// it set. `shutdown` is cancelled by [`Receiver::close`] (and by the optional
/// parent token) to wake a reader parked on the socket or a dial in backoff.
pub struct WsReceiver {
    endpoint: Endpoint,
    policy: ReconnectPolicy,
    sink: Mutex<Option<WsSink>>,
    source: Mutex<Option<WsSource>>,
    closed: AtomicBool,
    shutdown: CancellationToken,
}

impl WsReceiver {
    pub fn new(endpoint: Endpoint) -> Self {
        Self::with_cancellation(endpoint, CancellationToken::new())
    }

    /// Create a receiver whose dialing and reads also stop when `parent` is
    /// cancelled (e.g. on Ctrl-C while the broker is still unreachable).
    pub fn with_cancellation(endpoint: Endpoint, parent: CancellationToken) -> Self {
        Self {
            endpoint,
            policy: ReconnectPolicy::default(),
            sink: Mutex::new(None),
            source: Mutex::new(None),
            closed: AtomicBool::new(false),
            shutdown: parent.child_token(),
        }
    }

    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn mark_closed(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(endpoint = %self.endpoint, "receiver marked closed");
        }
    }

    /// One read attempt on the current socket.
    ///
    /// Control frames are skipped; a close from the peer or the end of the
    /// stream is a failure. If shutdown fires the receiver is marked closed and
    /// an empty frame is returned.
    async fn read_once(&self) -> Result<Vec<u8>, TransportError> {
        let mut guard = self.source.lock().await;
        let source = guard.as_mut().ok_or(TransportError::NotConnected)?;

        loop {
            let next = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    self.mark_closed();
                    return Ok(Vec::new());
                }
                next = source.next() => next,
            };

            match next {
                Some(Ok(Message::Text(text))) => return Ok(text.into_bytes()),
                Some(Ok(Message::Binary(bytes))) => return Ok(bytes),
                Some(Ok(Message::Close(frame))) => {
                    debug!(endpoint = %self.endpoint, ?frame, "peer sent close frame");
                    return Err(TransportError::PeerClosed);
                }
                Some(Ok(_)) => continue,
                Some(Err(err)) => return Err(err.into()),
                None => return Err(TransportError::PeerClosed),
            }
        }
    }
}

#[async_trait]
impl Receiver for WsReceiver {
    async fn connect(&self) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }

        info!(endpoint = %self.endpoint, "connecting");
        let stream = dial(&self.endpoint, self.policy, &self.shutdown).await?;

        // close() marks the receiver before taking the sink lock, so checking
        // under that lock orders the install against it.
        let mut sink_slot = self.sink.lock().await;
        if self.is_closed() {
            return Err(TransportError::Closed);
        }

        let (sink, source) = stream.split();
        *self.source.lock().await = Some(source);
        *sink_slot = Some(sink);
        drop(sink_slot);

        info!(endpoint = %self.endpoint, "connected");
        Ok(())
    }

    async fn read_frame(&self) -> Result<Vec<u8>, TransportError> {
        if self.is_closed() {
            return Ok(Vec::new());
        }

        match self.read_once().await {
            Ok(frame) => return Ok(frame),
            Err(_) if self.is_closed() => return Ok(Vec::new()),
            Err(err) => {
                warn!(endpoint = %self.endpoint, error = %err, "read failed; reconnecting");
            }
        }

        match self.connect().await {
            Ok(()) => {}
            Err(_) if self.is_closed() => return Ok(Vec::new()),
            Err(err) => return Err(err),
        }

        match self.read_once().await {
            Ok(frame) => Ok(frame),
            Err(_) if self.is_closed() => Ok(Vec::new()),
            Err(err) => Err(TransportError::unrecoverable(format!(
                "read failed again after reconnecting to {}: {err}",
                self.endpoint
            ))),
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.mark_closed();
        self.shutdown.cancel();

        let sink = self.sink.lock().await.take();
        // Taking the source drops the read half once any parked reader has left.
        let source = self.source.lock().await.take();
        drop(source);

        match sink {
            Some(mut sink) => {
                sink.close().await?;
                info!(endpoint = %self.endpoint, "connection closed");
                Ok(())
            }
            None => Err(TransportError::NotConnected),
        }
    }

    async fn send_close_frame(&self) -> Result<(), TransportError> {
        self.mark_closed();

        let mut guard = self.sink.lock().await;
        let sink = guard.as_mut().ok_or(TransportError::NotConnected)?;
        sink.send(Message::Close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: "".into(),
        })))
        .await?;

        debug!(endpoint = %self.endpoint, "close frame sent");
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
