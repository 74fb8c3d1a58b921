//! In-process loopback [`Receiver`].
//!
//! Frames pushed through a [`MemoryPeer`] come out of
//! [`MemoryReceiver::read_frame`] in order. Every socket-level operation is
//! recorded in a journal so callers can assert on the shutdown sequence.

use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use crate::error::TransportError;
use crate::receiver::Receiver;

const PEER_CAPACITY: usize = 64;

/// A transport operation that reached the (simulated) socket.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransportOp {
    Connect,
    Read,
    SendCloseFrame,
    Close,
}

/// Writing end of a loopback transport.
#[derive(Debug, Clone)]
pub struct MemoryPeer {
    tx: mpsc::Sender<Vec<u8>>,
}

impl MemoryPeer {
    /// Deliver one frame; waits if the receiver is not keeping up.
    pub async fn send(&self, frame: impl Into<Vec<u8>>) -> Result<(), TransportError> {
        self.tx
            .send(frame.into())
            .await
            .map_err(|_| TransportError::PeerClosed)
    }
}

/// Loopback receiver; see the module docs.
///
/// Dropping every [`MemoryPeer`] simulates a peer that went away for good:
/// there is nothing to reconnect to, so the next read is unrecoverable.
#[derive(Debug)]
pub struct MemoryReceiver {
    frames: Mutex<mpsc::Receiver<Vec<u8>>>,
    closed: AtomicBool,
    shutdown: CancellationToken,
    journal: StdMutex<Vec<TransportOp>>,
}

impl MemoryReceiver {
    pub fn pair() -> (Self, MemoryPeer) {
        let (tx, rx) = mpsc::channel(PEER_CAPACITY);
        let receiver = Self {
            frames: Mutex::new(rx),
            closed: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
            journal: StdMutex::new(Vec::new()),
        };
        (receiver, MemoryPeer { tx })
    }

    /// Operations performed so far, in order.
    pub fn journal(&self) -> Vec<TransportOp> {
        self.journal.lock().map(|j| j.clone()).unwrap_or_default()
    }

    fn record(&self, op: TransportOp) {
        if let Ok(mut journal) = self.journal.lock() {
            journal.push(op);
        }
    }
}

#[async_trait]
impl Receiver for MemoryReceiver {
    async fn connect(&self) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        self.record(TransportOp::Connect);
        Ok(())
    }

    async fn read_frame(&self) -> Result<Vec<u8>, TransportError> {
        if self.is_closed() {
            return Ok(Vec::new());
        }
        self.record(TransportOp::Read);

        let mut frames = self.frames.lock().await;
        let next = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => return Ok(Vec::new()),
            next = frames.recv() => next,
        };

        match next {
            Some(frame) => Ok(frame),
            None if self.is_closed() => Ok(Vec::new()),
            None => Err(TransportError::unrecoverable("loopback peer dropped")),
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::Release);
        self.shutdown.cancel();
        self.record(TransportOp::Close);
        Ok(())
    }

    async fn send_close_frame(&self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::Release);
        self.record(TransportOp::SendCloseFrame);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
