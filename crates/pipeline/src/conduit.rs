//! Bounded hand-off channels between stages.
//!
//! A conduit connects exactly one producer stage to one consumer stage and
//! preserves FIFO order. A full conduit blocks the producer; that is the only
//! backpressure the pipeline applies.

use tokio::sync::mpsc;

use crate::shutdown::Shutdown;

/// Slots per conduit.
pub const CONDUIT_CAPACITY: usize = 5;

/// Consuming end of a conduit.
pub type Inlet<T> = mpsc::Receiver<T>;

/// Producing end of a conduit.
pub type Outlet<T> = mpsc::Sender<T>;

pub fn conduit<T>(capacity: usize) -> (Outlet<T>, Inlet<T>) {
    mpsc::channel(capacity.max(1))
}

/// Wait for the next item or the halt signal, whichever comes first.
///
/// `None` means "stop": either the pipeline halted or the producer is gone.
pub async fn recv_or_halt<T>(input: &mut Inlet<T>, shutdown: &Shutdown) -> Option<T> {
    tokio::select! {
        biased;
        _ = shutdown.halted() => None,
        item = input.recv() => item,
    }
}

/// Wait for a free slot or the halt signal.
///
/// Returns `false` if the item was not delivered and the caller should stop.
pub async fn send_or_halt<T>(output: &Outlet<T>, item: T, shutdown: &Shutdown) -> bool {
    tokio::select! {
        biased;
        _ = shutdown.halted() => false,
        sent = output.send(item) => sent.is_ok(),
    }
}
