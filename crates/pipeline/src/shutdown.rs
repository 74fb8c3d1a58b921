//! Pipeline-wide shutdown coordination.
//!
//! Two signals, two audiences:
//!
//! - **interrupt**: an external request to stop (SIGINT, a test). Only the
//!   terminal stage listens for it; it answers by draining and closing the
//!   transport.
//! - **halt**: every stage exits promptly once it fires. It is raised when the
//!   terminal stage has completed its drain, or by the coordinator when a stage
//!   fails.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    interrupt: CancellationToken,
    halt: CancellationToken,
    completed: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tie the interrupt signal to an existing token (e.g. a Ctrl-C handler).
    pub fn with_interrupt(interrupt: CancellationToken) -> Self {
        Self {
            interrupt,
            ..Self::default()
        }
    }

    /// Request a graceful drain.
    pub fn interrupt(&self) {
        self.interrupt.cancel();
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupt.is_cancelled()
    }

    pub async fn interrupted(&self) {
        self.interrupt.cancelled().await
    }

    /// Stop every stage now.
    pub fn halt(&self) {
        self.halt.cancel();
    }

    pub fn is_halted(&self) -> bool {
        self.halt.is_cancelled()
    }

    pub async fn halted(&self) {
        self.halt.cancelled().await
    }

    /// Called by the terminal stage once the transport is closed.
    pub fn complete(&self) {
        self.completed.store(true, Ordering::Release);
        self.halt();
    }

    /// Whether the terminal stage finished its drain sequence.
    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }
}
