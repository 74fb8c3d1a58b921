//! Transport layer: the persistent WebSocket session between services and the broker.
//!
//! - [`Receiver`]: the subscriber-side read contract (connect / read / close).
//! - [`Notifier`]: the producer-side write contract (one event, one message).
//! - [`WsReceiver`] / [`WsSender`]: WebSocket implementations with a fixed-backoff,
//!   infinite, cancellable dial policy.
//! - [`MemoryReceiver`]: an in-process loopback used by tests and demos.

pub mod dial;
pub mod endpoint;
pub mod error;
pub mod memory;
pub mod receiver;
pub mod sender;
pub mod ws_receiver;

pub use dial::ReconnectPolicy;
pub use endpoint::Endpoint;
pub use error::TransportError;
pub use memory::{MemoryPeer, MemoryReceiver, TransportOp};
pub use receiver::Receiver;
pub use sender::{Notifier, WsSender};
pub use ws_receiver::WsReceiver;
