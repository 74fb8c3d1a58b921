//! `pubsub-core`: the event model shared by the tracker, broker and subscriber.
//!
//! This crate contains **pure data** primitives (no IO, no runtime).

pub mod error;
pub mod event;
pub mod id;

pub use error::DomainError;
pub use event::{DecodeError, Event};
pub use id::AccountId;
