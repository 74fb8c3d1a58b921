//! Tracker: accepts account activity over HTTP and forwards it to the publisher.

pub mod app;
pub mod config;
pub mod routes;
pub mod store;

pub use app::{AppState, build_app};
pub use config::{ConfigError, PublisherConfig, TrackerArgs, TrackerConfig};
pub use store::{Account, AccountStore, InMemoryAccountStore, StoreError};
