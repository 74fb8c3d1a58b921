//! Intermediate stages: receive, decode, filter, route.

pub mod decode;
pub mod filter;
pub mod receive;
pub mod route;

pub use decode::Decoder;
pub use filter::Filter;
pub use receive::ReceiverStage;
pub use route::Router;
