//! The subscriber's message-processing pipeline.
//!
//! ```text
//! Receiver ─▶ [frames] ─▶ Decoder ─▶ [events] ─▶ Filter ─▶ [events] ─▶ Router ─▶ [events] ─▶ Printer | Aggregator
//! ```
//!
//! Every arrow is a bounded conduit; every box is an independently scheduled
//! task. Intermediate stages wait on their conduit *and* the halt signal at the
//! same time, so they neither spin nor outlive the pipeline. The terminal stage
//! owns the transport teardown.

pub mod conduit;
pub mod error;
pub mod pipeline;
pub mod shutdown;
pub mod sink;
pub mod stage;
pub mod stages;
pub mod stats;

pub use error::PipelineError;
pub use pipeline::{Pipeline, PipelineConfig, PipelineHandle};
pub use shutdown::Shutdown;
pub use sink::{Aggregator, Printer, SinkMode, TerminalSink, TerminalStage};
pub use stage::Stage;
pub use stats::{PipelineStats, StatsSnapshot};
