//! Tracing, logging and output sinks (shared setup).

/// Initialize process-wide observability with the default (JSON) format.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(LogFormat::default());
}

/// Initialize process-wide observability with an explicit log format.
pub fn init_with(format: LogFormat) {
    tracing::init(format);
}

/// Tracing configuration (filters, layers).
pub mod tracing;

/// Line-oriented output sinks injected into pipeline stages.
pub mod logging;

pub use logging::{CaptureSink, LineSink, TracingSink};
pub use tracing::LogFormat;
