//! Output sinks for the lines a pipeline reports (printed events, aggregate
//! summaries). Stages receive a sink at construction instead of writing to a
//! global logger, so tests can capture exactly what was reported.

use std::sync::Mutex;

/// Destination for human-readable report lines.
pub trait LineSink: Send + Sync {
    fn emit(&self, line: &str);
}

/// Forwards every line to `tracing` at `INFO`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LineSink for TracingSink {
    fn emit(&self, line: &str) {
        tracing::info!("{line}");
    }
}

/// Keeps every line in memory.
#[derive(Debug, Default)]
pub struct CaptureSink {
    lines: Mutex<Vec<String>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines emitted so far, in order.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Number of emitted lines equal to `line`.
    pub fn count(&self, line: &str) -> usize {
        self.lines
            .lock()
            .map(|l| l.iter().filter(|l| l.as_str() == line).count())
            .unwrap_or(0)
    }
}

impl LineSink for CaptureSink {
    fn emit(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_sink_keeps_order() {
        let sink = CaptureSink::new();
        sink.emit("a");
        sink.emit("b");
        sink.emit("a");

        assert_eq!(sink.lines(), vec!["a", "b", "a"]);
        assert_eq!(sink.count("a"), 2);
    }
}
