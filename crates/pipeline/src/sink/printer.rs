use std::sync::Arc;

use pubsub_core::Event;
use pubsub_observability::LineSink;

use super::TerminalSink;

/// Emits one line per delivered event.
pub struct Printer {
    lines: Arc<dyn LineSink>,
}

impl Printer {
    pub fn new(lines: Arc<dyn LineSink>) -> Self {
        Self { lines }
    }

    pub fn format(event: &Event) -> String {
        format!(
            "Received a data from active account id {}: data: {}, time: {}",
            event.account_id(),
            event.data(),
            event.timestamp()
        )
    }
}

impl TerminalSink for Printer {
    fn name(&self) -> &'static str {
        "printer"
    }

    fn consume(&mut self, event: Event) {
        self.lines.emit(&Self::format(&event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pubsub_core::AccountId;
    use pubsub_observability::CaptureSink;

    #[test]
    fn prints_one_line_per_event() {
        let capture = Arc::new(CaptureSink::new());
        let mut printer = Printer::new(capture.clone());

        printer.consume(Event::new(AccountId::new("test").unwrap(), "data", 1));

        assert_eq!(
            capture.lines(),
            vec!["Received a data from active account id test: data: data, time: 1".to_string()]
        );
        assert!(printer.tick_interval().is_none());
        assert!(printer.grace_period().is_zero());
    }
}
