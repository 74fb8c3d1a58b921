use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use pubsub_core::{AccountId, Event};
use pubsub_observability::LineSink;

use super::TerminalSink;

pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(1);

pub const REPORT_HEADER: &str = "Aggregated messages received for accounts";

/// Counts events per account and reports the running totals on every tick.
///
/// Totals are cumulative for the lifetime of the process; a report never
/// resets them. Accounts are listed in ascending id order.
pub struct Aggregator {
    counts: BTreeMap<AccountId, u64>,
    lines: Arc<dyn LineSink>,
    interval: Duration,
    grace: Duration,
}

impl Aggregator {
    pub fn new(lines: Arc<dyn LineSink>) -> Self {
        Self {
            counts: BTreeMap::new(),
            lines,
            interval: DEFAULT_REPORT_INTERVAL,
            grace: DEFAULT_GRACE_PERIOD,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn counts(&self) -> &BTreeMap<AccountId, u64> {
        &self.counts
    }

    pub fn report(&self) -> Vec<String> {
        std::iter::once(REPORT_HEADER.to_string())
            .chain(
                self.counts
                    .iter()
                    .map(|(id, n)| format!("ID: {id}, number of messages {n}")),
            )
            .collect()
    }
}

impl TerminalSink for Aggregator {
    fn name(&self) -> &'static str {
        "aggregator"
    }

    fn consume(&mut self, event: Event) {
        *self.counts.entry(event.account_id().clone()).or_default() += 1;
    }

    fn tick_interval(&self) -> Option<Duration> {
        Some(self.interval)
    }

    fn on_tick(&mut self) {
        for line in self.report() {
            self.lines.emit(&line);
        }
    }

    fn grace_period(&self) -> Duration {
        self.grace
    }
}
