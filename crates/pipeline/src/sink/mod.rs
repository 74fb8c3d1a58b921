//! Terminal stages.
//!
//! A [`TerminalSink`] decides what happens to each delivered event; the
//! [`TerminalStage`] that drives it owns the transport teardown:
//!
//! ```text
//! Running ──interrupt──▶ Draining ──close()──▶ Closed
//! ```
//!
//! Draining sends the close frame, keeps serving input and ticks for the sink's
//! grace period, closes the transport and finally signals completion.

mod aggregator;
mod printer;

pub use aggregator::{Aggregator, DEFAULT_GRACE_PERIOD, DEFAULT_REPORT_INTERVAL, REPORT_HEADER};
pub use printer::Printer;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at, sleep_until};
use tracing::{debug, info, warn};

use pubsub_core::Event;
use pubsub_transport::Receiver;

use crate::conduit::Inlet;
use crate::error::PipelineError;
use crate::shutdown::Shutdown;
use crate::stage::Stage;
use crate::stats::PipelineStats;

/// Which terminal sink receives the routed events.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum SinkMode {
    #[default]
    Print,
    Aggregate,
}

impl SinkMode {
    /// `--agg` on the command line.
    pub fn from_aggregate_flag(aggregate: bool) -> Self {
        if aggregate {
            Self::Aggregate
        } else {
            Self::Print
        }
    }
}

/// What a terminal stage does with its events.
pub trait TerminalSink: Send {
    fn name(&self) -> &'static str;

    fn consume(&mut self, event: Event);

    /// Period of [`TerminalSink::on_tick`]; `None` or a zero period disables ticking.
    fn tick_interval(&self) -> Option<Duration> {
        None
    }

    fn on_tick(&mut self) {}

    /// How long to keep serving input after the close frame went out.
    fn grace_period(&self) -> Duration {
        Duration::ZERO
    }
}

/// Lifecycle of a [`TerminalStage`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TerminalState {
    Running,
    Draining,
    Closed,
}

/// Last stage of the pipeline: feeds a [`TerminalSink`] and, on interrupt,
/// runs the drain sequence against the transport.
pub struct TerminalStage {
    sink: Box<dyn TerminalSink>,
    input: Inlet<Event>,
    receiver: Arc<dyn Receiver>,
    stats: Arc<PipelineStats>,
    state: TerminalState,
}

impl TerminalStage {
    pub fn new(
        sink: Box<dyn TerminalSink>,
        input: Inlet<Event>,
        receiver: Arc<dyn Receiver>,
        stats: Arc<PipelineStats>,
    ) -> Self {
        Self {
            sink,
            input,
            receiver,
            stats,
            state: TerminalState::Running,
        }
    }

    pub fn state(&self) -> TerminalState {
        self.state
    }

    fn transition(&mut self, next: TerminalState) {
        debug!(sink = self.sink.name(), from = ?self.state, to = ?next, "terminal stage transition");
        self.state = next;
    }

    fn deliver(&mut self, event: Event) {
        self.stats.event_delivered();
        self.sink.consume(event);
    }

    /// Serve input and ticks until interrupted. Returns `false` on halt.
    async fn serve(&mut self, ticker: &mut Option<Interval>, shutdown: &Shutdown) -> bool {
        let mut input_open = true;
        loop {
            tokio::select! {
                biased;
                _ = shutdown.interrupted() => return true,
                _ = shutdown.halted() => return false,
                _ = next_tick(ticker) => self.sink.on_tick(),
                event = self.input.recv(), if input_open => match event {
                    Some(event) => self.deliver(event),
                    None => input_open = false,
                },
            }
        }
    }

    /// Keep serving input and ticks until `deadline`.
    async fn linger(&mut self, ticker: &mut Option<Interval>, deadline: Instant, shutdown: &Shutdown) {
        let grace = sleep_until(deadline);
        tokio::pin!(grace);

        let mut input_open = true;
        loop {
            tokio::select! {
                biased;
                _ = &mut grace => return,
                _ = shutdown.halted() => return,
                _ = next_tick(ticker) => self.sink.on_tick(),
                event = self.input.recv(), if input_open => match event {
                    Some(event) => self.deliver(event),
                    None => input_open = false,
                },
            }
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[async_trait]
impl Stage for TerminalStage {
    fn name(&self) -> &'static str {
        self.sink.name()
    }

    async fn run(self: Box<Self>, shutdown: Shutdown) -> Result<(), PipelineError> {
        let mut stage = *self;
        let period = stage.sink.tick_interval().filter(|period| !period.is_zero());
        if period.is_none() {
            debug!(sink = stage.sink.name(), "ticking disabled");
        }
        let mut ticker = period.map(|period| {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });

        if !stage.serve(&mut ticker, &shutdown).await {
            return Ok(());
        }

        stage.transition(TerminalState::Draining);
        info!(sink = stage.sink.name(), "interrupt received; closing connection");
        if let Err(err) = stage.receiver.send_close_frame().await {
            warn!(error = %err, "failed to send close frame");
        }

        let grace = stage.sink.grace_period();
        if !grace.is_zero() {
            stage.linger(&mut ticker, Instant::now() + grace, &shutdown).await;
        }

        if let Err(err) = stage.receiver.close().await {
            warn!(error = %err, "failed to close connection");
        }
        stage.transition(TerminalState::Closed);
        shutdown.complete();
        Ok(())
    }
}
