//! Pipeline wiring and supervision.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info};

use pubsub_core::{AccountId, Event};
use pubsub_observability::LineSink;
use pubsub_transport::Receiver;

use crate::conduit::{CONDUIT_CAPACITY, conduit};
use crate::error::PipelineError;
use crate::shutdown::Shutdown;
use crate::sink::{
    Aggregator, DEFAULT_GRACE_PERIOD, DEFAULT_REPORT_INTERVAL, Printer, SinkMode, TerminalSink,
    TerminalStage,
};
use crate::stage::Stage;
use crate::stages::{Decoder, Filter, ReceiverStage, Router};
use crate::stats::PipelineStats;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub filter: Option<AccountId>,
    pub mode: SinkMode,
    pub aggregate_interval: Duration,
    pub grace_period: Duration,
    pub conduit_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            filter: None,
            mode: SinkMode::Print,
            aggregate_interval: DEFAULT_REPORT_INTERVAL,
            grace_period: DEFAULT_GRACE_PERIOD,
            conduit_capacity: CONDUIT_CAPACITY,
        }
    }
}

impl PipelineConfig {
    /// Only forward events of `account`; an empty string disables filtering.
    pub fn with_filter(mut self, account: &str) -> Self {
        self.filter = AccountId::new(account).ok();
        self
    }

    pub fn with_mode(mut self, mode: SinkMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_aggregate_interval(mut self, interval: Duration) -> Self {
        self.aggregate_interval = interval;
        self
    }

    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace_period = grace;
        self
    }
}

/// The wired stage graph, not yet running.
///
/// Stages are kept in flow order: receiver, decoder, filter, router, terminal.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
    stats: Arc<PipelineStats>,
}

impl Pipeline {
    pub fn new(receiver: Arc<dyn Receiver>, config: PipelineConfig, lines: Arc<dyn LineSink>) -> Self {
        let stats = Arc::new(PipelineStats::default());
        let capacity = config.conduit_capacity;

        let (frames_tx, frames_rx) = conduit::<Vec<u8>>(capacity);
        let (decoded_tx, decoded_rx) = conduit::<Event>(capacity);
        let (filtered_tx, filtered_rx) = conduit::<Event>(capacity);
        let (routed_tx, routed_rx) = conduit::<Event>(capacity);

        let sink: Box<dyn TerminalSink> = match config.mode {
            SinkMode::Print => Box::new(Printer::new(lines)),
            SinkMode::Aggregate => Box::new(
                Aggregator::new(lines)
                    .with_interval(config.aggregate_interval)
                    .with_grace_period(config.grace_period),
            ),
        };

        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(ReceiverStage::new(receiver.clone(), frames_tx, stats.clone())),
            Box::new(Decoder::new(frames_rx, decoded_tx, stats.clone())),
            Box::new(Filter::new(config.filter, decoded_rx, filtered_tx, stats.clone())),
            Box::new(Router::new(config.mode, filtered_rx, routed_tx)),
            Box::new(TerminalStage::new(sink, routed_rx, receiver, stats.clone())),
        ];

        Self { stages, stats }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn stats(&self) -> Arc<PipelineStats> {
        self.stats.clone()
    }

    pub fn spawn(self) -> PipelineHandle {
        self.spawn_with(Shutdown::new())
    }

    /// Start every stage on its own task, sharing `shutdown`.
    pub fn spawn_with(self, shutdown: Shutdown) -> PipelineHandle {
        let mut tasks = JoinSet::new();

        for stage in self.stages {
            let name = stage.name();
            let stage_task = tokio::spawn(stage.run(shutdown.clone()));
            // The inner handle turns a panicking stage into a JoinError we can attribute.
            tasks.spawn(async move { (name, stage_task.await) });
            debug!(stage = name, "stage started");
        }

        info!("pipeline started");
        PipelineHandle {
            shutdown,
            stats: self.stats,
            tasks,
        }
    }
}

type StageOutcome = (&'static str, Result<Result<(), PipelineError>, JoinError>);

/// Handle to a running pipeline.
pub struct PipelineHandle {
    shutdown: Shutdown,
    stats: Arc<PipelineStats>,
    tasks: JoinSet<StageOutcome>,
}

impl PipelineHandle {
    /// Ask the terminal stage to drain and close the transport.
    pub fn interrupt(&self) {
        self.shutdown.interrupt();
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    pub fn stats(&self) -> Arc<PipelineStats> {
        self.stats.clone()
    }

    /// Wait until every stage has stopped.
    ///
    /// The first stage failure halts the rest of the pipeline and is returned
    /// once they are gone.
    pub async fn wait(mut self) -> Result<(), PipelineError> {
        let mut failure = None;

        while let Some(joined) = self.tasks.join_next().await {
            let err = match joined {
                Ok((_, Ok(Ok(())))) => continue,
                Ok((_, Ok(Err(err)))) => err,
                Ok((stage, Err(join))) => PipelineError::StageAborted {
                    stage,
                    reason: join.to_string(),
                },
                Err(join) => PipelineError::StageAborted {
                    stage: "supervisor",
                    reason: join.to_string(),
                },
            };

            error!(error = %err, "pipeline stage failed; halting");
            self.shutdown.halt();
            failure.get_or_insert(err);
        }

        match failure {
            Some(err) => Err(err),
            None => {
                info!(completed = self.shutdown.is_completed(), "pipeline stopped");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pubsub_observability::CaptureSink;
    use pubsub_transport::MemoryReceiver;

    #[test]
    fn empty_filter_means_no_filter() {
        assert_eq!(PipelineConfig::default().with_filter("").filter, None);
        assert_eq!(
            PipelineConfig::default().with_filter("t1").filter,
            Some(AccountId::new("t1").unwrap())
        );
    }

    #[test]
    fn defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.mode, SinkMode::Print);
        assert_eq!(config.aggregate_interval, Duration::from_secs(3));
        assert_eq!(config.grace_period, Duration::from_secs(1));
        assert_eq!(config.conduit_capacity, 5);
    }

    #[tokio::test]
    async fn stages_are_wired_in_flow_order() {
        let (receiver, _peer) = MemoryReceiver::pair();
        let lines = Arc::new(CaptureSink::new());

        let print = Pipeline::new(Arc::new(receiver), PipelineConfig::default(), lines.clone());
        assert_eq!(
            print.stage_names(),
            vec!["receiver", "decoder", "filter", "router", "printer"]
        );

        let (receiver, _peer) = MemoryReceiver::pair();
        let aggregate = Pipeline::new(
            Arc::new(receiver),
            PipelineConfig::default().with_mode(SinkMode::Aggregate),
            lines,
        );
        assert_eq!(aggregate.stage_names().last(), Some(&"aggregator"));
    }
}
