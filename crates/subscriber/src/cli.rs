//! Command-line flags.

use std::time::Duration;

use clap::Parser;

use pubsub_observability::LogFormat;
use pubsub_pipeline::{PipelineConfig, SinkMode};
use pubsub_transport::Endpoint;

#[derive(Debug, Clone, Parser)]
#[command(name = "subscriber", version, about = "Subscribe to the publisher and print or aggregate account events")]
pub struct Cli {
    /// Publisher address (`host:port` or `ws://host:port`).
    #[arg(long, env = "SUBSCRIBER_ADDR", default_value = "0.0.0.0:8000")]
    pub addr: Endpoint,

    /// Only handle events of this account id; empty handles every account.
    #[arg(long, env = "SUBSCRIBER_FILTER", default_value = "")]
    pub filter: String,

    /// Report per-account counts instead of printing each event.
    #[arg(long, env = "SUBSCRIBER_AGG")]
    pub agg: bool,

    /// Seconds between aggregate reports.
    #[arg(
        long,
        env = "SUBSCRIBER_AGGFREQ",
        default_value_t = 3,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub aggfreq: u64,

    /// Log output: `json` or `pretty`.
    #[arg(long, env = "SUBSCRIBER_LOG_FORMAT", default_value = "json")]
    pub log_format: LogFormat,
}

impl Cli {
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::default()
            .with_filter(&self.filter)
            .with_mode(SinkMode::from_aggregate_flag(self.agg))
            .with_aggregate_interval(Duration::from_secs(self.aggfreq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("subscriber").chain(args.iter().copied()))
    }

    #[test]
    fn defaults() {
        let cli = parse(&[]).unwrap();
        assert_eq!(cli.addr, Endpoint::new("0.0.0.0", 8000).unwrap());
        assert_eq!(cli.filter, "");
        assert!(!cli.agg);
        assert_eq!(cli.aggfreq, 3);

        let config = cli.pipeline_config();
        assert_eq!(config.filter, None);
        assert_eq!(config.mode, SinkMode::Print);
        assert_eq!(config.aggregate_interval, Duration::from_secs(3));
    }

    #[test]
    fn aggregate_with_filter() {
        let cli = parse(&["--addr", "ws://broker:9000", "--filter", "t1", "--agg", "--aggfreq", "5"]).unwrap();
        assert_eq!(cli.addr.url(), "ws://broker:9000/");

        let config = cli.pipeline_config();
        assert_eq!(config.filter.as_ref().map(|a| a.as_str()), Some("t1"));
        assert_eq!(config.mode, SinkMode::Aggregate);
        assert_eq!(config.aggregate_interval, Duration::from_secs(5));
    }

    #[test]
    fn rejects_zero_frequency_and_bad_addresses() {
        assert!(parse(&["--aggfreq", "0"]).is_err());
        assert!(parse(&["--addr", "no-port"]).is_err());
        assert!(parse(&["--addr", "wss://secure:443"]).is_err());
    }
}
