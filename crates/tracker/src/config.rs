//! Tracker configuration.
//!
//! Sources, later ones overriding earlier ones:
//! 1. Built-in defaults
//! 2. A TOML file (`--config`, default `config.toml`; optional)
//! 3. Environment variables prefixed with `TRACKER_` (`__` separates nested
//!    keys, e.g. `TRACKER_PUBLISHER__PORT=9000`)
//!
//! ```toml
//! address = "localhost:8080"
//!
//! [publisher]
//! url = "localhost"
//! port = 8000
//! method = "ws"
//!
//! [[accounts]]
//! id = "5a638e99ed12aa438f5fef20"
//! name = "Ale"
//! is_active = true
//! ```

use std::path::{Path, PathBuf};

use clap::Parser;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;

use pubsub_observability::LogFormat;
use pubsub_transport::{Endpoint, TransportError};

use crate::store::{Account, StoreError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid publisher endpoint: {0}")]
    Publisher(#[from] TransportError),

    #[error("invalid account `{id}`: {source}")]
    Account { id: String, source: StoreError },
}

#[derive(Debug, Clone, Parser)]
#[command(name = "tracker", version, about = "Forward account activity to the publisher")]
pub struct TrackerArgs {
    /// Path of the TOML configuration file.
    #[arg(long, env = "TRACKER_CONFIG", default_value = "config.toml")]
    pub config: PathBuf,

    /// Log output: `json` or `pretty`.
    #[arg(long, env = "TRACKER_LOG_FORMAT", default_value = "json")]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PublisherConfig {
    pub url: String,
    pub port: u16,
    pub method: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackerConfig {
    /// `host:port` the HTTP server binds.
    pub address: String,
    pub publisher: PublisherConfig,
    #[serde(default)]
    pub accounts: Vec<Account>,
}

impl TrackerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("address", "localhost:8080")?
            .set_default("publisher.url", "localhost")?
            .set_default("publisher.port", 8000_i64)?
            .set_default("publisher.method", "ws")?
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("TRACKER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: TrackerConfig = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.publisher_endpoint()?;
        for account in &self.accounts {
            if !crate::store::is_object_id(&account.id) {
                return Err(ConfigError::Account {
                    id: account.id.clone(),
                    source: StoreError::InvalidId,
                });
            }
        }
        Ok(())
    }

    pub fn publisher_endpoint(&self) -> Result<Endpoint, TransportError> {
        Endpoint::with_scheme(&self.publisher.method, &self.publisher.url, self.publisher.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_toml(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn missing_file_uses_defaults() {
        let config = TrackerConfig::load(Path::new("/nonexistent/tracker.toml")).unwrap();
        assert_eq!(config.address, "localhost:8080");
        assert_eq!(
            config.publisher,
            PublisherConfig {
                url: "localhost".into(),
                port: 8000,
                method: "ws".into(),
            }
        );
        assert!(config.accounts.is_empty());
        assert_eq!(config.publisher_endpoint().unwrap().url(), "ws://localhost:8000/");
    }

    #[test]
    fn file_overrides_defaults_and_seeds_accounts() {
        let file = write_toml(
            r#"
address = "0.0.0.0:9090"

[publisher]
port = 9000

[[accounts]]
id = "5a638e99ed12aa438f5fef20"
name = "Ale"
is_active = true

[[accounts]]
id = "5a638e99ed12aa438f5fef21"
name = "Cla"
"#,
        );

        let config = TrackerConfig::load(file.path()).unwrap();
        assert_eq!(config.address, "0.0.0.0:9090");
        assert_eq!(config.publisher.url, "localhost");
        assert_eq!(config.publisher.port, 9000);
        assert_eq!(config.accounts.len(), 2);
        assert!(config.accounts[0].is_active);
        assert!(!config.accounts[1].is_active);
    }

    #[test]
    fn rejects_unsupported_method() {
        let file = write_toml("[publisher]\nmethod = \"wss\"\n");
        assert!(matches!(
            TrackerConfig::load(file.path()),
            Err(ConfigError::Publisher(_))
        ));
    }

    #[test]
    fn rejects_invalid_account_ids() {
        let file = write_toml("[[accounts]]\nid = \"test\"\n");
        assert!(matches!(
            TrackerConfig::load(file.path()),
            Err(ConfigError::Account { .. })
        ));
    }

    #[test]
    fn args_default_to_config_toml() {
        let args = TrackerArgs::try_parse_from(["tracker"]).unwrap();
        assert_eq!(args.config, PathBuf::from("config.toml"));
        assert_eq!(args.log_format, LogFormat::Json);
    }
}
