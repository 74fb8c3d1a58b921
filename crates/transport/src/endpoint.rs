//! Broker endpoint addressing.

use core::fmt;
use core::str::FromStr;

use crate::error::TransportError;

const DEFAULT_SCHEME: &str = "ws";

/// A single `host:port` WebSocket endpoint.
///
/// Accepts either a bare address (`0.0.0.0:8000`) or a `ws://` URL. TLS
/// (`wss://`) is not supported by this transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, TransportError> {
        let host = host.into();
        if host.is_empty() {
            return Err(TransportError::InvalidEndpoint("host must not be empty".into()));
        }
        Ok(Self { host, port })
    }

    /// Build from a scheme, host and port, as found in service configuration.
    pub fn with_scheme(scheme: &str, host: &str, port: u16) -> Result<Self, TransportError> {
        if scheme != DEFAULT_SCHEME {
            return Err(TransportError::InvalidEndpoint(format!(
                "unsupported scheme `{scheme}` (only `{DEFAULT_SCHEME}` is supported)"
            )));
        }
        Self::new(host, port)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The URL handed to the WebSocket dialer.
    pub fn url(&self) -> String {
        format!("{DEFAULT_SCHEME}://{}:{}/", self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for Endpoint {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let addr = match s.split_once("://") {
            Some((scheme, rest)) if scheme == DEFAULT_SCHEME => rest,
            Some((scheme, _)) => {
                return Err(TransportError::InvalidEndpoint(format!(
                    "unsupported scheme `{scheme}`"
                )));
            }
            None => s,
        };
        let addr = addr.trim_end_matches('/');

        let (host, port) = addr
            .rsplit_once(':')
            .ok_or_else(|| TransportError::InvalidEndpoint(format!("`{s}` is not host:port")))?;
        let port = port
            .parse::<u16>()
            .map_err(|e| TransportError::InvalidEndpoint(format!("`{s}`: bad port: {e}")))?;

        Self::new(host, port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_address() {
        let ep: Endpoint = "0.0.0.0:8000".parse().unwrap();
        assert_eq!(ep.host(), "0.0.0.0");
        assert_eq!(ep.port(), 8000);
        assert_eq!(ep.url(), "ws://0.0.0.0:8000/");
        assert_eq!(ep.to_string(), "0.0.0.0:8000");
    }

    #[test]
    fn parses_ws_url() {
        let ep: Endpoint = "ws://localhost:9001/".parse().unwrap();
        assert_eq!(ep, Endpoint::new("localhost", 9001).unwrap());
    }

    #[test]
    fn rejects_bad_input() {
        assert!("localhost".parse::<Endpoint>().is_err());
        assert!("localhost:notaport".parse::<Endpoint>().is_err());
        assert!(":8000".parse::<Endpoint>().is_err());
        assert!("wss://localhost:443".parse::<Endpoint>().is_err());
        assert!(Endpoint::with_scheme("http", "localhost", 80).is_err());
    }
}
