// ── Runtime bridge configuration ──
//
// Describes *how* to reach one gateway. Carries the credential and
// connection tuning, but never touches disk — the CLI (or any other
// consumer) loads persisted settings and hands a `BridgeConfig` in.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::BridgeError;

/// Configuration for one gateway bridge.
///
/// The API key, once present, is never cleared by the core; the pairing
/// flow only ever writes a key in.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Gateway host name or IP, without a port.
    pub host: String,

    /// REST API port.
    pub http_port: u16,

    /// Websocket port override. Zero means "use the port the gateway
    /// reports in its full state".
    pub websocket_port: u16,

    /// API key issued by the gateway after operator approval.
    pub api_key: Option<SecretString>,

    /// Per-request HTTP timeout.
    pub timeout: Duration,

    /// Wait between retry attempts (pairing polls, state re-fetches,
    /// stream reconnects).
    pub poll_interval: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            http_port: 80,
            websocket_port: 0,
            api_key: None,
            timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(10),
        }
    }
}

impl BridgeConfig {
    /// Base REST endpoint: `http://{host}:{port}/api`.
    ///
    /// The pairing request posts here, with no key in the URL.
    pub fn base_url(&self) -> Result<Url, BridgeError> {
        parse_url(&format!("http://{}:{}/api", self.host, self.http_port))
    }

    /// Authenticated full-state endpoint: `http://{host}:{port}/api/{key}`.
    pub fn state_url(&self) -> Result<Url, BridgeError> {
        let key = self.api_key.as_ref().ok_or_else(|| BridgeError::Config {
            message: "no API key configured".into(),
        })?;
        parse_url(&format!(
            "http://{}:{}/api/{}",
            self.host,
            self.http_port,
            key.expose_secret()
        ))
    }
}

fn parse_url(raw: &str) -> Result<Url, BridgeError> {
    raw.parse().map_err(|e: url::ParseError| BridgeError::Config {
        message: format!("invalid gateway address {raw:?}: {e}"),
    })
}
