use thiserror::Error;

/// Top-level error type for the `zigbridge-api` crate.
///
/// Covers the transport failure modes of both gateway surfaces: the REST
/// API and the websocket event stream. `zigbridge-core` maps these into
/// its own classification (`BridgeError`) at the crate seam.
#[derive(Debug, Error)]
pub enum Error {
    /// Request exceeded the caller-supplied timeout.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Websocket upgrade or read failure.
    #[error("Websocket connection failed: {0}")]
    WebSocketConnect(String),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),
}

impl Error {
    /// Returns `true` if this error is a request timeout.
    ///
    /// Timeouts are treated as transient by the core: they are logged at
    /// debug level and never escalate the bridge status.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Transport(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::WebSocketConnect(_) => true,
            _ => false,
        }
    }
}
