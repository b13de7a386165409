// ── Core error types ──
//
// Consumer-facing errors. Transport-level failures from `zigbridge-api`
// are translated here at the crate seam; consumers never see raw
// reqwest errors.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Unexpected HTTP status or malformed/empty payload. Generally
    /// terminal for the current attempt rather than retried.
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// Gateway unreachable or transport-level failure.
    #[error("Gateway communication failed: {message}")]
    Transport { message: String },

    /// Request timed out. Transient; never escalates the bridge status.
    #[error("Gateway request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// The host answers the REST API but reports no gateway name --
    /// a differently-branded device, not the supported software.
    #[error("Connected to a different gateway brand, not a supported Zigbee gateway")]
    DeviceMismatch,

    /// Gateway firmware too old: no websocket event stream.
    #[error("Gateway firmware too old: no websocket support")]
    UnsupportedFirmware,

    /// Invalid configuration or a configuration-store failure.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl From<zigbridge_api::Error> for BridgeError {
    fn from(err: zigbridge_api::Error) -> Self {
        match err {
            zigbridge_api::Error::Timeout { timeout_secs } => Self::Timeout { timeout_secs },
            other => Self::Transport {
                message: other.to_string(),
            },
        }
    }
}

impl BridgeError {
    /// Returns `true` for transient failures that a later poll cycle can
    /// recover from without operator intervention.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Transport { .. })
    }
}
