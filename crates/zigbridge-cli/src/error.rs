//! CLI error types with miette diagnostics.
//!
//! Maps `BridgeError` variants into user-facing errors with actionable
//! help text.

use miette::Diagnostic;
use thiserror::Error;

use zigbridge_core::BridgeError;

/// Exit codes for process termination.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const UNSUPPORTED: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the gateway: {message}")]
    #[diagnostic(
        code(zigbridge::connection_failed),
        help(
            "Check that the gateway is running and accessible.\n\
             Override the target with --host / --http-port."
        )
    )]
    ConnectionFailed { message: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(zigbridge::timeout),
        help("Increase timeout with --timeout or check gateway responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Authentication ───────────────────────────────────────────────

    #[error("No API key configured")]
    #[diagnostic(
        code(zigbridge::no_api_key),
        help(
            "Pair with the gateway first: zigbridge pair\n\
             Or set the ZIGBRIDGE_API_KEY environment variable."
        )
    )]
    NoApiKey,

    #[error("The gateway did not grant an API key")]
    #[diagnostic(
        code(zigbridge::pairing_failed),
        help(
            "Unlock the gateway for third-party applications (press its\n\
             link button or enable pairing in its web UI), then run\n\
             zigbridge pair again."
        )
    )]
    PairingFailed,

    #[error("Gave up pairing after {seconds}s")]
    #[diagnostic(
        code(zigbridge::pairing_timeout),
        help("Unlock the gateway first, then retry with a longer --wait.")
    )]
    PairingTimedOut { seconds: u64 },

    // ── Gateway classification ───────────────────────────────────────

    #[error("The configured host is not a supported Zigbee gateway")]
    #[diagnostic(
        code(zigbridge::wrong_device),
        help("Check --host; the REST API answered but did not identify itself.")
    )]
    WrongDevice,

    #[error("The gateway firmware is too old for event streaming")]
    #[diagnostic(
        code(zigbridge::unsupported_firmware),
        help("Update the gateway firmware; it reports no websocket port.")
    )]
    UnsupportedFirmware,

    #[error("Gateway state is unavailable")]
    #[diagnostic(
        code(zigbridge::state_unavailable),
        help(
            "The gateway did not return its full state. The API key may\n\
             have been revoked; try pairing again."
        )
    )]
    StateUnavailable,

    // ── Protocol / configuration ─────────────────────────────────────

    #[error("Gateway protocol error: {message}")]
    #[diagnostic(code(zigbridge::protocol))]
    Protocol { message: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(zigbridge::config))]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to serialize settings: {0}")]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } | Self::PairingTimedOut { .. } => exit_code::TIMEOUT,
            Self::NoApiKey | Self::PairingFailed => exit_code::AUTH,
            Self::WrongDevice | Self::UnsupportedFirmware => exit_code::UNSUPPORTED,
            Self::Config { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

impl From<BridgeError> for CliError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::Timeout { timeout_secs } => Self::Timeout {
                seconds: timeout_secs,
            },
            BridgeError::Transport { message } => Self::ConnectionFailed { message },
            BridgeError::DeviceMismatch => Self::WrongDevice,
            BridgeError::UnsupportedFirmware => Self::UnsupportedFirmware,
            BridgeError::Protocol { message } => Self::Protocol { message },
            BridgeError::Config { message } => Self::Config { message },
        }
    }
}

impl From<zigbridge_config::ConfigError> for CliError {
    fn from(err: zigbridge_config::ConfigError) -> Self {
        Self::Config {
            message: err.to_string(),
        }
    }
}

impl From<zigbridge_api::Error> for CliError {
    fn from(err: zigbridge_api::Error) -> Self {
        match err {
            zigbridge_api::Error::Timeout { timeout_secs } => Self::Timeout {
                seconds: timeout_secs,
            },
            other => Self::ConnectionFailed {
                message: other.to_string(),
            },
        }
    }
}
