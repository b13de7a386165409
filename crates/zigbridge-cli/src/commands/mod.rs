//! Command handlers and the shared gateway session wiring.

pub mod config_cmd;
pub mod devices;
pub mod pair;
pub mod state;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use zigbridge_api::{HttpClient, TransportConfig, WsConnection};
use zigbridge_config::{FileStore, Settings};
use zigbridge_core::Bridge;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a parsed command.
pub async fn dispatch(command: Command, global: &GlobalOpts) -> Result<(), CliError> {
    debug!(command = ?command, "dispatching command");
    match command {
        Command::Pair(args) => pair::handle(args, global).await,
        Command::State => state::handle(global).await,
        Command::Devices(args) => devices::handle(args, global).await,
        Command::Watch => watch::handle(global).await,
        Command::Config(args) => config_cmd::handle(&args, global),
    }
}

// ── Shared session wiring ───────────────────────────────────────────

/// A fully wired bridge: HTTP transport, websocket transport with the
/// bridge's listener registered, and the file-backed settings store.
pub struct Session {
    pub bridge: Bridge,
    pub connection: WsConnection,
}

/// The settings file path, honoring `--config`.
pub fn settings_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(zigbridge_config::config_path)
}

/// Load settings and fold in CLI flag overrides.
pub fn effective_settings(global: &GlobalOpts) -> Result<Settings, CliError> {
    let mut settings = zigbridge_config::load_settings(&settings_path(global))?;

    if let Some(ref host) = global.host {
        settings.host = host.clone();
    }
    if let Some(port) = global.http_port {
        settings.http_port = port;
    }
    if let Some(port) = global.websocket_port {
        settings.websocket_port = port;
    }
    if let Some(ref key) = global.api_key {
        settings.api_key = Some(key.clone());
    }
    if let Some(timeout) = global.timeout {
        settings.timeout_secs = timeout;
    }

    Ok(settings)
}

/// Build a bridge session from the effective settings.
pub fn connect(global: &GlobalOpts) -> Result<Session, CliError> {
    let settings = effective_settings(global)?;
    let config = settings.bridge_config();

    let http = HttpClient::new(&TransportConfig {
        timeout: config.timeout,
    })?;
    let connection = WsConnection::new();
    let store = Arc::new(FileStore::new(settings_path(global)));

    let bridge = Bridge::new(
        config,
        Arc::new(http),
        Arc::new(connection.clone()),
        Arc::clone(&store) as Arc<dyn zigbridge_core::ConfigSink>,
        store as Arc<dyn zigbridge_core::PropertySink>,
    );
    connection.register_listener(bridge.listener());

    Ok(Session { bridge, connection })
}

/// Like [`connect`], but fails up front when no API key is configured.
pub fn connect_paired(global: &GlobalOpts) -> Result<Session, CliError> {
    let settings = effective_settings(global)?;
    if settings.api_key.is_none() {
        return Err(CliError::NoApiKey);
    }
    connect(global)
}

/// Blank out the API key in a settings snapshot meant for display.
pub fn redact_api_key(settings: &mut Settings) {
    if settings.api_key.is_some() {
        settings.api_key = Some("<redacted>".into());
    }
}
