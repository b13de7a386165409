//! Persisted configuration for the zigbridge CLI.
//!
//! TOML settings file + `ZIGBRIDGE_*` environment overrides, translation
//! to `zigbridge_core::BridgeConfig`, and the file-backed [`FileStore`]
//! the core writes pairing results and gateway metadata through.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use zigbridge_core::{BridgeConfig, BridgeError, ConfigSink, GatewayProperties, PropertySink};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to serialize settings: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("settings loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<ConfigError> for BridgeError {
    fn from(err: ConfigError) -> Self {
        BridgeError::Config {
            message: err.to_string(),
        }
    }
}

// ── TOML settings ───────────────────────────────────────────────────

/// On-disk settings, one gateway per file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// Gateway host name or IP, without a port.
    pub host: String,

    /// REST API port.
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Websocket port override; zero uses the port the gateway reports.
    #[serde(default)]
    pub websocket_port: u16,

    /// API key issued by the gateway. Written back by the pairing flow.
    pub api_key: Option<String>,

    /// Per-request HTTP timeout, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Wait between retry attempts, in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Gateway metadata recorded after state discovery. Informational
    /// only; nothing here feeds back into how the gateway is reached.
    pub gateway: Option<GatewayAnnotations>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            http_port: default_http_port(),
            websocket_port: 0,
            api_key: None,
            timeout_secs: default_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            gateway: None,
        }
    }
}

fn default_http_port() -> u16 {
    80
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_poll_interval_secs() -> u64 {
    10
}

impl Settings {
    /// Translate to the core's runtime configuration.
    pub fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            host: self.host.clone(),
            http_port: self.http_port,
            websocket_port: self.websocket_port,
            api_key: self.api_key.clone().map(SecretString::from),
            timeout: Duration::from_secs(self.timeout_secs),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
        }
    }
}

/// The `[gateway]` table: metadata discovered from the full state.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GatewayAnnotations {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub software_version: String,
    #[serde(default)]
    pub firmware_version: String,
    #[serde(default)]
    pub network_uuid: String,
    #[serde(default)]
    pub radio_channel: i64,
    #[serde(default)]
    pub ip_address: String,
}

impl From<&GatewayProperties> for GatewayAnnotations {
    fn from(props: &GatewayProperties) -> Self {
        Self {
            api_version: props.api_version.clone(),
            software_version: props.software_version.clone(),
            firmware_version: props.firmware_version.clone(),
            network_uuid: props.network_uuid.clone(),
            radio_channel: props.radio_channel,
            ip_address: props.ip_address.clone(),
        }
    }
}

// ── Settings file path ──────────────────────────────────────────────

/// Resolve the settings file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "zigbridge", "zigbridge").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("zigbridge");
    p
}

// ── Loading & saving ────────────────────────────────────────────────

/// Load settings from a file + `ZIGBRIDGE_*` environment overrides.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Settings::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("ZIGBRIDGE_"));

    let settings: Settings = figment.extract()?;
    Ok(settings)
}

/// Serialize settings to TOML and write them to `path`.
///
/// The write goes through a sibling temp file and a rename, so a crash
/// mid-write never leaves a truncated settings file behind.
pub fn save_settings(path: &Path, settings: &Settings) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(settings)?;
    let tmp = path.with_extension("toml.tmp");
    std::fs::write(&tmp, toml_str)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

// ── File-backed persistence sinks ───────────────────────────────────

/// File-backed implementation of the core's persistence sinks.
///
/// Writes are load-modify-save against one settings file, serialized by
/// an internal lock so the key and annotation writers never interleave.
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store backed by the platform's canonical settings file.
    pub fn at_default_path() -> Self {
        Self::new(config_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn update(&self, apply: impl FnOnce(&mut Settings)) -> Result<(), ConfigError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut settings = load_settings(&self.path)?;
        apply(&mut settings);
        save_settings(&self.path, &settings)
    }
}

impl ConfigSink for FileStore {
    fn persist_api_key(&self, api_key: &str) -> Result<(), BridgeError> {
        debug!(path = %self.path.display(), "persisting API key");
        self.update(|settings| settings.api_key = Some(api_key.to_owned()))?;
        Ok(())
    }
}

impl PropertySink for FileStore {
    fn annotate(&self, properties: &GatewayProperties) -> Result<(), BridgeError> {
        debug!(path = %self.path.display(), "recording gateway metadata");
        self.update(|settings| settings.gateway = Some(GatewayAnnotations::from(properties)))?;
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn settings_file(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("config.toml")
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = load_settings(&settings_file(&dir)).expect("load");

        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.http_port, 80);
        assert_eq!(settings.websocket_port, 0);
        assert!(settings.api_key.is_none());
        assert_eq!(settings.timeout_secs, 10);
        assert_eq!(settings.poll_interval_secs, 10);
    }

    #[test]
    fn settings_round_trip_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = settings_file(&dir);

        let settings = Settings {
            host: "gw.local".into(),
            websocket_port: 9443,
            api_key: Some("abc123".into()),
            ..Settings::default()
        };
        save_settings(&path, &settings).expect("save");

        let loaded = load_settings(&path).expect("load");
        assert_eq!(loaded.host, "gw.local");
        assert_eq!(loaded.websocket_port, 9443);
        assert_eq!(loaded.api_key.as_deref(), Some("abc123"));
    }

    #[test]
    fn bridge_config_translation() {
        let settings = Settings {
            host: "gw.local".into(),
            http_port: 8080,
            api_key: Some("abc123".into()),
            timeout_secs: 5,
            ..Settings::default()
        };
        let config = settings.bridge_config();

        assert_eq!(config.host, "gw.local");
        assert_eq!(config.http_port, 8080);
        assert!(config.api_key.is_some());
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.poll_interval, Duration::from_secs(10));
    }

    #[test]
    fn persist_api_key_keeps_other_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = settings_file(&dir);
        save_settings(
            &path,
            &Settings {
                host: "gw.local".into(),
                websocket_port: 9443,
                ..Settings::default()
            },
        )
        .expect("save");

        let store = FileStore::new(&path);
        store.persist_api_key("fresh-key").expect("persist");

        let loaded = load_settings(&path).expect("load");
        assert_eq!(loaded.api_key.as_deref(), Some("fresh-key"));
        assert_eq!(loaded.host, "gw.local");
        assert_eq!(loaded.websocket_port, 9443);
    }

    #[test]
    fn annotate_never_touches_connection_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = settings_file(&dir);
        save_settings(
            &path,
            &Settings {
                host: "gw.local".into(),
                api_key: Some("abc123".into()),
                ..Settings::default()
            },
        )
        .expect("save");

        let store = FileStore::new(&path);
        let props = GatewayProperties {
            api_version: "1.16.0".into(),
            software_version: "2.5.75".into(),
            firmware_version: "0x26580700".into(),
            network_uuid: "net-uuid-1".into(),
            radio_channel: 15,
            ip_address: "192.168.1.80".into(),
        };
        store.annotate(&props).expect("annotate");

        let loaded = load_settings(&path).expect("load");
        let gateway = loaded.gateway.expect("gateway table");
        assert_eq!(gateway.api_version, "1.16.0");
        assert_eq!(gateway.radio_channel, 15);

        // Connection parameters stay exactly as configured.
        assert_eq!(loaded.host, "gw.local");
        assert_eq!(loaded.http_port, 80);
        assert_eq!(loaded.websocket_port, 0);
        assert_eq!(loaded.api_key.as_deref(), Some("abc123"));
    }

    #[test]
    fn annotate_overwrites_previous_metadata() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = settings_file(&dir);
        let store = FileStore::new(&path);

        let mut props = GatewayProperties {
            api_version: "1.15.0".into(),
            ..GatewayProperties::default()
        };
        store.annotate(&props).expect("annotate");
        props.api_version = "1.16.0".into();
        store.annotate(&props).expect("annotate");

        let loaded = load_settings(&path).expect("load");
        assert_eq!(loaded.gateway.expect("gateway table").api_version, "1.16.0");
    }
}
