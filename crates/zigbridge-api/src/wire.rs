//! Wire types for the gateway REST API.
//!
//! Only the fields the bridge lifecycle needs are typed; everything else
//! is captured through `#[serde(flatten)]` or opaque JSON so nothing the
//! gateway sends is silently dropped. Per-device sensor payloads are not
//! interpreted here.

use std::collections::HashMap;

use serde::Deserialize;

// ── API key registration ─────────────────────────────────────────────

/// One element of the registration response array:
/// `[{ "success": { "username": "<api key>" } }]`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeyGrant {
    pub success: ApiKeySuccess,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeySuccess {
    /// The issued API key. The gateway calls this field `username`.
    pub username: String,
}

// ── Full state ───────────────────────────────────────────────────────

/// The gateway's own configuration block inside the full state.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayConfig {
    /// Gateway name. Empty on differently-branded gateways that share
    /// the same REST surface but are not the supported software.
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub apiversion: String,

    #[serde(default)]
    pub swversion: String,

    #[serde(default)]
    pub fwversion: String,

    /// Zigbee network UUID.
    #[serde(default)]
    pub uuid: String,

    #[serde(default)]
    pub zigbeechannel: i64,

    #[serde(default)]
    pub ipaddress: String,

    /// Websocket port for the event stream. Zero on firmware too old to
    /// offer a websocket at all.
    #[serde(default)]
    pub websocketport: u16,
}

/// One device entry (light, sensor, or group) from the full state.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceEntry {
    #[serde(default)]
    pub name: String,

    #[serde(default, rename = "type")]
    pub kind: Option<String>,

    #[serde(default)]
    pub modelid: Option<String>,

    /// All remaining fields the gateway sends.
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

/// The gateway's complete reported state: configuration plus the known
/// device inventory. Produced by one fetch and never merged field-wise.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FullState {
    #[serde(default)]
    pub config: GatewayConfig,

    #[serde(default)]
    pub lights: HashMap<String, DeviceEntry>,

    #[serde(default)]
    pub sensors: HashMap<String, DeviceEntry>,

    #[serde(default)]
    pub groups: HashMap<String, DeviceEntry>,
}

// ── Tests ────────────────────────────────────────────────────────────
