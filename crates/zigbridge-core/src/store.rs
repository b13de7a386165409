// ── Persistence collaborators ──
//
// The core never touches disk. The consumer supplies these sinks;
// `zigbridge-config` provides the file-backed implementation.

use crate::error::BridgeError;

/// Discovered gateway metadata, applied as informational properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayProperties {
    pub api_version: String,
    pub software_version: String,
    pub firmware_version: String,
    pub network_uuid: String,
    pub radio_channel: i64,
    pub ip_address: String,
}

/// Write access to the persisted bridge configuration.
pub trait ConfigSink: Send + Sync {
    /// Persist a freshly issued API key.
    ///
    /// Only ever called with a new key; the core never clears one.
    fn persist_api_key(&self, api_key: &str) -> Result<(), BridgeError>;
}

/// Write access to the gateway property set.
pub trait PropertySink: Send + Sync {
    /// Record discovered gateway metadata.
    ///
    /// This is an annotation, not a reconfiguration: implementations
    /// must guarantee the write does not feed back into connection
    /// parameters or trigger a dispose/re-initialize cycle.
    fn annotate(&self, properties: &GatewayProperties) -> Result<(), BridgeError>;
}
