// zigbridge-core: Lifecycle management for a deCONZ-compatible gateway bridge.
//
// The `Bridge` owns the whole connection lifecycle: obtaining an API key
// through the pairing flow, caching the gateway's full state, and keeping
// the websocket event stream alive through the `Supervisor`.

pub mod bridge;
pub mod cache;
pub mod config;
pub mod error;
pub mod status;
pub mod store;
pub mod supervisor;
pub mod task;

pub use bridge::Bridge;
pub use cache::CacheSlot;
pub use config::BridgeConfig;
pub use error::BridgeError;
pub use status::{BridgeState, BridgeStatus, StatusDetail};
pub use store::{ConfigSink, GatewayProperties, PropertySink};
pub use supervisor::{ConnectionState, Supervisor};
pub use task::DeferredTask;
