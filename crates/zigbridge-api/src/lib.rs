// zigbridge-api: Async transport layer for deCONZ-compatible Zigbee gateways.

pub mod error;
pub mod http;
pub mod websocket;
pub mod wire;

pub use error::Error;
pub use http::{AsyncHttp, HttpClient, HttpReply, TransportConfig};
pub use websocket::{StreamListener, StreamTransport, WsConnection};
pub use wire::{ApiKeyGrant, DeviceEntry, FullState, GatewayConfig};
