// ── Bridge lifecycle orchestrator ──
//
// Entry point for one gateway connection. Decides on initialize whether
// pairing or state discovery is needed, owns the full-state cache, and
// wires the supervisor that keeps the event stream alive.
//
// The bridge never fails across its public boundary: all failure detail
// flows through the status channel and the tracing log.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use secrecy::SecretString;
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use zigbridge_api::wire::ApiKeyGrant;
use zigbridge_api::{AsyncHttp, FullState, HttpReply, StreamListener, StreamTransport};

use crate::cache::CacheSlot;
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::status::{BridgeStatus, StatusDetail, StatusReporter};
use crate::store::{ConfigSink, GatewayProperties, PropertySink};
use crate::supervisor::{ConnectionState, Supervisor};
use crate::task::DeferredTask;

/// Freshness window for the full-state cache. Short on purpose: it
/// collapses bursts of near-simultaneous callers into one request
/// without materially staling the data.
const FULL_STATE_FRESHNESS: Duration = Duration::from_millis(1000);

/// Device type sent with the pairing request.
const DEVICE_TYPE: &str = "zigbridge";

/// Handle to one gateway bridge.
///
/// Cheaply cloneable via `Arc`; all clones share the same lifecycle.
/// Register [`listener`](Self::listener) with the stream transport
/// before calling [`initialize`](Self::initialize).
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<BridgeInner>,
}

struct BridgeInner {
    config: Mutex<BridgeConfig>,
    http: Arc<dyn AsyncHttp>,
    config_sink: Arc<dyn ConfigSink>,
    property_sink: Arc<dyn PropertySink>,
    status: StatusReporter,
    supervisor: Supervisor,
    full_state: CacheSlot<Option<Arc<FullState>>>,
    /// The single deferred-task slot, shared with the supervisor.
    timer: DeferredTask,
    poll_interval: Duration,
}

impl Bridge {
    pub fn new(
        config: BridgeConfig,
        http: Arc<dyn AsyncHttp>,
        transport: Arc<dyn StreamTransport>,
        config_sink: Arc<dyn ConfigSink>,
        property_sink: Arc<dyn PropertySink>,
    ) -> Self {
        let status = StatusReporter::new();
        let timer = DeferredTask::new();
        let supervisor = Supervisor::new(
            config.host.clone(),
            config.poll_interval,
            transport,
            status.clone(),
            timer.clone(),
        );
        let poll_interval = config.poll_interval;

        Self {
            inner: Arc::new(BridgeInner {
                config: Mutex::new(config),
                http,
                config_sink,
                property_sink,
                status,
                supervisor,
                full_state: CacheSlot::new(FULL_STATE_FRESHNESS),
                timer,
                poll_interval,
            }),
        }
    }

    /// The listener to register with the stream transport.
    pub fn listener(&self) -> Arc<dyn StreamListener> {
        Arc::new(self.inner.supervisor.clone())
    }

    /// Subscribe to status reports.
    pub fn status(&self) -> watch::Receiver<BridgeStatus> {
        self.inner.status.subscribe()
    }

    /// Subscribe to stream connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.supervisor.state()
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> BridgeConfig {
        self.lock_config().clone()
    }

    fn lock_config(&self) -> MutexGuard<'_, BridgeConfig> {
        self.inner.config.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Start the bridge: pair if no API key is configured yet, otherwise
    /// go straight to state discovery.
    pub async fn initialize(&self) {
        debug!("initializing bridge");
        let has_key = self.lock_config().api_key.is_some();
        if has_key {
            self.initialize_bridge_state().await;
        } else {
            self.request_api_key().await;
        }
    }

    /// Tear down timers and the stream connection. Idempotent; any retry
    /// already scheduled will never re-open the stream.
    pub fn dispose(&self) {
        debug!("disposing bridge");
        self.inner.supervisor.dispose();
        self.inner.timer.cancel();
    }

    // ── Authentication flow ──────────────────────────────────────────

    /// Request an API key from the gateway.
    ///
    /// Polls (every poll interval) while the operator has not pressed
    /// the gateway's link button yet; on success persists the key and
    /// immediately proceeds to state discovery.
    pub async fn request_api_key(&self) {
        self.inner.status.report(BridgeStatus::offline(
            StatusDetail::ConfigurationPending,
            "Requesting API key",
        ));
        self.inner.timer.cancel();

        let (url, timeout) = {
            let config = self.lock_config();
            (config.base_url(), config.timeout)
        };
        let url = match url {
            Ok(url) => url,
            Err(e) => {
                self.inner
                    .status
                    .report(BridgeStatus::offline(StatusDetail::CommunicationError, e.to_string()));
                return;
            }
        };

        let body = format!(r#"{{"devicetype":"{DEVICE_TYPE}"}}"#);
        let outcome = match self.inner.http.post(url, body, timeout).await {
            Ok(reply) => self.apply_api_key_reply(reply).await,
            Err(e) => Err(BridgeError::from(e)),
        };

        if let Err(e) = outcome {
            warn!(error = %e, "authorisation failed");
            self.inner
                .status
                .report(BridgeStatus::offline(StatusDetail::CommunicationError, e.to_string()));
        }
    }

    /// Handle the reply to the key-registration request.
    async fn apply_api_key_reply(&self, reply: HttpReply) -> Result<(), BridgeError> {
        match reply.status {
            // Operator has not pressed the link button yet.
            403 => {
                let poll = self.inner.poll_interval;
                self.inner.status.report(BridgeStatus::offline(
                    StatusDetail::ConfigurationPending,
                    format!(
                        "Unlock the gateway for third-party apps. Trying again in {}s",
                        poll.as_secs()
                    ),
                ));
                self.inner.timer.schedule(poll, self.pairing_retry());
                Ok(())
            }
            200 => {
                let grants: Vec<ApiKeyGrant> =
                    serde_json::from_str(&reply.body).map_err(|e| BridgeError::Protocol {
                        message: format!("malformed authorisation response: {e}"),
                    })?;
                let grant = grants.into_iter().next().ok_or_else(|| BridgeError::Protocol {
                    message: "empty authorisation response".into(),
                })?;

                let api_key = grant.success.username;
                self.inner.config_sink.persist_api_key(&api_key)?;
                self.lock_config().api_key = Some(SecretString::from(api_key));

                self.inner.status.report(BridgeStatus::offline(
                    StatusDetail::ConfigurationPending,
                    "Waiting for configuration",
                ));
                // Proceed immediately -- no poll delay.
                self.initialize_bridge_state().await;
                Ok(())
            }
            status => Err(BridgeError::Protocol {
                message: format!("unexpected status {status} for authorisation request"),
            }),
        }
    }

    // ── Full-state cache ─────────────────────────────────────────────

    /// Get the gateway's full state, served from the cache when fresh.
    ///
    /// Always resolves; failures resolve to `None` with detail reported
    /// through the status channel.
    pub async fn full_state(&self) -> Option<Arc<FullState>> {
        let bridge = self.clone();
        self.inner
            .full_state
            .get_with(move || async move { bridge.refresh_full_state().await })
            .await
    }

    /// The refresh function registered with the cache slot.
    async fn refresh_full_state(&self) -> Option<Arc<FullState>> {
        trace!("refreshing the full state cache");
        let (url, timeout) = {
            let config = self.lock_config();
            if config.api_key.is_none() {
                // Never issue a network call without a credential.
                return None;
            }
            (config.state_url(), config.timeout)
        };
        let url = match url {
            Ok(url) => url,
            Err(e) => {
                self.inner
                    .status
                    .report(BridgeStatus::offline(StatusDetail::CommunicationError, e.to_string()));
                return None;
            }
        };

        match self.inner.http.get(url, timeout).await {
            Ok(reply) => match reply.status {
                // Key rejected: "not yet available", not a hard failure.
                // The key may have been revoked mid-session; a fresh poll
                // cycle can recover.
                403 => {
                    debug!("full state request rejected (403)");
                    None
                }
                200 => match serde_json::from_str::<FullState>(&reply.body) {
                    Ok(state) => Some(Arc::new(state)),
                    Err(e) => {
                        debug!(error = %e, "full state parsing failed");
                        None
                    }
                },
                status => {
                    let message = format!("unexpected status {status} for full state request");
                    warn!("{message}");
                    self.inner
                        .status
                        .report(BridgeStatus::offline(StatusDetail::CommunicationError, message));
                    None
                }
            },
            Err(e) if e.is_timeout() => {
                debug!(error = %e, "get full state timed out");
                None
            }
            Err(e) => {
                self.inner
                    .status
                    .report(BridgeStatus::offline(StatusDetail::CommunicationError, e.to_string()));
                None
            }
        }
    }

    // ── State discovery ──────────────────────────────────────────────

    /// Fetch the full state and bring the stream up.
    ///
    /// While the state is unavailable this reschedules itself every poll
    /// interval. Wrong-device and too-old-firmware classifications are
    /// terminal: no retry is scheduled for them.
    pub async fn initialize_bridge_state(&self) {
        match self.full_state().await {
            None => {
                let poll = self.inner.poll_interval;
                debug!("full state unavailable, retrying in {}s", poll.as_secs());
                self.inner.timer.schedule(poll, self.state_retry());
            }
            Some(state) => {
                if let Err(e) = self.apply_full_state(&state) {
                    warn!(error = %e, "initial full state processing failed");
                    let detail = match e {
                        BridgeError::DeviceMismatch => StatusDetail::ConfigurationError,
                        BridgeError::UnsupportedFirmware => StatusDetail::FirmwareUnsupported,
                        _ => StatusDetail::None,
                    };
                    self.inner
                        .status
                        .report(BridgeStatus::offline(detail, e.to_string()));
                }
            }
        }
    }

    // Boxed retry futures for the deferred-task slot. Boxing keeps the
    // self-rescheduling async fns out of their own opaque types.

    fn pairing_retry(&self) -> BoxFuture<'static, ()> {
        let bridge = self.clone();
        async move { bridge.request_api_key().await }.boxed()
    }

    fn state_retry(&self) -> BoxFuture<'static, ()> {
        let bridge = self.clone();
        async move { bridge.initialize_bridge_state().await }.boxed()
    }

    fn apply_full_state(&self, state: &FullState) -> Result<(), BridgeError> {
        if state.config.name.is_empty() {
            return Err(BridgeError::DeviceMismatch);
        }
        if state.config.websocketport == 0 {
            return Err(BridgeError::UnsupportedFirmware);
        }

        let properties = GatewayProperties {
            api_version: state.config.apiversion.clone(),
            software_version: state.config.swversion.clone(),
            firmware_version: state.config.fwversion.clone(),
            network_uuid: state.config.uuid.clone(),
            radio_channel: state.config.zigbeechannel,
            ip_address: state.config.ipaddress.clone(),
        };
        // Annotation only: the sink contract guarantees this cannot
        // trigger a dispose/re-initialize cycle.
        self.inner.property_sink.annotate(&properties)?;

        // An explicit override in the config wins over the discovered port.
        let port = {
            let config = self.lock_config();
            if config.websocket_port == 0 {
                state.config.websocketport
            } else {
                config.websocket_port
            }
        };
        self.inner.supervisor.set_websocket_port(port);
        self.inner.supervisor.enable_reconnect();
        self.inner.supervisor.start_stream();
        Ok(())
    }
}
