// ── Stream connection supervisor ──
//
// Owns the ConnectionState machine and keeps the websocket event stream
// alive: it starts the transport once the port is known and reacts to
// establish/loss/error callbacks by updating status and rescheduling
// retries through the bridge's single deferred-task slot.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, warn};

use zigbridge_api::{StreamListener, StreamTransport};

use crate::status::{BridgeStatus, StatusDetail, StatusReporter};
use crate::task::DeferredTask;

/// Connection state of the event stream, owned by the supervisor and
/// observable read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error(String),
}

/// Supervises the streaming connection for the lifetime of the bridge.
///
/// Cheaply cloneable; registered with the transport as its listener.
#[derive(Clone)]
pub struct Supervisor {
    inner: Arc<SupervisorInner>,
}

struct SupervisorInner {
    host: String,
    poll_interval: Duration,
    transport: Arc<dyn StreamTransport>,
    status: StatusReporter,
    state: watch::Sender<ConnectionState>,
    /// Effective websocket port; zero until discovery completes.
    websocket_port: AtomicU16,
    /// Cleared on dispose; checked before every (re)connect attempt.
    reconnect_enabled: AtomicBool,
    timer: DeferredTask,
}

impl Supervisor {
    pub(crate) fn new(
        host: String,
        poll_interval: Duration,
        transport: Arc<dyn StreamTransport>,
        status: StatusReporter,
        timer: DeferredTask,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(SupervisorInner {
                host,
                poll_interval,
                transport,
                status,
                state,
                websocket_port: AtomicU16::new(0),
                reconnect_enabled: AtomicBool::new(false),
                timer,
            }),
        }
    }

    /// Subscribe to connection state changes.
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    pub(crate) fn set_websocket_port(&self, port: u16) {
        self.inner.websocket_port.store(port, Ordering::SeqCst);
    }

    pub(crate) fn enable_reconnect(&self) {
        self.inner.reconnect_enabled.store(true, Ordering::SeqCst);
    }

    /// Start the streaming connection.
    ///
    /// No-op while already connected, while the port is still unknown,
    /// or after dispose. Otherwise arms a watchdog retry of itself (for
    /// the case where the transport never calls back) and starts the
    /// transport.
    pub fn start_stream(&self) {
        let inner = &self.inner;
        if inner.transport.is_connected()
            || inner.websocket_port.load(Ordering::SeqCst) == 0
            || !inner.reconnect_enabled.load(Ordering::SeqCst)
        {
            return;
        }

        inner.state.send_replace(ConnectionState::Connecting);

        let watchdog = self.clone();
        inner.timer.schedule(inner.poll_interval, async move {
            watchdog.start_stream();
        });

        let address = format!(
            "{}:{}",
            inner.host,
            inner.websocket_port.load(Ordering::SeqCst)
        );
        debug!(address = %address, "starting event stream");
        inner.transport.start(&address);
    }

    /// Tear down the stream and prevent any further reconnect.
    ///
    /// Idempotent: the reconnect flag is cleared first, so a retry body
    /// that is already running finds `start_stream` a no-op.
    pub fn dispose(&self) {
        self.inner.reconnect_enabled.store(false, Ordering::SeqCst);
        self.inner.timer.cancel();
        self.inner.transport.close();
        self.inner.state.send_replace(ConnectionState::Disconnected);
    }
}

impl StreamListener for Supervisor {
    fn connection_established(&self) {
        self.inner.timer.cancel();
        self.inner.state.send_replace(ConnectionState::Connected);
        self.inner.status.report(BridgeStatus::online());
    }

    fn connection_lost(&self, reason: &str) {
        warn!(reason = %reason, "event stream lost");
        self.inner.state.send_replace(ConnectionState::Disconnected);
        self.inner
            .status
            .report(BridgeStatus::offline(StatusDetail::CommunicationError, reason));
        // Retry immediately; the watchdog inside start_stream provides
        // the backoff for the next attempt if this one stalls.
        self.start_stream();
    }

    fn connection_error(&self, error: &str) {
        warn!(error = %error, "event stream error");
        self.inner
            .state
            .send_replace(ConnectionState::Error(error.to_owned()));
        self.inner
            .status
            .report(BridgeStatus::offline(StatusDetail::CommunicationError, error));
        self.inner.timer.cancel();
        // Hard errors wait a full poll interval before the next attempt.
        let retry = self.clone();
        self.inner
            .timer
            .schedule(self.inner.poll_interval, async move {
                retry.start_stream();
            });
    }
}

// ── Tests ────────────────────────────────────────────────────────────
