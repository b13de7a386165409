//! Websocket event stream transport.
//!
//! [`WsConnection`] maintains a single connection to the gateway's
//! websocket endpoint. It does not reconnect by itself: connect,
//! disconnect, and error outcomes are reported to the registered
//! [`StreamListener`], and the supervisor in `zigbridge-core` decides
//! when to call [`start`](StreamTransport::start) again.
//!
//! Raw text frames are additionally fanned out through a
//! [`tokio::sync::broadcast`] channel for consumers that want the live
//! event payloads; their schema is not interpreted here.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::StreamExt;
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

const FRAME_CHANNEL_CAPACITY: usize = 1024;

// ── Collaborator traits ──────────────────────────────────────────────

/// Callbacks for stream connection outcomes.
///
/// The supervisor registers itself here; there is no inheritance
/// relationship between transport and supervisor, only this reference.
pub trait StreamListener: Send + Sync {
    fn connection_established(&self);
    fn connection_lost(&self, reason: &str);
    fn connection_error(&self, error: &str);
}

/// A persistent streaming connection to the gateway.
///
/// `start` returns immediately; the outcome arrives through the
/// registered [`StreamListener`].
pub trait StreamTransport: Send + Sync {
    fn start(&self, address: &str);
    fn close(&self);
    fn is_connected(&self) -> bool;
}

// ── WsConnection ─────────────────────────────────────────────────────

/// tokio-tungstenite implementation of [`StreamTransport`].
///
/// Cheaply cloneable; all clones share the same connection.
#[derive(Clone)]
pub struct WsConnection {
    inner: Arc<WsInner>,
}

struct WsInner {
    listener: Mutex<Option<Arc<dyn StreamListener>>>,
    frame_tx: broadcast::Sender<Arc<str>>,
    connected: AtomicBool,
    /// Token for the currently running connection task, if any.
    session: Mutex<Option<CancellationToken>>,
}

impl Default for WsConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl WsConnection {
    pub fn new() -> Self {
        let (frame_tx, _) = broadcast::channel(FRAME_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(WsInner {
                listener: Mutex::new(None),
                frame_tx,
                connected: AtomicBool::new(false),
                session: Mutex::new(None),
            }),
        }
    }

    /// Register the listener that receives connection outcomes.
    ///
    /// Must be called before [`start`](StreamTransport::start); outcomes
    /// with no listener registered are dropped.
    pub fn register_listener(&self, listener: Arc<dyn StreamListener>) {
        *self.inner.listener.lock().expect("listener lock poisoned") = Some(listener);
    }

    /// Subscribe to raw text frames from the gateway.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<str>> {
        self.inner.frame_tx.subscribe()
    }

    fn replace_session(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let mut session = self.inner.session.lock().expect("session lock poisoned");
        if let Some(previous) = session.replace(token.clone()) {
            previous.cancel();
        }
        token
    }
}

impl StreamTransport for WsConnection {
    fn start(&self, address: &str) {
        let cancel = self.replace_session();
        let inner = Arc::clone(&self.inner);
        let url = format!("ws://{address}");
        tokio::spawn(async move {
            run_connection(inner, url, cancel).await;
        });
    }

    fn close(&self) {
        let session = self
            .inner
            .session
            .lock()
            .expect("session lock poisoned")
            .take();
        if let Some(token) = session {
            token.cancel();
        }
        self.inner.connected.store(false, Ordering::SeqCst);
    }

    fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }
}

impl WsInner {
    fn with_listener(&self, f: impl FnOnce(&dyn StreamListener)) {
        let listener = self
            .listener
            .lock()
            .expect("listener lock poisoned")
            .clone();
        if let Some(listener) = listener {
            f(listener.as_ref());
        }
    }
}

// ── Connection task ──────────────────────────────────────────────────

/// Establish one websocket connection and read frames until it drops,
/// the server closes it, or the session token is cancelled.
///
/// Cancellation (the `close()` path) exits silently: the bridge is being
/// disposed and must not observe a loss callback.
async fn run_connection(inner: Arc<WsInner>, url: String, cancel: CancellationToken) {
    info!(url = %url, "connecting to gateway websocket");

    let connect = tokio_tungstenite::connect_async(url.as_str());
    let ws_stream = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        result = connect => match result {
            Ok((stream, _response)) => stream,
            Err(e) => {
                inner.with_listener(|l| l.connection_error(&e.to_string()));
                return;
            }
        }
    };

    inner.connected.store(true, Ordering::SeqCst);
    inner.with_listener(|l| l.connection_established());
    info!("gateway websocket connected");

    let (_write, mut read) = ws_stream.split();

    let reason = loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                inner.connected.store(false, Ordering::SeqCst);
                return;
            }
            frame = read.next() => match frame {
                Some(Ok(tungstenite::Message::Text(text))) => {
                    let _ = inner.frame_tx.send(Arc::from(text.as_str()));
                }
                Some(Ok(tungstenite::Message::Ping(_))) => {
                    // tungstenite replies with pong automatically
                    trace!("websocket ping");
                }
                Some(Ok(tungstenite::Message::Close(frame))) => {
                    debug!(?frame, "websocket close frame received");
                    break match frame {
                        Some(cf) => format!("connection closed ({}): {}", cf.code, cf.reason),
                        None => "connection closed".to_owned(),
                    };
                }
                Some(Err(e)) => break e.to_string(),
                None => break "stream ended".to_owned(),
                _ => {
                    // Binary, Pong, Frame -- ignore
                }
            }
        }
    };

    inner.connected.store(false, Ordering::SeqCst);
    inner.with_listener(|l| l.connection_lost(&reason));
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use futures_util::SinkExt;
    use tokio::net::TcpListener;

    use super::*;

    #[derive(Default)]
    struct RecordingListener {
        established: AtomicUsize,
        lost: AtomicUsize,
        errors: AtomicUsize,
        last_reason: Mutex<Option<String>>,
    }

    impl StreamListener for RecordingListener {
        fn connection_established(&self) {
            self.established.fetch_add(1, Ordering::SeqCst);
        }

        fn connection_lost(&self, reason: &str) {
            self.lost.fetch_add(1, Ordering::SeqCst);
            *self.last_reason.lock().expect("lock") = Some(reason.to_owned());
        }

        fn connection_error(&self, error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
            *self.last_reason.lock().expect("lock") = Some(error.to_owned());
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn frames_and_close_are_reported() {
        let server = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr().unwrap();

        // Minimal one-shot server: accept, send one frame, close.
        tokio::spawn(async move {
            let (stream, _) = server.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            ws.send(tungstenite::Message::Text(r#"{"e":"changed"}"#.into()))
                .await
                .unwrap();
            ws.close(None).await.unwrap();
        });

        let listener = Arc::new(RecordingListener::default());
        let connection = WsConnection::new();
        connection.register_listener(listener.clone());
        let mut frames = connection.subscribe();

        connection.start(&addr.to_string());

        let frame = tokio::time::timeout(Duration::from_secs(5), frames.recv())
            .await
            .expect("no frame within timeout")
            .unwrap();
        assert_eq!(&*frame, r#"{"e":"changed"}"#);

        // Wait for the close to propagate into a lost callback.
        tokio::time::timeout(Duration::from_secs(5), async {
            while listener.lost.load(Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("no lost callback within timeout");

        assert_eq!(listener.established.load(Ordering::SeqCst), 1);
        assert_eq!(listener.errors.load(Ordering::SeqCst), 0);
        assert!(!connection.is_connected());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn refused_connection_reports_error() {
        // Bind and drop to get a port nothing listens on.
        let server = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr().unwrap();
        drop(server);

        let listener = Arc::new(RecordingListener::default());
        let connection = WsConnection::new();
        connection.register_listener(listener.clone());

        connection.start(&addr.to_string());

        tokio::time::timeout(Duration::from_secs(5), async {
            while listener.errors.load(Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("no error callback within timeout");

        assert_eq!(listener.established.load(Ordering::SeqCst), 0);
        assert!(!connection.is_connected());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn close_suppresses_lost_callback() {
        let server = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr().unwrap();

        tokio::spawn(async move {
            let (stream, _) = server.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            // Hold the connection open until the client goes away.
            while ws.next().await.is_some() {}
        });

        let listener = Arc::new(RecordingListener::default());
        let connection = WsConnection::new();
        connection.register_listener(listener.clone());

        connection.start(&addr.to_string());

        tokio::time::timeout(Duration::from_secs(5), async {
            while listener.established.load(Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("no established callback within timeout");

        connection.close();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(listener.lost.load(Ordering::SeqCst), 0);
        assert!(!connection.is_connected());
    }
}
