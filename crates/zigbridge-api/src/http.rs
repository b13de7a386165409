// Async HTTP collaborator for the gateway REST API.
//
// The core crate only depends on the `AsyncHttp` trait, so tests can swap
// in scripted stubs. `HttpClient` is the reqwest-backed production
// implementation.

use std::time::Duration;

use futures::future::BoxFuture;
use futures_util::FutureExt;
use tracing::debug;
use url::Url;

use crate::error::Error;

/// A plain status-plus-body HTTP reply.
///
/// The gateway's REST API signals everything the bridge cares about
/// through the status code (200, 403, ...), so nothing richer is exposed.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

/// Asynchronous HTTP access with a caller-supplied per-request timeout.
///
/// Object-safe so the bridge can hold it as `Arc<dyn AsyncHttp>`.
pub trait AsyncHttp: Send + Sync {
    fn get(&self, url: Url, timeout: Duration) -> BoxFuture<'static, Result<HttpReply, Error>>;

    fn post(
        &self,
        url: Url,
        body: String,
        timeout: Duration,
    ) -> BoxFuture<'static, Result<HttpReply, Error>>;
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Client-wide fallback timeout. Individual requests override it.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("zigbridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

/// reqwest-backed gateway HTTP client.
pub struct HttpClient {
    http: reqwest::Client,
}

impl HttpClient {
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
        })
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_reqwest(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl AsyncHttp for HttpClient {
    fn get(&self, url: Url, timeout: Duration) -> BoxFuture<'static, Result<HttpReply, Error>> {
        debug!("GET {url}");
        let request = self.http.get(url).timeout(timeout);
        async move {
            let resp = request.send().await.map_err(|e| map_reqwest(e, timeout))?;
            let status = resp.status().as_u16();
            let body = resp.text().await.map_err(|e| map_reqwest(e, timeout))?;
            Ok(HttpReply { status, body })
        }
        .boxed()
    }

    fn post(
        &self,
        url: Url,
        body: String,
        timeout: Duration,
    ) -> BoxFuture<'static, Result<HttpReply, Error>> {
        debug!("POST {url}");
        let request = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .timeout(timeout);
        async move {
            let resp = request.send().await.map_err(|e| map_reqwest(e, timeout))?;
            let status = resp.status().as_u16();
            let body = resp.text().await.map_err(|e| map_reqwest(e, timeout))?;
            Ok(HttpReply { status, body })
        }
        .boxed()
    }
}

/// Surface reqwest timeouts as [`Error::Timeout`] so callers can tell them
/// apart from hard transport failures.
fn map_reqwest(e: reqwest::Error, timeout: Duration) -> Error {
    if e.is_timeout() {
        Error::Timeout {
            timeout_secs: timeout.as_secs(),
        }
    } else {
        Error::Transport(e)
    }
}
