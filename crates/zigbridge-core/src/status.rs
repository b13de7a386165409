// ── Bridge status reporting ──
//
// The bridge never throws across its public boundary; everything
// user-visible flows through this watch channel.

use std::fmt;

use tokio::sync::watch;

/// Coarse bridge state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Online,
    Offline,
}

/// Why the bridge is in its current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusDetail {
    None,
    /// Pairing in progress: waiting for operator approval or for the
    /// first full state after a key was issued.
    ConfigurationPending,
    /// The gateway could not be reached or answered unexpectedly.
    CommunicationError,
    /// Wrong device: the host answers the REST API but is not the
    /// supported gateway software.
    ConfigurationError,
    /// Gateway firmware too old to offer a websocket event stream.
    FirmwareUnsupported,
}

/// One status report: state, detail, and an optional human message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeStatus {
    pub state: BridgeState,
    pub detail: StatusDetail,
    pub message: Option<String>,
}

impl BridgeStatus {
    pub fn online() -> Self {
        Self {
            state: BridgeState::Online,
            detail: StatusDetail::None,
            message: None,
        }
    }

    pub fn offline(detail: StatusDetail, message: impl Into<String>) -> Self {
        Self {
            state: BridgeState::Offline,
            detail,
            message: Some(message.into()),
        }
    }
}

impl Default for BridgeStatus {
    fn default() -> Self {
        Self {
            state: BridgeState::Offline,
            detail: StatusDetail::None,
            message: None,
        }
    }
}

impl fmt::Display for BridgeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state {
            BridgeState::Online => write!(f, "online")?,
            BridgeState::Offline => write!(f, "offline")?,
        }
        match self.detail {
            StatusDetail::None => {}
            StatusDetail::ConfigurationPending => write!(f, " (configuration pending)")?,
            StatusDetail::CommunicationError => write!(f, " (communication error)")?,
            StatusDetail::ConfigurationError => write!(f, " (configuration error)")?,
            StatusDetail::FirmwareUnsupported => write!(f, " (firmware unsupported)")?,
        }
        if let Some(ref message) = self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

/// Clone-able sender half of the status channel.
///
/// Shared by the orchestrator and the supervisor; observers subscribe
/// through [`Bridge::status`](crate::Bridge::status).
#[derive(Clone)]
pub(crate) struct StatusReporter {
    tx: watch::Sender<BridgeStatus>,
}

impl StatusReporter {
    pub(crate) fn new() -> Self {
        let (tx, _) = watch::channel(BridgeStatus::default());
        Self { tx }
    }

    pub(crate) fn report(&self, status: BridgeStatus) {
        tracing::debug!(status = %status, "bridge status");
        // send_replace stores the value even with no subscriber, so an
        // observer that attaches later still sees the latest report.
        self.tx.send_replace(status);
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<BridgeStatus> {
        self.tx.subscribe()
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn late_subscriber_sees_the_latest_report() {
        let reporter = StatusReporter::new();

        // Reported before anyone subscribes; must not be lost.
        reporter.report(BridgeStatus::offline(
            StatusDetail::ConfigurationPending,
            "Requesting API key",
        ));

        let rx = reporter.subscribe();
        let status = rx.borrow().clone();
        assert_eq!(status.state, BridgeState::Offline);
        assert_eq!(status.detail, StatusDetail::ConfigurationPending);
    }

    #[test]
    fn display_includes_detail_and_message() {
        let status = BridgeStatus::offline(StatusDetail::CommunicationError, "boom");
        assert_eq!(status.to_string(), "offline (communication error): boom");
        assert_eq!(BridgeStatus::online().to_string(), "online");
    }
}
