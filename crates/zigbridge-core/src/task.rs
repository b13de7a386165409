// ── Single deferred task ──
//
// All retry/backoff timing in the bridge runs through one of these:
// pairing polls, state re-fetches, stream watchdogs, and reconnect
// backoff. At most one scheduled action is alive per bridge; scheduling
// a new one aborts the previous one first.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

/// An owned, cancellable handle to at most one pending deferred action.
///
/// Clone-able: the orchestrator and the supervisor share the same slot,
/// so a timer started by one replaces a timer started by the other.
#[derive(Clone, Default)]
pub struct DeferredTask {
    handle: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl DeferredTask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` after `delay`, replacing (and aborting) any
    /// previously scheduled action.
    ///
    /// Abort is best-effort: an action that has already started running
    /// is not interrupted at synchronous points, so bodies must re-check
    /// their enabling conditions.
    pub fn schedule<F>(&self, delay: Duration, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action.await;
        });
        let previous = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Cancel the pending action, if any.
    pub fn cancel(&self) {
        let previous = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(previous) = previous {
            previous.abort();
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
