// ── Single-slot expiring async cache ──
//
// Rust rendition of the expiring-cache the full-state fetch sits behind:
// a fresh value is served without network access, and all callers that
// arrive while a refresh is in flight share that one in-flight future.

use std::future::Future;
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::sync::Mutex;
use tokio::time::Instant;

type InFlight<T> = Shared<BoxFuture<'static, T>>;

enum SlotState<T: Clone> {
    Empty,
    /// A refresh is running; joiners attach to this shared future.
    Pending(InFlight<T>),
    Fresh(T, Instant),
}

enum Plan<T: Clone> {
    Hit(T),
    Await(InFlight<T>),
}

/// Holds at most one cached value with an expiry timestamp and at most
/// one in-flight refresh.
///
/// Invariants:
/// - a value younger than the freshness window is returned without
///   invoking `refresh`;
/// - concurrent callers during a refresh all await the same in-flight
///   operation -- exactly one refresh runs at a time;
/// - every waiter observes the refresh result exactly once, and the
///   slot never stays `Pending` after the refresh resolves.
///
/// The refresh future must always resolve (failures are expected to be
/// encoded in `T`, e.g. as `None`), so waiters are always released.
pub struct CacheSlot<T: Clone> {
    freshness: Duration,
    state: Mutex<SlotState<T>>,
}

impl<T: Clone + Send + Sync + 'static> CacheSlot<T> {
    pub fn new(freshness: Duration) -> Self {
        Self {
            freshness,
            state: Mutex::new(SlotState::Empty),
        }
    }

    /// Get the cached value, refreshing through `refresh` if it is
    /// missing or stale.
    pub async fn get_with<F, Fut>(&self, refresh: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let plan = {
            let mut slot = self.state.lock().await;
            match &*slot {
                SlotState::Fresh(value, stored_at) if stored_at.elapsed() < self.freshness => {
                    Plan::Hit(value.clone())
                }
                SlotState::Pending(inflight) => Plan::Await(inflight.clone()),
                SlotState::Empty | SlotState::Fresh(..) => {
                    let inflight = refresh().boxed().shared();
                    *slot = SlotState::Pending(inflight.clone());
                    Plan::Await(inflight)
                }
            }
        };

        match plan {
            Plan::Hit(value) => value,
            Plan::Await(inflight) => {
                let value = inflight.clone().await;
                // Any awaiter may be the first to complete -- the caller
                // that started the refresh can be dropped mid-await, so
                // whoever finishes finalizes the slot. The pointer check
                // keeps a late waiter of an old refresh from clobbering
                // a newer one.
                let mut slot = self.state.lock().await;
                if matches!(&*slot, SlotState::Pending(current) if current.ptr_eq(&inflight)) {
                    *slot = SlotState::Fresh(value.clone(), Instant::now());
                }
                value
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
