//! Single-flight coordination of token refreshes.
//!
//! # Design
//! The coordinator holds at most one in-flight refresh as a
//! `futures::future::Shared` future. The occupied slot *is* the lock: a
//! caller that finds it occupied clones the future and awaits the same
//! outcome instead of starting another refresh. The set of callers awaiting
//! the clone plays the role of the pending-request queue; they all observe
//! the same token or the same failure.
//!
//! The slot is emptied by the refresh future itself, after its body has run
//! and before waiters are woken. Each in-flight refresh carries a
//! generation id so a completed refresh never clears a newer one.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::error::RefreshFailure;

/// New access token, or the failure every waiter receives.
pub type RefreshOutcome = Result<String, RefreshFailure>;

/// Cloneable handle on an in-flight refresh.
pub type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Whether `join_or_start` launched a new refresh or attached to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flight {
    Started,
    Joined,
}

struct InFlight {
    generation: u64,
    future: SharedRefresh,
}

/// Per-client refresh lock. Create one per `ApiClient`; never share it
/// between clients that talk to different sessions.
#[derive(Default)]
pub struct RefreshCoordinator {
    slot: Mutex<Option<InFlight>>,
    generation: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_refreshing(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Number of refreshes started over the coordinator's lifetime.
    pub fn started(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Attach to the in-flight refresh, or start one with `start`.
    ///
    /// `start` is only invoked when the slot is empty, under the slot lock,
    /// and must return a lazy future; it is not polled until a caller awaits
    /// the returned handle.
    pub fn join_or_start<F, Fut>(self: &Arc<Self>, start: F) -> (SharedRefresh, Flight)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RefreshOutcome> + Send + 'static,
    {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(in_flight) = slot.as_ref() {
            return (in_flight.future.clone(), Flight::Joined);
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let body = start();
        let coordinator = Arc::clone(self);
        let future = async move {
            let outcome = body.await;
            coordinator.finish(generation);
            outcome
        }
        .boxed()
        .shared();

        *slot = Some(InFlight {
            generation,
            future: future.clone(),
        });
        (future, Flight::Started)
    }

    fn finish(&self, generation: u64) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot
            .as_ref()
            .is_some_and(|in_flight| in_flight.generation == generation)
        {
            *slot = None;
        }
    }
}
