//! Registry of in-flight refreshes
//!
//! At most one refresh runs per terminal. The first caller spawns it; later
//! callers clone the same shared handle and wait for the same result.

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::manager::ForecastOutcome;
use crate::error::CoreError;

pub(crate) type RefreshResult = Result<ForecastOutcome, CoreError>;

/// Handle every waiter of one refresh holds
pub(crate) type SharedRefresh = Shared<BoxFuture<'static, RefreshResult>>;

/// How a caller got its refresh handle
pub(crate) enum Attach {
    /// This caller spawned the refresh
    Started(SharedRefresh),
    /// A refresh was already running and the caller joined it
    Joined(SharedRefresh),
}

struct Slot {
    generation: u64,
    refresh: SharedRefresh,
}

#[derive(Default)]
pub(crate) struct InFlightRegistry {
    slots: Mutex<HashMap<String, Slot>>,
    next_generation: AtomicU64,
}

/// Removes the slot once the refresh task finishes, including on panic
struct SlotGuard {
    registry: Arc<InFlightRegistry>,
    key: String,
    generation: u64,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.registry.release(&self.key, self.generation);
    }
}

impl InFlightRegistry {
    /// Join the refresh running for `key`, or spawn one with `start`
    ///
    /// The refresh runs on its own task, so it completes even if every caller
    /// stops waiting for it. Must be called from within a tokio runtime.
    pub(crate) fn attach<F, Fut>(self: &Arc<Self>, key: &str, start: F) -> Attach
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RefreshResult> + Send + 'static,
    {
        let mut slots = self.slots.lock();

        if let Some(slot) = slots.get(key) {
            return Attach::Joined(slot.refresh.clone());
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let guard = SlotGuard {
            registry: Arc::clone(self),
            key: key.to_string(),
            generation,
        };
        let work = start();

        // The slot lock is held until the slot is inserted, so the guard's
        // release cannot run before the insert.
        let task = tokio::spawn(async move {
            let _guard = guard;
            work.await
        });

        let refresh = async move {
            match task.await {
                Ok(result) => result,
                Err(e) => Err(CoreError::RefreshAborted(e.to_string())),
            }
        }
        .boxed()
        .shared();

        slots.insert(
            key.to_string(),
            Slot {
                generation,
                refresh: refresh.clone(),
            },
        );

        Attach::Started(refresh)
    }

    /// Number of refreshes currently running
    pub(crate) fn len(&self) -> usize {
        self.slots.lock().len()
    }

    fn release(&self, key: &str, generation: u64) {
        let mut slots = self.slots.lock();
        if slots.get(key).is_some_and(|s| s.generation == generation) {
            slots.remove(key);
        }
    }
}
