use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

/// Publishes the state of an orchestrator and guards it against stale fetch cycles.
///
/// Every cycle takes a new generation when it begins.
/// The outcome of a cycle is only committed if no newer cycle began in the meantime.
#[derive(Debug)]
pub(crate) struct FetchCycle<S> {
    generation: AtomicU64,
    state: watch::Sender<S>,
}

impl<S> FetchCycle<S> {
    pub(crate) fn new(initial: S) -> Self {
        Self {
            generation: AtomicU64::new(0),
            state: watch::Sender::new(initial),
        }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<S> {
        self.state.subscribe()
    }

    pub(crate) fn snapshot(&self) -> S
    where
        S: Clone,
    {
        self.state.borrow().clone()
    }

    /// Start a new cycle, invalidating all cycles that began before.
    pub(crate) fn begin(&self, update: impl FnOnce(&mut S)) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(update);
        generation
    }

    /// Apply the outcome of the cycle `generation` if it is still the latest.
    ///
    /// Returns whether the outcome was committed.
    pub(crate) fn commit(&self, generation: u64, update: impl FnOnce(&mut S)) -> bool {
        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            update(state);
            true
        })
    }

    /// Invalidate all running cycles and replace the state.
    pub(crate) fn reset(&self, state: S) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state.send_replace(state);
    }
}
