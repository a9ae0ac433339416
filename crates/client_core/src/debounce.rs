//! Trailing-edge debounce for user triggers.

use std::{
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::task::JoinHandle;
use tracing::debug;

pub const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_millis(400);

struct PendingTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct GateState {
    generation: u64,
    pending: Option<PendingTimer>,
}

/// Coalesces bursts of `schedule` calls into one delayed invocation of the
/// most recently scheduled action.
///
/// The gate only manages its timer. Callers that must not run concurrently
/// guard the action body themselves (see [`crate::single_flight`]).
#[derive(Clone)]
pub struct DebounceGate {
    delay: Duration,
    state: Arc<Mutex<GateState>>,
}

impl Default for DebounceGate {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_DELAY)
    }
}

impl DebounceGate {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: Arc::new(Mutex::new(GateState::default())),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_pending(&self) -> bool {
        lock(&self.state).pending.is_some()
    }

    /// Arms the timer with `action`, replacing any timer that has not fired
    /// yet. An action that has already started running is left alone.
    pub fn schedule<F, Fut>(&self, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut state = lock(&self.state);
        if let Some(previous) = state.pending.take() {
            previous.handle.abort();
            debug!("debounce timer restarted");
        }

        state.generation += 1;
        let generation = state.generation;
        let delay = self.delay;
        let shared = Arc::clone(&self.state);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut state = lock(&shared);
                match &state.pending {
                    Some(timer) if timer.generation == generation => state.pending = None,
                    // Superseded between the wake-up and taking the lock.
                    _ => return,
                }
            }
            action().await;
        });
        state.pending = Some(PendingTimer { generation, handle });
    }

    /// Disarms the timer without running its action.
    pub fn cancel(&self) {
        if let Some(timer) = lock(&self.state).pending.take() {
            timer.handle.abort();
            debug!("debounce timer cancelled");
        }
    }
}

fn lock(state: &Mutex<GateState>) -> MutexGuard<'_, GateState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "tests/debounce_tests.rs"]
mod tests;
