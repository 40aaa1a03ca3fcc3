//! Debouncing executor: fire once the burst goes quiet.
//!
//! Every `run` re-arms the delay timer with the new parameters; the command
//! executes exactly once per burst, with the last call's parameters, after
//! the configured delay has elapsed measured from the last call. The last
//! caller of the burst gets the fired invocation's result back; a caller
//! whose waiting request was superseded by a later one is never notified,
//! and its returned future never settles, just like the ladder's queue slot.
//!
//! Known edge case, inherited from the overlap-tolerant base behavior: a
//! `run` arriving while the command is already *executing* (not waiting)
//! arms a fresh timer, so a second overlapping execution may start once its
//! own delay elapses. There is no ladder-style queueing here.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future;
use tokio::sync::oneshot;
use tokio::time;
use tracing::{debug, warn};

use crate::command::Command;
use crate::executor::Invoker;
use crate::state::ExecutionSnapshot;

/// Executor delaying execution until a quiet period elapses.
///
/// Must be used from within a Tokio runtime.
pub struct DebounceExecutor<C: Command> {
    invoker: Invoker<C>,
    delay: Duration,
    /// Bumped on every `run`; a timer task only fires if its generation is
    /// still current when it wakes. Superseded timers expire inert, so an
    /// in-flight command is never aborted.
    generation: Arc<AtomicU64>,
    waiting: Arc<AtomicBool>,
}

impl<C: Command> DebounceExecutor<C> {
    pub fn new(command: C, delay: Duration) -> Self {
        Self {
            invoker: Invoker::new(command),
            delay,
            generation: Arc::new(AtomicU64::new(0)),
            waiting: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Arm or re-arm the delay timer with these parameters.
    ///
    /// Last call wins: parameters of an earlier waiting request are
    /// discarded. The returned future settles with the fired invocation's
    /// result if this call is still the latest when the timer elapses; a
    /// superseded caller's future never settles.
    pub async fn run(&self, params: C::Params) -> Result<C::Ok, C::Err> {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        self.waiting.store(true, Ordering::Relaxed);
        debug!(generation, "debounce timer armed");

        let invoker = self.invoker.clone();
        let delay = self.delay;
        let current = Arc::clone(&self.generation);
        let waiting = Arc::clone(&self.waiting);
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            time::sleep(delay).await;
            if current.load(Ordering::Relaxed) != generation {
                // A newer run re-armed the timer while we slept; dropping
                // the sender leaves the superseded caller unsettled.
                return;
            }
            waiting.store(false, Ordering::Relaxed);
            let result = invoker.invoke(params).await;
            if let Err(result) = tx.send(result) {
                // No caller left to report to.
                if let Err(error) = result {
                    warn!(?error, "debounced command failed");
                }
            }
        });

        match rx.await {
            Ok(result) => result,
            // Superseded while waiting: never notified. See module docs.
            Err(_) => future::pending::<Result<C::Ok, C::Err>>().await,
        }
    }

    /// True while the timer is armed and the command has not started.
    pub fn is_waiting(&self) -> bool {
        self.waiting.load(Ordering::Relaxed)
    }

    /// True while the command itself is executing.
    pub fn is_running(&self) -> bool {
        self.invoker.is_running()
    }

    /// True from arming through the end of execution.
    pub fn is_active(&self) -> bool {
        self.is_waiting() || self.is_running()
    }

    /// The configured quiet period.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Snapshot of run counters and outcome flags.
    pub fn state(&self) -> ExecutionSnapshot {
        self.invoker.snapshot()
    }
}
