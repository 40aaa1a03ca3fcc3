//! Repeating executor: fire on a fixed interval.
//!
//! Between `start` and `stop` the command is invoked once per interval, the
//! first time one full interval after `start` (never immediately). Each
//! firing gets its own in-flight slot, so a slow run never blocks the next
//! scheduled one. `stop` releases the interval task deterministically;
//! invocations already started still run to completion.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, warn};

use crate::command::Command;
use crate::executor::Invoker;
use crate::state::ExecutionSnapshot;

/// Executor driving the command on a fixed timer.
///
/// Must be used from within a Tokio runtime.
pub struct RepeatExecutor<C: Command> {
    invoker: Invoker<C>,
    every: Duration,
    /// The interval-loop task while started; `None` is the stopped state.
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<C: Command> RepeatExecutor<C> {
    pub fn new(command: C, every: Duration) -> Self {
        Self {
            invoker: Invoker::new(command),
            every,
            task: Mutex::new(None),
        }
    }

    /// Schedule recurring invocations with these parameters.
    ///
    /// No-op if already started; there is never a second timer. Each firing
    /// clones the parameters; failures are recorded in the execution state
    /// and logged.
    pub async fn start(&self, params: C::Params)
    where
        C::Params: Clone,
    {
        let mut task = self.task.lock().await;
        if task.is_some() {
            debug!("repeat executor already started");
            return;
        }

        let invoker = self.invoker.clone();
        let every = self.every;
        let handle = tokio::spawn(async move {
            // First firing one full interval from now, not immediately.
            let mut ticker = time::interval_at(Instant::now() + every, every);
            loop {
                ticker.tick().await;
                let invocation = invoker.invoke(params.clone());
                tokio::spawn(async move {
                    if let Err(error) = invocation.await {
                        warn!(?error, "scheduled command failed");
                    }
                });
            }
        });

        *task = Some(handle);
        debug!(every = ?self.every, "repeat executor started");
    }

    /// Cancel the schedule. No-op if not started.
    ///
    /// Releases the interval task; invocations already in flight are not
    /// aborted.
    pub async fn stop(&self) {
        let mut task = self.task.lock().await;
        if let Some(handle) = task.take() {
            handle.abort();
            debug!("repeat executor stopped");
        }
    }

    /// True between `start` and `stop`.
    pub async fn is_started(&self) -> bool {
        self.task.lock().await.is_some()
    }

    /// The configured firing interval.
    pub fn every(&self) -> Duration {
        self.every
    }

    /// Snapshot of run counters and outcome flags.
    pub fn state(&self) -> ExecutionSnapshot {
        self.invoker.snapshot()
    }

    /// True while at least one fired invocation is in flight.
    pub fn is_running(&self) -> bool {
        self.invoker.is_running()
    }
}

#[cfg(test)]
mod tests;
