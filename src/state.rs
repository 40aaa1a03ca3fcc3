//! Execution bookkeeping shared by every executor.
//!
//! One [`ExecutionState`] is owned by one invoker; counters are lock-free
//! atomics so callers can poll a snapshot without side effects.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// Live counters for one command's invocation history.
#[derive(Debug, Default)]
pub(crate) struct ExecutionState {
    /// In-flight invocations right now. Overlapping runs are allowed, so
    /// this is a count, not a flag.
    running: AtomicUsize,
    /// Total invocations started, ever.
    run_count: AtomicU64,
    /// Latched true on the first start.
    was_run: AtomicBool,
    /// Latched true on the first success.
    was_run_fine: AtomicBool,
    /// Latched true on the first failure.
    was_run_bad: AtomicBool,
    /// Outcome of the most recent settlement.
    was_last_run_fine: AtomicBool,
}

impl ExecutionState {
    /// Record an invocation start.
    ///
    /// Called eagerly at request time, so `running` is observable before the
    /// command's future is first polled.
    pub(crate) fn on_start(&self) {
        self.running.fetch_add(1, Ordering::Relaxed);
        self.run_count.fetch_add(1, Ordering::Relaxed);
        self.was_run.store(true, Ordering::Relaxed);
    }

    /// Record a settlement. Runs exactly once per started invocation,
    /// success or failure.
    pub(crate) fn on_settle(&self, fine: bool) {
        self.running.fetch_sub(1, Ordering::Relaxed);
        if fine {
            self.was_run_fine.store(true, Ordering::Relaxed);
        } else {
            self.was_run_bad.store(true, Ordering::Relaxed);
        }
        self.was_last_run_fine.store(fine, Ordering::Relaxed);
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed) > 0
    }

    /// Get a point-in-time snapshot of all counters.
    pub(crate) fn snapshot(&self) -> ExecutionSnapshot {
        ExecutionSnapshot {
            running: self.running.load(Ordering::Relaxed),
            run_count: self.run_count.load(Ordering::Relaxed),
            was_run: self.was_run.load(Ordering::Relaxed),
            was_run_fine: self.was_run_fine.load(Ordering::Relaxed),
            was_run_bad: self.was_run_bad.load(Ordering::Relaxed),
            was_last_run_fine: self.was_last_run_fine.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of an executor's invocation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionSnapshot {
    /// Invocations in flight when the snapshot was taken.
    pub running: usize,
    /// Total invocations started, ever.
    pub run_count: u64,
    /// At least one invocation was started.
    pub was_run: bool,
    /// At least one invocation succeeded.
    pub was_run_fine: bool,
    /// At least one invocation failed.
    pub was_run_bad: bool,
    /// The most recent settlement was a success.
    pub was_last_run_fine: bool,
}
