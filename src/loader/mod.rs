//! Infinite loader: lazy pagination with coalesced refresh.
//!
//! Wraps a page command `invoke((pointer, per_step)) -> Vec<T>` and
//! accumulates its results. `next` loads the page at the current pointer;
//! calls arriving while a load is in flight are ignored, not queued.
//! `refresh` restarts the series from zero; refreshes requested mid-load
//! coalesce into a single pending slot and start as soon as the in-flight
//! load settles, success or failure.
//!
//! The series is finished only when a page comes back with fewer elements
//! than requested. A page of exactly `per_step` elements never finishes the
//! loader, even if it happens to be the last one - detecting the end then
//! costs one extra empty page.

use std::sync::Arc;

use futures::future;
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, warn};

use crate::command::Command;
use crate::executor::Invoker;
use crate::state::ExecutionSnapshot;

/// Page size used when none is given.
pub const DEFAULT_PER_STEP: usize = 20;

/// Outcome of a [`InfiniteLoader::next`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextOutcome {
    /// A page was loaded and appended; carries the number of new elements.
    Loaded(usize),
    /// A load was already in flight; this request was dropped.
    Ignored,
    /// The short page has been seen; there is nothing left to load.
    Finished,
}

/// Outcome of a [`InfiniteLoader::refresh`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The series was reloaded from zero; carries the first page's size.
    Refreshed(usize),
    /// A load was in flight; the refresh was coalesced into the pending
    /// slot and will start once the current load settles.
    Queued,
}

/// Point-in-time view of the loader's pagination state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderSnapshot {
    /// Elements loaded so far.
    pub len: usize,
    /// Next read offset.
    pub pointer: usize,
    /// The short page has been seen.
    pub is_finished: bool,
    /// A load is in flight.
    pub is_running: bool,
    /// A refresh-tagged load is in flight or queued.
    pub is_refreshing: bool,
}

struct LoaderState<T> {
    items: Vec<T>,
    pointer: usize,
    finished: bool,
    running: bool,
    refreshing: bool,
    refresh_queued: bool,
}

/// Lazily accumulates a paginated result list.
///
/// Owns its items exclusively; callers observe them through [`items`] and
/// [`snapshot`]. Must be used from within a Tokio runtime.
///
/// [`items`]: InfiniteLoader::items
/// [`snapshot`]: InfiniteLoader::snapshot
pub struct InfiniteLoader<T, C>
where
    T: Send + 'static,
    C: Command<Params = (usize, usize), Ok = Vec<T>>,
{
    invoker: Invoker<C>,
    per_step: usize,
    state: Arc<Mutex<LoaderState<T>>>,
}

impl<T, C> InfiniteLoader<T, C>
where
    T: Send + 'static,
    C: Command<Params = (usize, usize), Ok = Vec<T>>,
{
    /// Create a loader with the default page size.
    pub fn new(command: C) -> Self {
        Self::with_per_step(command, DEFAULT_PER_STEP)
    }

    /// Create a loader requesting `per_step` elements per page.
    ///
    /// A page size of zero could never make progress, so it is clamped to 1.
    pub fn with_per_step(command: C, per_step: usize) -> Self {
        Self {
            invoker: Invoker::new(command),
            per_step: per_step.max(1),
            state: Arc::new(Mutex::new(LoaderState {
                items: Vec::new(),
                pointer: 0,
                finished: false,
                running: false,
                refreshing: false,
                refresh_queued: false,
            })),
        }
    }

    /// Load the next page and append it.
    ///
    /// Ignored while a load is in flight (call again later to progress) and
    /// once the series is finished. On success the pointer advances by the
    /// returned element count; a count below `per_step` finishes the series.
    #[tracing::instrument(name = "loader.next", skip_all)]
    pub async fn next(&self) -> Result<NextOutcome, C::Err> {
        let pointer = {
            let mut state = self.state.lock().await;
            if state.running {
                return Ok(NextOutcome::Ignored);
            }
            if state.finished {
                return Ok(NextOutcome::Finished);
            }
            state.running = true;
            state.pointer
        };

        let rx = self.drive(pointer, false);
        match rx.await {
            Ok(Ok(count)) => Ok(NextOutcome::Loaded(count)),
            Ok(Err(error)) => Err(error),
            Err(_) => future::pending().await,
        }
    }

    /// Restart the series from zero.
    ///
    /// If idle: clears the items, resets the pointer, and loads page zero,
    /// overwriting the list with the result. If a load is in flight: records
    /// a pending refresh (at most one, last-write-wins) that starts as soon
    /// as the current load settles, and returns [`RefreshOutcome::Queued`]
    /// immediately.
    #[tracing::instrument(name = "loader.refresh", skip_all)]
    pub async fn refresh(&self) -> Result<RefreshOutcome, C::Err> {
        {
            let mut state = self.state.lock().await;
            if state.running {
                state.refresh_queued = true;
                state.refreshing = true;
                debug!("refresh queued behind in-flight load");
                return Ok(RefreshOutcome::Queued);
            }
            state.running = true;
            state.refreshing = true;
            state.items.clear();
            state.pointer = 0;
            state.finished = false;
        }

        let rx = self.drive(0, true);
        match rx.await {
            Ok(Ok(count)) => Ok(RefreshOutcome::Refreshed(count)),
            Ok(Err(error)) => Err(error),
            Err(_) => future::pending().await,
        }
    }

    /// A copy of the elements loaded so far, in order.
    pub async fn items(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.state.lock().await.items.clone()
    }

    /// Point-in-time view of the pagination state.
    pub async fn snapshot(&self) -> LoaderSnapshot {
        let state = self.state.lock().await;
        LoaderSnapshot {
            len: state.items.len(),
            pointer: state.pointer,
            is_finished: state.finished,
            is_running: state.running,
            is_refreshing: state.refreshing,
        }
    }

    pub async fn is_finished(&self) -> bool {
        self.state.lock().await.finished
    }

    pub async fn is_running(&self) -> bool {
        self.state.lock().await.running
    }

    pub async fn is_refreshing(&self) -> bool {
        self.state.lock().await.refreshing
    }

    /// The configured page size.
    pub fn per_step(&self) -> usize {
        self.per_step
    }

    /// Snapshot of page-command run counters and outcome flags.
    pub fn state(&self) -> ExecutionSnapshot {
        self.invoker.snapshot()
    }

    /// Spawn the driver task: load one page, apply it, then keep going while
    /// refreshes are queued. The load runs to completion even if the caller
    /// drops its future.
    fn drive(&self, pointer: usize, refreshing: bool) -> oneshot::Receiver<Result<usize, C::Err>> {
        let (tx, rx) = oneshot::channel();
        let invoker = self.invoker.clone();
        let state = Arc::clone(&self.state);
        let per_step = self.per_step;

        tokio::spawn(async move {
            let mut pointer = pointer;
            let mut refreshing = refreshing;
            let mut settle = Some(tx);
            loop {
                let result = invoker.invoke((pointer, per_step)).await;

                let mut guard = state.lock().await;
                let outcome = match result {
                    Ok(page) => {
                        let count = page.len();
                        guard.finished = count < per_step;
                        if refreshing {
                            guard.items = page;
                            guard.pointer = count;
                        } else {
                            guard.items.extend(page);
                            guard.pointer += count;
                        }
                        debug!(count, pointer = guard.pointer, refreshing, "page loaded");
                        Ok(count)
                    }
                    Err(error) => Err(error),
                };

                match settle.take() {
                    Some(tx) => {
                        let _ = tx.send(outcome);
                    }
                    None => {
                        // A chained refresh has no caller of its own.
                        if let Err(error) = outcome {
                            warn!(?error, "queued refresh failed");
                        }
                    }
                }

                if guard.refresh_queued {
                    // Start the pending refresh right away; the slot is
                    // cleared before it begins.
                    guard.refresh_queued = false;
                    guard.refreshing = true;
                    guard.items.clear();
                    guard.pointer = 0;
                    guard.finished = false;
                    pointer = 0;
                    refreshing = true;
                } else {
                    guard.running = false;
                    guard.refreshing = false;
                    break;
                }
            }
        });

        rx
    }
}

#[cfg(test)]
mod tests;
