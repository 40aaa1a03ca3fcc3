//! Ladder executor: run now, queue at most one follow-up.
//!
//! While an invocation is in flight, new `run` calls do not start anything;
//! they overwrite the single queue slot. When the in-flight invocation
//! settles - success or failure - the queued follow-up starts immediately
//! with the stored parameters, so three overlapping calls produce exactly
//! two underlying invocations.
//!
//! The queue slot is last-write-wins: a caller whose queued request was
//! overwritten by a later one is never notified, and its returned future
//! never settles. This is the accepted race of the design; callers that need
//! a guaranteed settlement should not share one ladder between competing
//! writers.

use std::sync::Arc;

use futures::future;
use tokio::sync::{oneshot, Mutex};
use tracing::debug;

use crate::command::Command;
use crate::executor::{settlement, Invoker};
use crate::state::ExecutionSnapshot;

struct QueuedRun<C: Command> {
    params: C::Params,
    settle: oneshot::Sender<Result<C::Ok, C::Err>>,
}

struct LadderSlot<C: Command> {
    running: bool,
    pending: Option<QueuedRun<C>>,
}

/// Executor collapsing overlapping calls into one run plus one follow-up.
///
/// Must be used from within a Tokio runtime.
pub struct LadderExecutor<C: Command> {
    invoker: Invoker<C>,
    slot: Arc<Mutex<LadderSlot<C>>>,
}

impl<C: Command> LadderExecutor<C> {
    pub fn new(command: C) -> Self {
        Self {
            invoker: Invoker::new(command),
            slot: Arc::new(Mutex::new(LadderSlot {
                running: false,
                pending: None,
            })),
        }
    }

    /// Run the command now, or queue this request as the single follow-up.
    ///
    /// If idle, the invocation starts immediately and its result is returned.
    /// If busy, the request lands in the queue slot, overwriting any earlier
    /// unstarted one; the returned future settles with the follow-up's
    /// result, or never, if a later request overwrites this one first.
    #[tracing::instrument(name = "ladder.run", skip_all)]
    pub async fn run(&self, params: C::Params) -> Result<C::Ok, C::Err> {
        let queued = {
            let mut slot = self.slot.lock().await;
            if slot.running {
                let (tx, rx) = oneshot::channel();
                let superseded = slot
                    .pending
                    .replace(QueuedRun { params, settle: tx })
                    .is_some();
                if superseded {
                    debug!("queued follow-up superseded by a newer request");
                }
                Ok(rx)
            } else {
                slot.running = true;
                Err(params)
            }
        };

        match queued {
            Ok(rx) => match rx.await {
                Ok(result) => result,
                // Superseded: the slot was overwritten and this caller is
                // never notified. See module docs.
                Err(_) => future::pending::<Result<C::Ok, C::Err>>().await,
            },
            Err(params) => {
                let (tx, rx) = oneshot::channel();
                self.drive(params, tx);
                settlement(rx).await
            }
        }
    }

    /// Snapshot of run counters and outcome flags.
    pub fn state(&self) -> ExecutionSnapshot {
        self.invoker.snapshot()
    }

    /// True while an invocation is in flight.
    pub fn is_running(&self) -> bool {
        self.invoker.is_running()
    }

    /// True while a follow-up request is queued behind the in-flight run.
    pub async fn has_pending(&self) -> bool {
        self.slot.lock().await.pending.is_some()
    }

    /// Spawn the driver task: run, settle the caller, then drain the queue
    /// slot until nothing is pending.
    fn drive(&self, params: C::Params, settle: oneshot::Sender<Result<C::Ok, C::Err>>) {
        let invoker = self.invoker.clone();
        let slot = Arc::clone(&self.slot);
        tokio::spawn(async move {
            let mut params = params;
            let mut settle = settle;
            loop {
                let result = invoker.invoke(params).await;
                let _ = settle.send(result);

                // A queued follow-up starts regardless of the outcome above;
                // the slot is cleared before the follow-up begins.
                let mut guard = slot.lock().await;
                match guard.pending.take() {
                    Some(next) => {
                        params = next.params;
                        settle = next.settle;
                    }
                    None => {
                        guard.running = false;
                        break;
                    }
                }
            }
        });
    }
}
