//! Base executor: invoke and track, no gating.
//!
//! [`Executor`] is the uncontrolled baseline every other policy specializes:
//! each `run` starts its own invocation immediately, overlapping runs are
//! allowed, and the caller gets the command's own result back unchanged.
//!
//! Internally the invoke-and-track primitive ([`Invoker`]) is shared with
//! the policy executors: it records the start eagerly, spawns the command
//! onto the runtime so it always runs to completion, and records the
//! settlement exactly once.

use std::sync::Arc;

use futures::future::{self, BoxFuture};
use futures::FutureExt;
use tokio::sync::oneshot;

use crate::command::Command;
use crate::state::{ExecutionSnapshot, ExecutionState};

/// Shared invoke-and-track primitive.
///
/// Owns the command and its [`ExecutionState`]. Cheap to clone; clones share
/// both.
pub(crate) struct Invoker<C: Command> {
    command: Arc<C>,
    state: Arc<ExecutionState>,
}

impl<C: Command> Clone for Invoker<C> {
    fn clone(&self) -> Self {
        Self {
            command: Arc::clone(&self.command),
            state: Arc::clone(&self.state),
        }
    }
}

impl<C: Command> Invoker<C> {
    pub(crate) fn new(command: C) -> Self {
        Self {
            command: Arc::new(command),
            state: Arc::new(ExecutionState::default()),
        }
    }

    /// Start one tracked invocation.
    ///
    /// Bookkeeping starts now; the returned future must be polled or spawned
    /// to drive the command itself, and settles the bookkeeping exactly once.
    pub(crate) fn invoke(&self, params: C::Params) -> BoxFuture<'static, Result<C::Ok, C::Err>> {
        self.state.on_start();
        let command = Arc::clone(&self.command);
        let state = Arc::clone(&self.state);
        async move {
            let result = command.invoke(params).await;
            state.on_settle(result.is_ok());
            result
        }
        .boxed()
    }

    /// Spawn a tracked invocation onto the runtime.
    ///
    /// The command runs to completion even if the returned receiver is
    /// dropped; only new invocation requests are ever gated, never a run
    /// already started.
    pub(crate) fn spawn_invoke(
        &self,
        params: C::Params,
    ) -> oneshot::Receiver<Result<C::Ok, C::Err>> {
        let invocation = self.invoke(params);
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let _ = tx.send(invocation.await);
        });
        rx
    }

    pub(crate) fn snapshot(&self) -> ExecutionSnapshot {
        self.state.snapshot()
    }

    pub(crate) fn is_running(&self) -> bool {
        self.state.is_running()
    }
}

/// Await a spawned invocation's settlement.
///
/// The sender side only disappears on runtime teardown, at which point there
/// is nobody left to report to, so that arm stays pending.
pub(crate) async fn settlement<T, E>(rx: oneshot::Receiver<Result<T, E>>) -> Result<T, E> {
    match rx.await {
        Ok(result) => result,
        Err(_) => future::pending::<Result<T, E>>().await,
    }
}

/// Uncontrolled executor: every `run` starts its own invocation.
///
/// Must be used from within a Tokio runtime.
pub struct Executor<C: Command> {
    invoker: Invoker<C>,
}

impl<C: Command> Executor<C> {
    pub fn new(command: C) -> Self {
        Self {
            invoker: Invoker::new(command),
        }
    }

    /// Invoke the command unconditionally and return its result.
    ///
    /// Overlapping calls each get their own in-flight slot. The invocation
    /// runs to completion even if the returned future is dropped.
    pub async fn run(&self, params: C::Params) -> Result<C::Ok, C::Err> {
        settlement(self.invoker.spawn_invoke(params)).await
    }

    /// Snapshot of run counters and outcome flags.
    pub fn state(&self) -> ExecutionSnapshot {
        self.invoker.snapshot()
    }

    /// True while at least one invocation is in flight.
    pub fn is_running(&self) -> bool {
        self.invoker.is_running()
    }
}
