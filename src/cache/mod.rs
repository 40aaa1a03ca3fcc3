//! Caching executor: one result, shared by everyone.
//!
//! The first `run` starts the command and installs the in-flight result in
//! the cache slot before it settles, so concurrent callers in the same
//! instant share a single invocation. Once settled, the result - success or
//! failure - stays cached until an explicit [`CacheExecutor::run_fresh`];
//! a cached failure is resurfaced as-is, never retried behind the caller's
//! back.

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::command::Command;
use crate::executor::{settlement, Invoker};
use crate::state::ExecutionSnapshot;

type CachedRun<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;

/// Executor memoizing the first settled (or in-flight) result.
///
/// Must be used from within a Tokio runtime.
pub struct CacheExecutor<C: Command>
where
    C::Ok: Clone,
    C::Err: Clone,
{
    invoker: Invoker<C>,
    cache: Mutex<Option<CachedRun<C::Ok, C::Err>>>,
}

impl<C: Command> CacheExecutor<C>
where
    C::Ok: Clone,
    C::Err: Clone,
{
    pub fn new(command: C) -> Self {
        Self {
            invoker: Invoker::new(command),
            cache: Mutex::new(None),
        }
    }

    /// Return the cached result, invoking the command only on a cold cache.
    ///
    /// The cache entry is installed before the invocation settles, so every
    /// caller arriving while it is in flight awaits the same run.
    pub async fn run(&self, params: C::Params) -> Result<C::Ok, C::Err> {
        let entry = {
            let mut cache = self.cache.lock().await;
            match cache.as_ref() {
                Some(entry) => entry.clone(),
                None => {
                    let entry = self.start(params);
                    *cache = Some(entry.clone());
                    entry
                }
            }
        };
        entry.await
    }

    /// Drop whatever is cached and run the command again.
    pub async fn run_fresh(&self, params: C::Params) -> Result<C::Ok, C::Err> {
        let entry = self.start(params);
        {
            let mut cache = self.cache.lock().await;
            if cache.replace(entry.clone()).is_some() {
                debug!("cache entry replaced by run_fresh");
            }
        }
        entry.await
    }

    /// True once a run has been cached (settled or still in flight).
    pub async fn is_primed(&self) -> bool {
        self.cache.lock().await.is_some()
    }

    /// Snapshot of run counters and outcome flags.
    pub fn state(&self) -> ExecutionSnapshot {
        self.invoker.snapshot()
    }

    /// True while an invocation is in flight.
    pub fn is_running(&self) -> bool {
        self.invoker.is_running()
    }

    fn start(&self, params: C::Params) -> CachedRun<C::Ok, C::Err> {
        let rx = self.invoker.spawn_invoke(params);
        settlement(rx).boxed().shared()
    }
}
