//! Cadence - invocation control for async commands.
//!
//! Wraps an asynchronous command (anything implementing [`Command`]) in a
//! policy that decides, for each new invocation request, whether to run
//! immediately, queue exactly one follow-up, drop the request, or reuse a
//! prior result:
//!
//! - [`Executor`]: uncontrolled baseline, overlapping runs allowed
//! - [`CacheExecutor`]: memoizes the first settled (or in-flight) result
//! - [`LadderExecutor`]: run now, queue at most one coalesced follow-up
//! - [`DebounceExecutor`]: fires once a quiet period elapses
//! - [`RepeatExecutor`]: fires on a fixed interval between start/stop
//! - [`InfiniteLoader`]: lazy pagination with coalesced refresh
//!
//! A command, once invoked, always runs to completion - only *new*
//! invocation requests are gated.
//!
//! # Example
//!
//! ```ignore
//! use cadence::{command_fn, LadderExecutor};
//!
//! let save = command_fn(|doc: String| async move { persist(doc).await });
//! let executor = LadderExecutor::new(save);
//!
//! // Overlapping calls collapse into "run now, queue the latest".
//! executor.run(draft).await?;
//! ```

pub mod cache;
pub mod command;
pub mod debounce;
pub mod executor;
pub mod ladder;
pub mod loader;
pub mod mock;
pub mod repeat;
pub mod state;

pub use cache::CacheExecutor;
pub use command::{command_fn, Command, CommandFn};
pub use debounce::DebounceExecutor;
pub use executor::Executor;
pub use ladder::LadderExecutor;
pub use loader::{InfiniteLoader, LoaderSnapshot, NextOutcome, RefreshOutcome};
pub use mock::{MockCommand, MockFailure};
pub use repeat::RepeatExecutor;
pub use state::ExecutionSnapshot;
