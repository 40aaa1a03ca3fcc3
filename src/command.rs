//! Command abstraction.
//!
//! A command is a parameterized asynchronous operation that settles with a
//! value or fails with an error. Executors never inspect the success value;
//! the error type only carries a `Debug` bound so fire-and-forget paths can
//! log failures.

use std::fmt::Debug;
use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;

/// A parameterized asynchronous operation.
///
/// Implement this directly for command objects that carry their own
/// dependencies (clients, pools), or adapt a closure with [`command_fn`].
#[async_trait]
pub trait Command: Send + Sync + 'static {
    /// Parameters one invocation is started with.
    type Params: Send + 'static;
    /// Success value of a settled invocation.
    type Ok: Send + 'static;
    /// Failure of a settled invocation. Resurfaced to callers unchanged.
    type Err: Send + Debug + 'static;

    /// Run one invocation to settlement.
    async fn invoke(&self, params: Self::Params) -> Result<Self::Ok, Self::Err>;
}

/// Adapter implementing [`Command`] for an async closure.
///
/// Built via [`command_fn`]; the phantom pins down the parameter type the
/// closure is invoked with.
pub struct CommandFn<F, P> {
    f: F,
    _params: PhantomData<fn(P)>,
}

/// Wrap an async closure as a [`Command`].
pub fn command_fn<F, P, Fut, T, E>(f: F) -> CommandFn<F, P>
where
    F: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    P: Send + 'static,
    T: Send + 'static,
    E: Send + Debug + 'static,
{
    CommandFn {
        f,
        _params: PhantomData,
    }
}

#[async_trait]
impl<F, P, Fut, T, E> Command for CommandFn<F, P>
where
    F: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    P: Send + 'static,
    T: Send + 'static,
    E: Send + Debug + 'static,
{
    type Params = P;
    type Ok = T;
    type Err = E;

    async fn invoke(&self, params: P) -> Result<T, E> {
        (self.f)(params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_command_fn_invokes_closure() {
        let double = command_fn(|n: u32| async move { Ok::<u32, String>(n * 2) });
        assert_eq!(double.invoke(21).await, Ok(42));
    }

    #[tokio::test]
    async fn test_command_fn_propagates_failure() {
        let broken = command_fn(|_: u32| async move { Err::<u32, String>("boom".into()) });
        assert_eq!(broken.invoke(1).await, Err("boom".to_string()));
    }
}
