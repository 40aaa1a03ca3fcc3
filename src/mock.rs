//! Mock command for testing executor policies.
//!
//! Records every invocation's parameters, can be scripted to fail, and can
//! hold invocations at a gate so tests control exactly when a run settles.
//! Cloning yields a handle to the same recorder, so a test can keep one
//! handle after moving the other into an executor.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{Mutex, Semaphore};

use crate::command::Command;

/// Failure produced by a scripted [`MockCommand`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("mock command failed: {0}")]
pub struct MockFailure(pub String);

struct MockInner<P> {
    calls: Mutex<Vec<P>>,
    failure: Mutex<Option<String>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

/// Mock command echoing its parameters on success.
pub struct MockCommand<P = u32> {
    inner: Arc<MockInner<P>>,
}

impl<P> Clone for MockCommand<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P> Default for MockCommand<P> {
    fn default() -> Self {
        Self {
            inner: Arc::new(MockInner {
                calls: Mutex::new(Vec::new()),
                failure: Mutex::new(None),
                gate: Mutex::new(None),
            }),
        }
    }
}

impl<P> MockCommand<P> {
    /// Create a mock that settles immediately with its parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock whose every invocation fails with the given message.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(MockInner {
                calls: Mutex::new(Vec::new()),
                failure: Mutex::new(Some(message.into())),
                gate: Mutex::new(None),
            }),
        }
    }

    /// Script or clear the failure returned by subsequent invocations.
    pub async fn set_failure(&self, message: Option<String>) {
        *self.inner.failure.lock().await = message;
    }

    /// Hold invocations at a gate until permits are released.
    pub async fn hold(&self) {
        *self.inner.gate.lock().await = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let `n` held invocations proceed.
    pub async fn release(&self, n: usize) {
        if let Some(gate) = self.inner.gate.lock().await.as_ref() {
            gate.add_permits(n);
        }
    }

    /// Remove the gate, letting every held and future invocation proceed.
    pub async fn open(&self) {
        if let Some(gate) = self.inner.gate.lock().await.take() {
            gate.close();
        }
    }

    /// Parameters of every invocation so far, in call order.
    pub async fn calls(&self) -> Vec<P>
    where
        P: Clone,
    {
        self.inner.calls.lock().await.clone()
    }

    /// Number of invocations so far.
    pub async fn call_count(&self) -> usize {
        self.inner.calls.lock().await.len()
    }
}

#[async_trait]
impl<P> Command for MockCommand<P>
where
    P: Clone + Send + Sync + 'static,
{
    type Params = P;
    type Ok = P;
    type Err = MockFailure;

    async fn invoke(&self, params: P) -> Result<P, MockFailure> {
        self.inner.calls.lock().await.push(params.clone());

        let gate = self.inner.gate.lock().await.clone();
        if let Some(gate) = gate {
            // A closed gate means "opened"; held permits are consumed for good.
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        if let Some(message) = self.inner.failure.lock().await.clone() {
            return Err(MockFailure(message));
        }
        Ok(params)
    }
}
