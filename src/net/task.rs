//! A cancellable, retrying network fetch.

use std::sync::Arc;

use parking_lot::Mutex;
use reqwest::Url;

use crate::concurrency::RequestToken;
use crate::future::BoxFuture;
use crate::net::error::Error;
use crate::net::strategy::{Decision, NetworkErrorHandlingStrategy};

/// The external collaborator that actually performs a fetch. Production code
/// uses [`crate::net::operation::NetworkOperation`]; tests substitute a stub.
pub trait Fetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Vec<u8>, Error>>;
}

/// The lifecycle of a [`RetryingTask`]: `Created -> Running -> (Retrying ->
/// Running)* -> Terminal`, where `Terminal` is `Succeeded`, `Failed`, or
/// `Cancelled`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    Created,
    Running { attempt: u32 },
    Retrying { attempt: u32 },
    Succeeded,
    Failed,
    Cancelled,
}

/// Drives a [`Fetcher`] through retries according to a
/// [`NetworkErrorHandlingStrategy`], cooperatively cancellable via a
/// [`RequestToken`].
pub struct RetryingTask {
    fetcher: Arc<dyn Fetcher>,
    strategy: Arc<dyn NetworkErrorHandlingStrategy>,
    token: Arc<RequestToken>,
    state: Mutex<TaskState>,
}

impl std::fmt::Debug for RetryingTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingTask")
            .field("token", &self.token)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl RetryingTask {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        strategy: Arc<dyn NetworkErrorHandlingStrategy>,
        token: Arc<RequestToken>,
    ) -> Self {
        RetryingTask { fetcher, strategy, token, state: Mutex::new(TaskState::Created) }
    }

    /// The task's current lifecycle state.
    pub fn state(&self) -> TaskState {
        self.state.lock().clone()
    }

    fn set_state(&self, state: TaskState) {
        *self.state.lock() = state;
    }

    /// Runs the fetch to completion: success, a non-retryable failure, an
    /// exhausted retry budget, or cancellation — whichever comes first.
    pub async fn run(&self, url: &Url) -> Result<Vec<u8>, Error> {
        let mut attempt: u32 = 0;
        loop {
            if self.token.is_cancelled() {
                self.set_state(TaskState::Cancelled);
                return Err(Error::Cancelled);
            }
            attempt += 1;
            self.set_state(TaskState::Running { attempt });

            let fetch = self.fetcher.fetch(url);
            let outcome = tokio::select! {
                biased;
                () = self.token.cancelled() => {
                    self.set_state(TaskState::Cancelled);
                    return Err(Error::Cancelled);
                }
                result = fetch => result,
            };

            match outcome {
                Ok(bytes) => {
                    self.set_state(TaskState::Succeeded);
                    return Ok(bytes);
                }
                Err(err) => match self.strategy.decide(&err, attempt) {
                    Decision::Completed => {
                        self.set_state(TaskState::Failed);
                        return Err(err);
                    }
                    Decision::WaitForRetry { after } => {
                        self.set_state(TaskState::Retrying { attempt });
                        tokio::select! {
                            biased;
                            () = self.token.cancelled() => {
                                self.set_state(TaskState::Cancelled);
                                return Err(Error::Cancelled);
                            }
                            () = tokio::time::sleep(after) => {}
                        }
                    }
                },
            }
        }
    }
}
