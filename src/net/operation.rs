//! The production [`Fetcher`]: an HTTP GET via `reqwest`, wrapped with the
//! lifecycle and header-injection contract of a `NetworkOperation`.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Url};

use crate::future::BoxFuture;
use crate::net::error::Error;
use crate::net::task::Fetcher;

/// `Ready` before the first attempt, `Executing` while a request is
/// in-flight, `Finished` once an attempt has returned (successfully or not).
/// A cancelled operation never reaches `Finished` for that attempt — its
/// future is dropped mid-flight instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Ready,
    Executing,
    Finished,
}

/// Notified immediately before each retry attempt (the second and later
/// calls to [`NetworkOperation::fetch`]).
pub trait NetworkOperationLifecycleDelegate: Send + Sync {
    fn on_retry(&self);
}

/// Fetches a URL's body as bytes over HTTP, sharing one connection-pooling
/// [`Client`] across every request. Injects a `User-Agent` header at send
/// time; constructing one with caller-supplied headers that already carry a
/// `User-Agent` is a programmer error.
pub struct NetworkOperation {
    client: Client,
    user_agent: HeaderValue,
    headers: HeaderMap,
    state: Mutex<OperationState>,
    task_description: Mutex<Option<String>>,
    lifecycle_delegate: Option<Arc<dyn NetworkOperationLifecycleDelegate>>,
    attempts: AtomicU32,
}

impl std::fmt::Debug for NetworkOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkOperation")
            .field("state", &*self.state.lock())
            .field("task_description", &*self.task_description.lock())
            .finish_non_exhaustive()
    }
}

impl Default for NetworkOperation {
    fn default() -> Self {
        NetworkOperation::new(Client::new())
    }
}

impl NetworkOperation {
    pub fn new(client: Client) -> Self {
        NetworkOperation::with_headers(client, HeaderMap::new())
    }

    /// Builds an operation that attaches `headers` to every request, in
    /// addition to the injected `User-Agent`.
    ///
    /// # Panics
    /// Panics if `headers` already contains a `User-Agent` entry — the
    /// operation owns that header, and a caller-supplied one would be
    /// silently shadowed or conflict with it.
    pub fn with_headers(client: Client, headers: HeaderMap) -> Self {
        assert!(
            !headers.contains_key(USER_AGENT),
            "NetworkOperation's resource must not already carry a User-Agent header"
        );
        let user_agent = HeaderValue::from_static(concat!("rescache/", env!("CARGO_PKG_VERSION")));
        NetworkOperation {
            client,
            user_agent,
            headers,
            state: Mutex::new(OperationState::Ready),
            task_description: Mutex::new(None),
            lifecycle_delegate: None,
            attempts: AtomicU32::new(0),
        }
    }

    /// Installs a delegate notified before each retry attempt.
    pub fn with_lifecycle_delegate(mut self, delegate: Arc<dyn NetworkOperationLifecycleDelegate>) -> Self {
        self.lifecycle_delegate = Some(delegate);
        self
    }

    pub fn is_executing(&self) -> bool {
        *self.state.lock() == OperationState::Executing
    }

    pub fn is_finished(&self) -> bool {
        *self.state.lock() == OperationState::Finished
    }

    pub fn task_description(&self) -> Option<String> {
        self.task_description.lock().clone()
    }

    pub fn set_task_description(&self, description: Option<String>) {
        *self.task_description.lock() = description;
    }

    async fn send(&self, url: &Url) -> Result<Vec<u8>, Error> {
        let response = self
            .client
            .get(url.clone())
            .headers(self.headers.clone())
            .header(USER_AGENT, self.user_agent.clone())
            .send()
            .await
            .map_err(|err| Error::TransportError(err.to_string()))?;

        let status = response.status();
        if status.as_u16() >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::HTTPError { status: status.as_u16(), body });
        }

        response
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|err| Error::TransportError(err.to_string()))
    }
}

impl Fetcher for NetworkOperation {
    fn fetch<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Vec<u8>, Error>> {
        Box::pin(async move {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt > 0 {
                if let Some(delegate) = &self.lifecycle_delegate {
                    delegate.on_retry();
                }
            }

            *self.state.lock() = OperationState::Executing;
            let result = self.send(url).await;
            *self.state.lock() = OperationState::Finished;
            result
        })
    }
}
