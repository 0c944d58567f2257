//! A cooperative cancellation token with a monotone `{pending, attached,
//! cancelled}` state machine: it can acquire a cancel handle at most once,
//! and once cancelled it can never return to an earlier state.

use parking_lot::Mutex;
use tokio::sync::Notify;

enum State {
    Pending,
    Attached(Box<dyn FnOnce() + Send>),
    Cancelled,
}

/// A shareable cancellation signal for one logical request.
///
/// `attach` lets the operation actually doing the work register a cleanup
/// handle (e.g. aborting a `JoinHandle`) to run if cancellation arrives after
/// the operation has started; `cancelled()` lets any number of awaiters
/// suspend until cancellation happens.
pub struct RequestToken {
    state: Mutex<State>,
    notify: Notify,
}

impl Default for RequestToken {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestToken {
    pub fn new() -> Self {
        RequestToken {
            state: Mutex::new(State::Pending),
            notify: Notify::new(),
        }
    }

    /// Registers a cancel handle. If the token is already cancelled, the
    /// handle runs immediately and synchronously.
    ///
    /// # Panics
    ///
    /// Panics if a handle is already attached: each token is meant to back
    /// exactly one cancellable operation over its lifetime.
    pub fn attach(&self, on_cancel: impl FnOnce() + Send + 'static) {
        let mut guard = self.state.lock();
        match *guard {
            State::Pending => *guard = State::Attached(Box::new(on_cancel)),
            State::Cancelled => {
                drop(guard);
                on_cancel();
            }
            State::Attached(_) => panic!("RequestToken already attached"),
        }
    }

    /// Cancels the token. Idempotent: cancelling an already-cancelled token
    /// is a no-op.
    pub fn cancel(&self) {
        let prev = {
            let mut guard = self.state.lock();
            std::mem::replace(&mut *guard, State::Cancelled)
        };
        if let State::Attached(handle) = prev {
            handle();
        }
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(*self.state.lock(), State::Cancelled)
    }

    /// Resolves once the token is cancelled. Resolves immediately if it
    /// already is.
    pub async fn cancelled(&self) {
        loop {
            if self.is_cancelled() {
                return;
            }
            let notified = self.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

impl std::fmt::Debug for RequestToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
