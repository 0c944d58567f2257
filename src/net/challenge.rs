//! A process-wide slot for customizing how outgoing TLS/auth challenges are
//! handled, shared mutable state by design: at most one handler is active
//! for the whole process at a time, set once during startup.

use std::sync::OnceLock;

use parking_lot::Mutex;

/// Receives a description of an authentication challenge and decides how to
/// respond. Opaque `str` payload: the concrete shape of a challenge depends
/// on the transport (basic auth realm, client-cert request, ...) and is not
/// something this core needs to model further.
pub trait ChallengeHandler: Send + Sync {
    fn handle(&self, challenge: &str);
}

static HANDLER: OnceLock<Mutex<Option<Box<dyn ChallengeHandler>>>> = OnceLock::new();

fn slot() -> &'static Mutex<Option<Box<dyn ChallengeHandler>>> {
    HANDLER.get_or_init(|| Mutex::new(None))
}

/// Installs the process-wide challenge handler, replacing any previous one.
pub fn set_challenge_handler(handler: impl ChallengeHandler + 'static) {
    *slot().lock() = Some(Box::new(handler));
}

pub fn clear_challenge_handler() {
    *slot().lock() = None;
}

/// Invokes the installed handler, if any.
pub fn dispatch_challenge(challenge: &str) {
    if let Some(handler) = slot().lock().as_deref() {
        handler.handle(challenge);
    }
}
