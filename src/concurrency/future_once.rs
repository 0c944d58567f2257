//! A one-shot value fulfilled exactly once, distinct from [`crate::concurrency::signal::Signal`]'s
//! repeated-emission shape rather than a shared base type for both: the
//! ownership transfer a one-shot send needs (the sender is consumed) and the
//! `Clone`-and-broadcast shape a multi-shot signal needs don't compose well
//! under one hierarchy, so they're kept as two concrete types.

use tokio::sync::oneshot;

/// The write side of a [`Deferred`]. Consumed on fulfillment, matching the
/// "fulfilled exactly once" contract at the type level.
pub struct DeferredSender<T>(oneshot::Sender<T>);

impl<T> std::fmt::Debug for DeferredSender<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("DeferredSender").finish()
    }
}

/// The read side of a one-shot value.
pub struct Deferred<T>(oneshot::Receiver<T>);

impl<T> std::fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Deferred").finish()
    }
}

/// Creates a linked fulfillment/observation pair.
pub fn deferred<T>() -> (DeferredSender<T>, Deferred<T>) {
    let (tx, rx) = oneshot::channel();
    (DeferredSender(tx), Deferred(rx))
}

impl<T> DeferredSender<T> {
    /// Fulfills the deferred value. Returns the value back if nothing is
    /// listening anymore.
    pub fn fulfill(self, value: T) -> Result<(), T> {
        self.0.send(value)
    }
}

impl<T> Deferred<T> {
    /// Waits for fulfillment. Returns `None` if the sender was dropped
    /// without fulfilling.
    pub async fn wait(self) -> Option<T> {
        self.0.await.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fulfilled_value_is_observed() {
        let (tx, rx) = deferred::<u32>();
        tx.fulfill(42).unwrap();
        assert_eq!(rx.wait().await, Some(42));
    }

    #[tokio::test]
    async fn dropped_sender_resolves_to_none() {
        let (tx, rx) = deferred::<u32>();
        drop(tx);
        assert_eq!(rx.wait().await, None);
    }
}
