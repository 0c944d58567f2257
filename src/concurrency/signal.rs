//! A multi-shot observer: emits zero or more values over its lifetime to any
//! number of observers, each tracking its own read position.

use tokio::sync::watch;

pub struct Signal<T> {
    tx: watch::Sender<Option<T>>,
}

impl<T> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal").field("receiver_count", &self.tx.receiver_count()).finish()
    }
}

#[derive(Clone)]
pub struct SignalObserver<T> {
    rx: watch::Receiver<Option<T>>,
}

impl<T> std::fmt::Debug for SignalObserver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalObserver").finish_non_exhaustive()
    }
}

impl<T: Clone> Signal<T> {
    pub fn new() -> (Self, SignalObserver<T>) {
        let (tx, rx) = watch::channel(None);
        (Signal { tx }, SignalObserver { rx })
    }

    /// Emits a value to all current and future observers.
    pub fn emit(&self, value: T) {
        // No receivers is not an error: a signal with nobody listening yet
        // is a normal, expected state.
        let _ = self.tx.send(Some(value));
    }

    pub fn observe(&self) -> SignalObserver<T> {
        SignalObserver {
            rx: self.tx.subscribe(),
        }
    }
}

impl<T: Clone> SignalObserver<T> {
    /// Waits for the next emission after this observer's current position.
    pub async fn next(&mut self) -> Option<T> {
        self.rx.changed().await.ok()?;
        self.rx.borrow_and_update().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn each_observer_sees_every_emission() {
        let (signal, mut obs_a) = Signal::new();
        let mut obs_b = signal.observe();

        signal.emit(1);
        assert_eq!(obs_a.next().await, Some(1));
        assert_eq!(obs_b.next().await, Some(1));

        signal.emit(2);
        assert_eq!(obs_a.next().await, Some(2));
        assert_eq!(obs_b.next().await, Some(2));
    }
}
