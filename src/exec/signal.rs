// src/exec/signal.rs

//! Single-fire completion signal.
//!
//! One [`CompletionSignal`] (the writer) is paired with any number of
//! [`CompletionWaiter`]s. The first `fire` wins; later fires are ignored and
//! reported back as `false`. If the writer is dropped without firing,
//! waiters resolve to `None` instead of blocking forever.

use tokio::sync::watch;

/// Writer half. Owned by exactly one producer (usually an output drainer).
#[derive(Debug)]
pub struct CompletionSignal<T = bool> {
    tx: watch::Sender<Option<T>>,
}

/// Reader half. Cheap to clone; every clone observes the same value.
#[derive(Debug, Clone)]
pub struct CompletionWaiter<T = bool> {
    rx: watch::Receiver<Option<T>>,
}

/// Create a fresh, unfired signal pair.
pub fn completion_signal<T: Clone>() -> (CompletionSignal<T>, CompletionWaiter<T>) {
    let (tx, rx) = watch::channel(None);
    (CompletionSignal { tx }, CompletionWaiter { rx })
}

impl<T: Clone> CompletionSignal<T> {
    /// Set the value. Returns `false` if the signal had already fired, in
    /// which case the stored value is left untouched.
    pub fn fire(&self, value: T) -> bool {
        let mut value = Some(value);
        self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = value.take();
            true
        })
    }

    pub fn is_fired(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// A new waiter bound to this signal.
    pub fn waiter(&self) -> CompletionWaiter<T> {
        CompletionWaiter {
            rx: self.tx.subscribe(),
        }
    }
}

impl<T: Clone> CompletionWaiter<T> {
    /// Wait until the signal fires.
    ///
    /// Returns `None` if the writer went away without firing. Cancel-safe:
    /// dropping the future loses nothing.
    pub async fn wait(&self) -> Option<T> {
        let mut rx = self.rx.clone();
        let fired = match rx.wait_for(Option::is_some).await {
            Ok(value) => (*value).clone(),
            // Writer dropped while still unfired.
            Err(_) => None,
        };
        fired
    }

    /// Current value without waiting.
    pub fn peek(&self) -> Option<T> {
        self.rx.borrow().clone()
    }
}
