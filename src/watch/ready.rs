//! # One-shot readiness barrier.
//!
//! The adapter owns a [`ReadySignal`] and marks it once its initial view of the
//! store is complete; the controller waits on the matching [`Readiness`] before
//! it reports itself ready. Readiness never goes back to false.
//!
//! A signal dropped before it was marked means the adapter gave up, which
//! [`Readiness::wait`] reports as `false`.

use tokio::sync::watch;

/// Adapter side of the barrier.
#[derive(Debug)]
pub struct ReadySignal {
    tx: watch::Sender<bool>,
}

/// Waiting side of the barrier.
#[derive(Clone, Debug)]
pub struct Readiness {
    rx: watch::Receiver<bool>,
}

/// Creates a connected signal/readiness pair.
pub fn readiness() -> (ReadySignal, Readiness) {
    let (tx, rx) = watch::channel(false);
    (ReadySignal { tx }, Readiness { rx })
}

impl ReadySignal {
    /// Marks the adapter as synced. Idempotent.
    pub fn mark_ready(&self) {
        self.tx.send_if_modified(|ready| !std::mem::replace(ready, true));
    }

    /// Returns true once marked.
    pub fn is_ready(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Readiness {
    /// Returns true once marked.
    pub fn is_ready(&self) -> bool {
        *self.rx.borrow()
    }

    /// Waits until the signal is marked (`true`) or dropped unmarked (`false`).
    pub async fn wait(&mut self) -> bool {
        self.rx.wait_for(|ready| *ready).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wait_completes_after_mark() {
        let (signal, mut ready) = readiness();
        assert!(!ready.is_ready());

        let waiter = tokio::spawn(async move { ready.wait().await });
        signal.mark_ready();
        signal.mark_ready();
        assert!(signal.is_ready());
        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn marked_then_dropped_stays_ready() {
        let (signal, mut ready) = readiness();
        signal.mark_ready();
        drop(signal);
        assert!(ready.wait().await);
    }

    #[tokio::test]
    async fn dropped_unmarked_is_failure() {
        let (signal, mut ready) = readiness();
        drop(signal);
        assert!(!ready.wait().await);
    }
}
