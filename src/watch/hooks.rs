//! # Notification hooks.
//!
//! [`Hooks`] is what a watch adapter holds: the sending half of the single
//! ordered channel the reconciler worker drains. `on_add`, `on_update` and
//! `on_delete` wait for room in the channel rather than dropping, so delivery
//! order is exactly call order.

use tokio::sync::mpsc;

use super::notification::{Notification, Object};
use crate::error::WatchError;

/// Sender side of the notification channel.
#[derive(Clone, Debug)]
pub struct Hooks {
    tx: mpsc::Sender<Notification>,
}

impl Hooks {
    /// Creates hooks and the receiver the reconciler consumes.
    ///
    /// `capacity` is clamped to at least 1.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Object appeared.
    pub async fn on_add(&self, obj: Object) -> Result<(), WatchError> {
        self.send(Notification::Added(obj)).await
    }

    /// Object changed.
    pub async fn on_update(&self, old: Object, new: Object) -> Result<(), WatchError> {
        self.send(Notification::Updated { old, new }).await
    }

    /// Object disappeared; `obj` may be a tombstone.
    pub async fn on_delete(&self, obj: Object) -> Result<(), WatchError> {
        self.send(Notification::Deleted(obj)).await
    }

    /// Delivers a prepared notification.
    ///
    /// Fails with [`WatchError::Closed`] once the reconciler has stopped.
    pub async fn send(&self, notification: Notification) -> Result<(), WatchError> {
        self.tx
            .send(notification)
            .await
            .map_err(|_| WatchError::Closed)
    }

    /// Returns true once the reconciler side is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
