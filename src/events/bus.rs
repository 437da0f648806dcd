//! # Runtime event bus.
//!
//! Every component holds a clone of the same [`Bus`] and publishes into it;
//! the controller's listener is the one reader that forwards to subscribers.
//!
//! ```text
//! PollingWatch ─┐
//! Reconciler  ──┼──► Bus (broadcast ring) ──► Controller listener ──► SubscriberSet
//! Supervisor  ──┤
//! run_advertiser┘
//! ```
//!
//! Publishing never waits. A reader that falls behind by more than the ring
//! capacity observes `Lagged` and loses the oldest events; events published
//! while nobody listens are gone.

use tokio::sync::broadcast;

use super::event::Event;

/// Shared publisher handle.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus buffering up to `capacity` events (at least one).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, ev: Event) {
        // No receiver is not an error: events are observability only.
        let _ = self.tx.send(ev);
    }

    /// Receiver observing events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Number of live receivers.
    pub fn receivers(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn receivers_only_see_events_after_subscribing() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::WatchSynced));

        let mut rx = bus.subscribe();
        assert_eq!(bus.receivers(), 1);
        bus.publish(Event::new(EventKind::ShutdownRequested));

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::ShutdownRequested);
    }

    #[tokio::test]
    async fn slow_receiver_lags_instead_of_blocking() {
        let bus = Bus::new(2);
        let mut rx = bus.subscribe();
        for _ in 0..5 {
            bus.publish(Event::new(EventKind::HostsAdded));
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(3))
        ));
        assert!(rx.recv().await.is_ok());
    }
}
