//! # Fan-out of bus events to subscribers.
//!
//! Each subscriber gets its own [`Lane`]: a bounded queue and one worker task.
//! [`SubscriberSet::emit`] only ever `try_send`s, so a stuck log sink can never
//! hold up the listener that drains the bus.
//!
//! ```text
//! emit(ev) ──Arc──┬──► lane "log"    ──► LogWriter::on_event
//!                 ├──► lane "custom" ──► ...          (panic → SubscriberPanicked, unless on one)
//!                 └──► lane full     ──► ev dropped for that lane only (SubscriberOverflow)
//! ```
//!
//! Events keep their order within one lane. Nothing is promised across lanes.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
};

use crate::events::{Bus, Event, EventKind};
use crate::subscribers::Subscribe;

/// Queue and worker serving one subscriber.
struct Lane {
    name: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
    worker: JoinHandle<()>,
}

impl Lane {
    fn spawn(sub: Arc<dyn Subscribe>, bus: Bus) -> Self {
        let name = sub.name();
        let (tx, mut rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));

        let worker = tokio::spawn(async move {
            while let Some(ev) = rx.recv().await {
                let delivered = AssertUnwindSafe(sub.on_event(&ev)).catch_unwind().await;
                // A panic report that panics again is not reported, or the
                // listener would feed it straight back into this lane.
                if let Err(panic) = delivered {
                    if ev.kind != EventKind::SubscriberPanicked {
                        let info = panic_message(panic.as_ref());
                        bus.publish(Event::subscriber_panicked(name, info));
                    }
                }
            }
        });

        Self { name, tx, worker }
    }

    /// Queues `ev`, returning why it was dropped if it could not be.
    fn offer(&self, ev: &Arc<Event>) -> Option<&'static str> {
        match self.tx.try_send(Arc::clone(ev)) {
            Ok(()) => None,
            Err(TrySendError::Full(_)) => Some("full"),
            Err(TrySendError::Closed(_)) => Some("closed"),
        }
    }
}

/// Delivers every emitted event to each subscriber on its own worker.
pub struct SubscriberSet {
    lanes: Vec<Lane>,
    bus: Bus,
}

impl SubscriberSet {
    /// Spawns one lane per subscriber. Needs a running tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let lanes = subs
            .into_iter()
            .map(|sub| Lane::spawn(sub, bus.clone()))
            .collect();
        Self { lanes, bus }
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Queues `event` for every subscriber without waiting.
    ///
    /// A dropped event is reported as `SubscriberOverflow`, except when the
    /// dropped event is itself an overflow report.
    pub fn emit(&self, event: &Event) {
        let event = Arc::new(event.clone());
        let report = event.kind != EventKind::SubscriberOverflow;

        for lane in &self.lanes {
            if let Some(reason) = lane.offer(&event) {
                if report {
                    self.bus.publish(Event::subscriber_overflow(lane.name, reason));
                }
            }
        }
    }

    /// Closes every lane and waits until each worker has drained its queue.
    pub async fn shutdown(self) {
        let mut workers = Vec::with_capacity(self.lanes.len());
        for Lane { tx, worker, .. } in self.lanes {
            drop(tx);
            workers.push(worker);
        }
        for worker in workers {
            let _ = worker.await;
        }
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&'static str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}
