//! # Polling watch adapter.
//!
//! [`PollingWatch`] drives a [`SnapshotSource`] on a timer and turns the
//! listings into notifications through a [`Store`].
//!
//! ## Loop
//! ```text
//! loop {
//!   list() ─┬─ Ok(objects)
//!           │    ├─ non-declarations      → ObjectSkipped (once, while they stay skipped)
//!           │    ├─ store.replace(decls)  → hooks (in key order; undecodable keys held)
//!           │    ├─ first success         → ready.mark_ready()
//!           │    └─ sleep(interval)
//!           └─ Err(e)
//!                ├─ WatchFailed { attempt, reason }
//!                ├─ BackoffScheduled { attempt, delay = backoff.next(failures) }
//!                └─ sleep(delay)
//! } until token cancelled (→ Ok) or hooks closed (→ Err(Closed))
//! ```
//!
//! Listing failures are never fatal here; a controller that never syncs is
//! stopped by its own sync timeout.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{
    adapter::WatchAdapter, hooks::Hooks, notification::Object, ready::ReadySignal,
    source::SnapshotSource, store::Store,
};
use crate::{
    error::WatchError,
    events::{Bus, Event, EventKind},
    policies::BackoffPolicy,
    reconcile::Declaration,
};

/// Timing of a [`PollingWatch`].
#[derive(Clone, Copy, Debug)]
pub struct PollConfig {
    /// Pause between successful listings.
    pub interval: Duration,
    /// Delay schedule after failed listings.
    pub backoff: BackoffPolicy,
}

impl Default for PollConfig {
    /// `interval = 10s`, `backoff = BackoffPolicy::default()`.
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            backoff: BackoffPolicy::default(),
        }
    }
}

/// Watch adapter polling a snapshot source.
pub struct PollingWatch<S> {
    source: S,
    cfg: PollConfig,
    bus: Bus,
}

impl<S: SnapshotSource> PollingWatch<S> {
    /// Creates an adapter with default timing, reporting on `bus`.
    pub fn new(source: S, bus: Bus) -> Self {
        Self {
            source,
            cfg: PollConfig::default(),
            bus,
        }
    }

    /// Overrides the timing.
    pub fn with_config(mut self, cfg: PollConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Splits a listing into declarations and the keys to hold in the store.
    ///
    /// Everything else is published as `ObjectSkipped` unless it was already
    /// skipped by the previous listing; `skipped` is updated to this listing's.
    fn accept(
        &self,
        objects: Vec<Object>,
        skipped: &mut BTreeSet<String>,
    ) -> (Vec<Declaration>, BTreeSet<String>) {
        let mut decls = Vec::with_capacity(objects.len());
        let mut held = BTreeSet::new();
        let mut now_skipped = BTreeSet::new();

        for obj in objects {
            if let Object::Declaration(d) = obj {
                decls.push(*d);
                continue;
            }
            if let Some(key) = obj.undecodable_key() {
                held.insert(key.to_owned());
            }
            let what = obj.describe();
            if !skipped.contains(&what) {
                self.bus.publish(
                    Event::new(EventKind::ObjectSkipped)
                        .with_reason(format!("{}: {what}", self.source.name())),
                );
            }
            now_skipped.insert(what);
        }

        *skipped = now_skipped;
        (decls, held)
    }
}

#[async_trait]
impl<S: SnapshotSource> WatchAdapter for PollingWatch<S> {
    fn name(&self) -> &str {
        self.source.name()
    }

    async fn run(
        &self,
        hooks: Hooks,
        ready: ReadySignal,
        token: CancellationToken,
    ) -> Result<(), WatchError> {
        let mut store = Store::new();
        let mut skipped = BTreeSet::new();
        let mut failures: u32 = 0;

        loop {
            let listed = tokio::select! {
                biased;
                _ = token.cancelled() => return Ok(()),
                res = self.source.list() => res,
            };

            let delay = match listed {
                Ok(objects) => {
                    failures = 0;
                    let (decls, held) = self.accept(objects, &mut skipped);
                    for notification in store.replace_holding(decls, &held) {
                        hooks.send(notification).await?;
                    }
                    ready.mark_ready();
                    self.cfg.interval
                }
                Err(e) => {
                    let delay = self.cfg.backoff.next(failures);
                    failures = failures.saturating_add(1);
                    self.bus.publish(
                        Event::new(EventKind::WatchFailed)
                            .with_attempt(failures)
                            .with_reason(format!("{}: {e}", self.source.name())),
                    );
                    self.bus.publish(
                        Event::new(EventKind::BackoffScheduled)
                            .with_attempt(failures)
                            .with_delay(delay),
                    );
                    delay
                }
            };

            tokio::select! {
                _ = token.cancelled() => return Ok(()),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::JitterPolicy;
    use crate::watch::{Notification, readiness};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Source replaying scripted listings; repeats the last one when exhausted.
    struct Scripted {
        script: Mutex<VecDeque<Result<Vec<Object>, WatchError>>>,
        last: Mutex<Vec<Object>>,
    }

    impl Scripted {
        fn new(script: Vec<Result<Vec<Object>, WatchError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                last: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SnapshotSource for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn list(&self) -> Result<Vec<Object>, WatchError> {
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(Ok(objects)) => {
                    *self.last.lock().unwrap() = objects.clone();
                    Ok(objects)
                }
                Some(Err(e)) => Err(e),
                None => Ok(self.last.lock().unwrap().clone()),
            }
        }
    }

    fn web(host: &str) -> Declaration {
        Declaration::new("web").in_namespace("apps").enabled().with_host(host)
    }

    fn service() -> Object {
        Object::Unknown {
            kind: "Service".into(),
            key: Some("apps/svc".into()),
        }
    }

    fn skipped(events: &mut tokio::sync::broadcast::Receiver<Event>) -> usize {
        std::iter::from_fn(|| events.try_recv().ok())
            .filter(|e| e.kind == EventKind::ObjectSkipped)
            .count()
    }

    fn fast() -> PollConfig {
        PollConfig {
            interval: Duration::from_secs(1),
            backoff: BackoffPolicy {
                first: Duration::from_millis(100),
                max: Duration::from_secs(1),
                factor: 2.0,
                jitter: JitterPolicy::None,
            },
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_then_syncs_and_streams_changes() {
        let bus = Bus::new(64);
        let mut events = bus.subscribe();
        let source = Scripted::new(vec![
            Err(WatchError::Closed),
            Ok(vec![web("a.local").into(), service()]),
            Ok(vec![web("b.local").into()]),
        ]);
        let watch = PollingWatch::new(source, bus).with_config(fast());

        let (hooks, mut rx) = Hooks::channel(16);
        let (signal, mut ready) = readiness();
        let token = CancellationToken::new();
        let t = token.clone();
        let task = tokio::spawn(async move { watch.run(hooks, signal, t).await });

        assert!(ready.wait().await);
        assert_eq!(rx.recv().await, Some(Notification::Added(web("a.local").into())));
        assert_eq!(
            rx.recv().await,
            Some(Notification::Updated {
                old: web("a.local").into(),
                new: web("b.local").into(),
            })
        );

        token.cancel();
        assert!(task.await.unwrap().is_ok());

        let kinds: Vec<EventKind> = std::iter::from_fn(|| events.try_recv().ok())
            .map(|e| e.kind)
            .collect();
        assert_eq!(
            kinds,
            [
                EventKind::WatchFailed,
                EventKind::BackoffScheduled,
                EventKind::ObjectSkipped
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unreadable_listing_does_not_delete_the_declaration() {
        let bus = Bus::new(64);
        let mut events = bus.subscribe();
        let unreadable = Object::from_value(serde_json::json!({
            "kind": "Ingress",
            "metadata": {
                "name": "web",
                "namespace": "apps",
                "annotations": { "mdnscontroller/enabled": true }
            },
            "spec": { "rules": [{ "host": "a.local" }] }
        }));
        let source = Scripted::new(vec![
            Ok(vec![web("a.local").into()]),
            Ok(vec![unreadable]),
            Ok(vec![web("b.local").into()]),
        ]);
        let watch = PollingWatch::new(source, bus).with_config(fast());

        let (hooks, mut rx) = Hooks::channel(16);
        let (signal, _ready) = readiness();
        let token = CancellationToken::new();
        let t = token.clone();
        let task = tokio::spawn(async move { watch.run(hooks, signal, t).await });

        assert_eq!(rx.recv().await, Some(Notification::Added(web("a.local").into())));
        // Next change seen is the readable update, with no deletion in between.
        assert_eq!(
            rx.recv().await,
            Some(Notification::Updated {
                old: web("a.local").into(),
                new: web("b.local").into(),
            })
        );

        token.cancel();
        assert!(task.await.unwrap().is_ok());
        assert_eq!(skipped(&mut events), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_skips_are_reported_once() {
        let bus = Bus::new(64);
        let mut events = bus.subscribe();
        let source = Scripted::new(vec![
            Ok(vec![web("a.local").into(), service()]),
            Ok(vec![web("a.local").into(), service()]),
            Ok(vec![web("a.local").into()]),
            Ok(vec![web("a.local").into(), service()]),
        ]);
        let watch = PollingWatch::new(source, bus).with_config(fast());

        let (hooks, _rx) = Hooks::channel(16);
        let (signal, _ready) = readiness();
        let token = CancellationToken::new();
        let t = token.clone();
        let task = tokio::spawn(async move { watch.run(hooks, signal, t).await });

        // Four scripted listings, then the last one repeats.
        tokio::time::sleep(Duration::from_secs(10)).await;
        token.cancel();
        assert!(task.await.unwrap().is_ok());

        // Once for the first appearance, once after it came back.
        assert_eq!(skipped(&mut events), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_hooks_stop_the_adapter() {
        let source = Scripted::new(vec![Ok(vec![web("a.local").into()])]);
        let watch = PollingWatch::new(source, Bus::new(8)).with_config(fast());
        let (hooks, rx) = Hooks::channel(4);
        drop(rx);
        let (signal, _ready) = readiness();

        let res = watch.run(hooks, signal, CancellationToken::new()).await;
        assert!(matches!(res, Err(WatchError::Closed)));
    }

    #[tokio::test]
    async fn cancelled_before_first_listing() {
        let watch = PollingWatch::new(Scripted::new(Vec::new()), Bus::new(8));
        let (hooks, _rx) = Hooks::channel(4);
        let (signal, ready) = readiness();
        let token = CancellationToken::new();
        token.cancel();

        assert!(watch.run(hooks, signal, token).await.is_ok());
        assert!(!ready.is_ready());
    }
}
