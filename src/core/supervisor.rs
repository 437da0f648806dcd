//! # Supervisor: one advertiser task per host.
//!
//! The [`Supervisor`] consumes host intents and keeps the invariant that every
//! advertised host has **exactly one** live advertiser task.
//!
//! ## Architecture
//! ```text
//! on_hosts_added({h..})                      on_hosts_removed({h..})
//!   for h:                                     for h:
//!     registry.claim(h) ─┬─ None → AlreadyAdvertised      registry.release(h) ─┬─ true  → AdvertiseStopRequested
//!                        └─ Some(claim)                                        └─ false → NotAdvertised
//!                              │ AdvertiseStarting
//!                              ▼
//!                  tracker.spawn(async {
//!                      run_advertiser(backend, (h, address), claim.token)
//!                      registry.evict(h, claim.id) → HostEvicted
//!                  })
//!
//! runtime_token (child of the controller token)
//!   ├─► claim token h1
//!   ├─► claim token h2
//!   └─► ...
//! ```
//!
//! ## Rules
//! - The registry lock is never held while a backend runs; spawning is fire-and-forget.
//! - A task that exits on its own clears its entry, but only if the entry is still its own.
//! - Failed advertisers are not retried; a later add intent starts a fresh one.
//! - [`Supervisor::shutdown`] cancels every task and waits for them within `grace`.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use super::{registry::Registry, runner::run_advertiser};
use crate::{
    advertise::{AdvertiserRef, Advertisement},
    error::RuntimeError,
    events::{Bus, Event, EventKind},
    reconcile::{HostHandler, HostSet},
};

/// Owns the host registry and the advertiser tasks.
pub struct Supervisor {
    address: IpAddr,
    advertiser: AdvertiserRef,
    registry: Arc<Registry>,
    bus: Bus,
    runtime_token: CancellationToken,
    tracker: TaskTracker,
    grace: Duration,
}

impl Supervisor {
    /// Creates a supervisor advertising hosts as `address` through `advertiser`.
    ///
    /// Every task it spawns is cancelled when `parent` is.
    pub fn new(
        address: IpAddr,
        advertiser: AdvertiserRef,
        bus: Bus,
        parent: &CancellationToken,
        grace: Duration,
    ) -> Self {
        Self {
            address,
            advertiser,
            registry: Arc::new(Registry::new()),
            bus,
            runtime_token: parent.child_token(),
            tracker: TaskTracker::new(),
            grace,
        }
    }

    /// Address hosts are advertised with.
    pub fn address(&self) -> IpAddr {
        self.address
    }

    /// Starts an advertiser for every host in `hosts` that does not have one.
    ///
    /// Returns as soon as the tasks are spawned.
    pub async fn add_hosts(&self, hosts: &HostSet) {
        for host in hosts {
            let Some(claim) = self.registry.claim(host, &self.runtime_token).await else {
                self.bus
                    .publish(Event::new(EventKind::AlreadyAdvertised).with_host(host.as_str()));
                continue;
            };
            self.bus
                .publish(Event::new(EventKind::AdvertiseStarting).with_host(host.as_str()));

            let advertiser = Arc::clone(&self.advertiser);
            let registry = Arc::clone(&self.registry);
            let bus = self.bus.clone();
            let ad = Advertisement::new(host.clone(), self.address);

            self.tracker.spawn(async move {
                // Terminal event is published by the runner.
                let _ = run_advertiser(advertiser.as_ref(), &ad, claim.token, &bus).await;

                if registry.evict(&ad.host, claim.id).await {
                    bus.publish(Event::new(EventKind::HostEvicted).with_host(ad.host.as_str()));
                }
            });
        }
    }

    /// Cancels and forgets the advertiser of every host in `hosts`.
    ///
    /// Unknown hosts are skipped. Does not wait for the advertisers to exit.
    pub async fn remove_hosts(&self, hosts: &HostSet) {
        for host in hosts {
            let kind = if self.registry.release(host).await {
                EventKind::AdvertiseStopRequested
            } else {
                EventKind::NotAdvertised
            };
            self.bus.publish(Event::new(kind).with_host(host.as_str()));
        }
    }

    /// Sorted snapshot of the hosts with a live advertiser.
    pub async fn advertised(&self) -> Vec<String> {
        self.registry.list().await
    }

    /// Returns true if `host` has a live advertiser.
    pub async fn is_advertised(&self, host: &str) -> bool {
        self.registry.contains(host).await
    }

    /// Cancels every advertiser and waits up to `grace` for all of them to exit.
    ///
    /// Publishes [`EventKind::AllStoppedWithin`] on success, or
    /// [`EventKind::GraceExceeded`] and returns [`RuntimeError::GraceExceeded`]
    /// listing the hosts that are still registered.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.runtime_token.cancel();
        self.tracker.close();

        match tokio::time::timeout(self.grace, self.tracker.wait()).await {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                let stuck = self.registry.list().await;
                self.bus.publish(
                    Event::new(EventKind::GraceExceeded).with_hosts(stuck.iter().cloned()),
                );
                Err(RuntimeError::GraceExceeded {
                    grace: self.grace,
                    stuck,
                })
            }
        }
    }
}

#[async_trait]
impl HostHandler for Supervisor {
    async fn on_hosts_added(&self, hosts: &HostSet) {
        self.add_hosts(hosts).await;
    }

    async fn on_hosts_removed(&self, hosts: &HostSet) {
        self.remove_hosts(hosts).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advertise::AdvertiseFn;
    use crate::error::AdvertiseError;
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ADDR: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7));

    #[derive(Default)]
    struct Counters {
        started: AtomicUsize,
        cancelled: AtomicUsize,
    }

    /// Backend that records starts and cancellations and lingers `linger` after cancel.
    fn counting(counters: Arc<Counters>, linger: Duration) -> AdvertiserRef {
        AdvertiseFn::arc("counting", move |_ad: Advertisement, ctx: CancellationToken| {
            let counters = Arc::clone(&counters);
            async move {
                counters.started.fetch_add(1, Ordering::SeqCst);
                ctx.cancelled().await;
                counters.cancelled.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(linger).await;
                Err::<(), _>(AdvertiseError::Canceled)
            }
        })
    }

    fn supervisor(adv: AdvertiserRef) -> (Supervisor, CancellationToken) {
        let root = CancellationToken::new();
        let sup = Supervisor::new(ADDR, adv, Bus::new(256), &root, Duration::from_secs(2));
        (sup, root)
    }

    fn hosts(names: &[&str]) -> HostSet {
        names.iter().copied().collect()
    }

    /// Kinds published so far, ignoring the runner's terminal events.
    fn drain(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<EventKind> {
        std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| e.kind)
            .filter(|k| !matches!(k, EventKind::AdvertiseStopped | EventKind::AdvertiseFailed))
            .collect()
    }

    async fn eventually(mut check: impl FnMut() -> bool) {
        for _ in 0..400 {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn double_add_runs_one_task() {
        let c = Arc::new(Counters::default());
        let (sup, _root) = supervisor(counting(c.clone(), Duration::ZERO));
        let mut rx = sup.bus.subscribe();

        sup.add_hosts(&hosts(&["a.local"])).await;
        sup.add_hosts(&hosts(&["a.local"])).await;
        eventually(|| c.started.load(Ordering::SeqCst) == 1).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(c.started.load(Ordering::SeqCst), 1);
        assert_eq!(sup.advertised().await, ["a.local"]);
        assert_eq!(
            drain(&mut rx),
            [EventKind::AdvertiseStarting, EventKind::AlreadyAdvertised]
        );
    }

    #[tokio::test]
    async fn remove_cancels_and_is_idempotent() {
        let c = Arc::new(Counters::default());
        let (sup, _root) = supervisor(counting(c.clone(), Duration::ZERO));

        sup.add_hosts(&hosts(&["a.local", "b.local"])).await;
        eventually(|| c.started.load(Ordering::SeqCst) == 2).await;

        let mut rx = sup.bus.subscribe();
        sup.remove_hosts(&hosts(&["a.local"])).await;
        sup.remove_hosts(&hosts(&["a.local"])).await;

        eventually(|| c.cancelled.load(Ordering::SeqCst) == 1).await;
        assert_eq!(sup.advertised().await, ["b.local"]);
        assert_eq!(
            drain(&mut rx),
            [EventKind::AdvertiseStopRequested, EventKind::NotAdvertised]
        );
    }

    #[tokio::test]
    async fn crashed_advertiser_is_evicted_and_can_be_re_added() {
        let runs = Arc::new(AtomicUsize::new(0));
        let r = runs.clone();
        let adv = AdvertiseFn::arc("crashy", move |_ad: Advertisement, _ctx: CancellationToken| {
            let r = r.clone();
            async move {
                r.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(AdvertiseError::Exited { code: Some(1) })
            }
        });
        let (sup, _root) = supervisor(adv);

        sup.add_hosts(&hosts(&["a.local"])).await;
        eventually(|| runs.load(Ordering::SeqCst) == 1).await;
        for _ in 0..400 {
            if !sup.is_advertised("a.local").await {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(!sup.is_advertised("a.local").await);

        sup.add_hosts(&hosts(&["a.local"])).await;
        eventually(|| runs.load(Ordering::SeqCst) == 2).await;
    }

    #[tokio::test]
    async fn backend_returning_ok_on_its_own_is_evicted() {
        let runs = Arc::new(AtomicUsize::new(0));
        let r = runs.clone();
        let adv = AdvertiseFn::arc("oneshot", move |_ad: Advertisement, _ctx: CancellationToken| {
            let r = r.clone();
            async move {
                r.fetch_add(1, Ordering::SeqCst);
                Ok::<(), AdvertiseError>(())
            }
        });
        let (sup, _root) = supervisor(adv);
        let mut rx = sup.bus.subscribe();

        sup.add_hosts(&hosts(&["a.local"])).await;
        eventually(|| runs.load(Ordering::SeqCst) == 1).await;
        for _ in 0..400 {
            if !sup.is_advertised("a.local").await {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(sup.advertised().await.is_empty());

        let kinds: Vec<EventKind> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| e.kind)
            .collect();
        assert_eq!(
            kinds,
            [
                EventKind::AdvertiseStarting,
                EventKind::AdvertiseStopped,
                EventKind::HostEvicted
            ]
        );

        sup.add_hosts(&hosts(&["a.local"])).await;
        eventually(|| runs.load(Ordering::SeqCst) == 2).await;
    }

    #[tokio::test]
    async fn stale_exit_does_not_evict_replacement() {
        let c = Arc::new(Counters::default());
        let (sup, _root) = supervisor(counting(c.clone(), Duration::from_millis(100)));

        sup.add_hosts(&hosts(&["a.local"])).await;
        eventually(|| c.started.load(Ordering::SeqCst) == 1).await;

        // Old task lingers after cancellation while the replacement starts.
        sup.remove_hosts(&hosts(&["a.local"])).await;
        sup.add_hosts(&hosts(&["a.local"])).await;
        eventually(|| c.started.load(Ordering::SeqCst) == 2).await;

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(sup.advertised().await, ["a.local"]);
    }

    #[tokio::test]
    async fn parent_cancel_reaches_all_and_shutdown_drains() {
        let c = Arc::new(Counters::default());
        let (sup, root) = supervisor(counting(c.clone(), Duration::ZERO));

        sup.add_hosts(&hosts(&["a.local", "b.local", "c.local"])).await;
        eventually(|| c.started.load(Ordering::SeqCst) == 3).await;

        root.cancel();
        assert!(sup.shutdown().await.is_ok());
        assert_eq!(c.cancelled.load(Ordering::SeqCst), 3);
        assert!(sup.advertised().await.is_empty());
    }

    #[tokio::test]
    async fn shutdown_reports_stuck_hosts() {
        let adv = AdvertiseFn::arc("stubborn", |_ad: Advertisement, _ctx: CancellationToken| async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok::<(), AdvertiseError>(())
        });
        let root = CancellationToken::new();
        let sup = Supervisor::new(ADDR, adv, Bus::new(64), &root, Duration::from_millis(50));

        sup.add_hosts(&hosts(&["stuck.local"])).await;
        match sup.shutdown().await {
            Err(RuntimeError::GraceExceeded { stuck, .. }) => assert_eq!(stuck, ["stuck.local"]),
            other => panic!("unexpected {other:?}"),
        }
    }
}
