//! # Run one host's advertiser to completion.
//!
//! Executes [`Advertise::advertise`] for a single host and publishes the terminal
//! lifecycle event on the [`Bus`].
//!
//! ## Event flow
//! ```text
//! token already cancelled → (nothing published)      → Err(Canceled)
//! advertise() → Ok / Err(Canceled)                   → AdvertiseStopped
//! advertise() → Err(Spawn/Exited/Fail)               → AdvertiseFailed
//! advertise() panics                                 → AdvertiseFailed (Panicked)
//! ```
//!
//! ## Rules
//! - Publishes **at most one** terminal event
//! - A panic inside the backend is contained and reported as [`AdvertiseError::Panicked`]

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::{
    advertise::{Advertise, Advertisement},
    error::AdvertiseError,
    events::{Bus, Event, EventKind},
    subscribers::panic_message,
};

/// Runs `advertiser` for `ad` until `token` is cancelled or the backend exits.
pub async fn run_advertiser<A: Advertise + ?Sized>(
    advertiser: &A,
    ad: &Advertisement,
    token: CancellationToken,
    bus: &Bus,
) -> Result<(), AdvertiseError> {
    // Removed between registration and start: never bring it up.
    if token.is_cancelled() {
        return Err(AdvertiseError::Canceled);
    }

    let fut = advertiser.advertise(ad, token);
    let res = match std::panic::AssertUnwindSafe(fut).catch_unwind().await {
        Ok(res) => res,
        Err(panic) => Err(AdvertiseError::Panicked {
            info: panic_message(panic.as_ref()),
        }),
    };

    match res {
        Ok(()) | Err(AdvertiseError::Canceled) => {
            bus.publish(Event::new(EventKind::AdvertiseStopped).with_host(ad.host.as_str()));
            res
        }
        Err(e) => {
            bus.publish(
                Event::new(EventKind::AdvertiseFailed)
                    .with_host(ad.host.as_str())
                    .with_reason(e.to_string()),
            );
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advertise::AdvertiseFn;
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::Arc;
    use tokio::sync::Notify;

    fn ad() -> Advertisement {
        Advertisement::new("a.local", IpAddr::V4(Ipv4Addr::LOCALHOST))
    }

    #[tokio::test]
    async fn pre_cancelled_token_skips_backend() {
        let adv = AdvertiseFn::new("never", |_ad: Advertisement, _ctx: CancellationToken| async {
            if true {
                panic!("must not run");
            }
            Ok::<(), AdvertiseError>(())
        });
        let bus = Bus::new(8);
        let token = CancellationToken::new();
        token.cancel();

        let res = run_advertiser(&adv, &ad(), token, &bus).await;
        assert!(matches!(res, Err(AdvertiseError::Canceled)));
    }

    #[tokio::test]
    async fn failure_is_published() {
        let adv = AdvertiseFn::new("fails", |_ad: Advertisement, _ctx: CancellationToken| async {
            Err::<(), _>(AdvertiseError::Fail {
                error: "no responder".into(),
            })
        });
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();

        let res = run_advertiser(&adv, &ad(), CancellationToken::new(), &bus).await;
        assert!(matches!(res, Err(AdvertiseError::Fail { .. })));

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::AdvertiseFailed);
        assert_eq!(ev.host.as_deref(), Some("a.local"));
        assert!(ev.reason.as_deref().unwrap().contains("no responder"));
    }

    #[tokio::test]
    async fn panic_is_contained() {
        let adv = AdvertiseFn::new("panics", |_ad: Advertisement, _ctx: CancellationToken| async {
            if true {
                panic!("backend exploded");
            }
            Ok::<(), AdvertiseError>(())
        });
        let bus = Bus::new(8);

        let res = run_advertiser(&adv, &ad(), CancellationToken::new(), &bus).await;
        match res {
            Err(AdvertiseError::Panicked { info }) => assert_eq!(info, "backend exploded"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancellation_is_a_graceful_stop() {
        let started = Arc::new(Notify::new());
        let signal = started.clone();
        let adv = AdvertiseFn::new("waits", move |_ad: Advertisement, ctx: CancellationToken| {
            let signal = signal.clone();
            async move {
                signal.notify_one();
                ctx.cancelled().await;
                Err::<(), _>(AdvertiseError::Canceled)
            }
        });
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let token = CancellationToken::new();
        let t = token.clone();

        let run = tokio::spawn(async move { run_advertiser(&adv, &ad(), t, &bus).await });
        started.notified().await;
        token.cancel();
        assert!(matches!(run.await.unwrap(), Err(AdvertiseError::Canceled)));

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::AdvertiseStopped);
    }
}
