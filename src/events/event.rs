//! # Runtime events emitted by the watch adapter, reconciler and supervisor.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Reconciler events**: intents derived from declaration notifications
//! - **Supervisor events**: per-host advertiser lifecycle
//! - **Watch events**: adapter sync, listing failures, retry scheduling
//! - **Runtime events**: shutdown and subscriber health
//!
//! The [`Event`] struct carries additional metadata such as timestamps, host name,
//! the declaration the event relates to, and backoff delays.
//!
//! `seq` is process-wide and strictly increasing; sort by it when events from
//! several lanes end up in one place.
//!
//! ## Example
//! ```rust
//! use mdnsvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::AdvertiseFailed)
//!     .with_host("printer.local")
//!     .with_reason("exited with 1");
//!
//! assert_eq!(ev.kind, EventKind::AdvertiseFailed);
//! assert_eq!(ev.host.as_deref(), Some("printer.local"));
//! assert_eq!(ev.reason.as_deref(), Some("exited with 1"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `reason`: subscriber name and panic message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `reason`: subscriber name and drop reason ("full", "closed")
    SubscriberOverflow,

    // === Shutdown events ===
    /// Shutdown requested (OS signal or explicit cancel).
    ShutdownRequested,

    /// All advertisers stopped within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some advertisers did not stop in time.
    ///
    /// Sets:
    /// - `hosts`: hosts still registered when the grace period ran out
    GraceExceeded,

    // === Watch events ===
    /// The watch adapter delivered its initial view; reconciliation is live.
    WatchSynced,

    /// Listing declarations failed.
    ///
    /// Sets:
    /// - `attempt`: consecutive failure count (1-based)
    /// - `reason`: error message
    WatchFailed,

    /// Next listing attempt scheduled after a failure.
    ///
    /// Sets:
    /// - `attempt`: consecutive failure count
    /// - `delay_ms`: delay before the next attempt
    BackoffScheduled,

    /// A listed object could not be read as a declaration and was skipped.
    ///
    /// Sets:
    /// - `reason`: why it was skipped
    ObjectSkipped,

    // === Reconciler events ===
    /// A notification payload was not a declaration and was dropped.
    ///
    /// Sets:
    /// - `reason`: which hook and what was received
    NotificationDropped,

    /// Reconciler emitted a `HostsAdded` intent.
    ///
    /// Sets:
    /// - `declaration`: key of the declaration that caused it
    /// - `hosts`: hosts in the intent
    HostsAdded,

    /// Reconciler emitted a `HostsRemoved` intent.
    ///
    /// Sets:
    /// - `declaration`: key of the declaration that caused it
    /// - `hosts`: hosts in the intent
    HostsRemoved,

    // === Supervisor events ===
    /// An advertiser was registered and is starting.
    ///
    /// Sets:
    /// - `host`: host name
    AdvertiseStarting,

    /// Add requested for a host that already has a live advertiser.
    ///
    /// Sets:
    /// - `host`: host name
    AlreadyAdvertised,

    /// A host's advertiser was cancelled and removed from the registry.
    ///
    /// Sets:
    /// - `host`: host name
    AdvertiseStopRequested,

    /// Remove requested for a host with no live advertiser.
    ///
    /// Sets:
    /// - `host`: host name
    NotAdvertised,

    /// An advertiser finished (cancelled or returned cleanly).
    ///
    /// Sets:
    /// - `host`: host name
    AdvertiseStopped,

    /// An advertiser exited with an error.
    ///
    /// Sets:
    /// - `host`: host name
    /// - `reason`: error message
    AdvertiseFailed,

    /// An exited advertiser removed its own registry entry.
    ///
    /// Sets:
    /// - `host`: host name
    HostEvicted,
}

/// One thing that happened, plus whichever details its [`EventKind`] documents.
#[derive(Clone, Debug)]
pub struct Event {
    pub seq: u64,
    pub at: SystemTime,
    pub kind: EventKind,

    /// Host name, if the event concerns a single host.
    pub host: Option<Arc<str>>,
    /// Declaration key (`namespace/name`), if applicable.
    pub declaration: Option<Arc<str>>,
    /// Host names carried by an intent.
    pub hosts: Option<Arc<[String]>>,
    /// Human-readable reason (errors, drop details, etc.).
    pub reason: Option<Arc<str>>,
    /// Failed listings in a row, starting at 1.
    pub attempt: Option<u32>,
    /// Wait before the next listing, in milliseconds.
    pub delay_ms: Option<u32>,
}

impl Event {
    /// Stamps a new event with the next `seq` and the current time.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            host: None,
            declaration: None,
            hosts: None,
            reason: None,
            attempt: None,
            delay_ms: None,
        }
    }

    /// Attaches a host name.
    #[inline]
    pub fn with_host(mut self, host: impl Into<Arc<str>>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Attaches a declaration key.
    #[inline]
    pub fn with_declaration(mut self, key: impl Into<Arc<str>>) -> Self {
        self.declaration = Some(key.into());
        self
    }

    /// Attaches a list of hosts.
    #[inline]
    pub fn with_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hosts = Some(hosts.into_iter().map(Into::into).collect());
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Records `d` in milliseconds, saturating at `u32::MAX`.
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(u32::try_from(d.as_millis()).unwrap_or(u32::MAX));
        self
    }

    /// `SubscriberOverflow` naming the lane and why it refused the event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} info={info}"))
    }

    /// Returns the attached hosts, or an empty slice.
    pub fn hosts(&self) -> &[String] {
        self.hosts.as_deref().unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::new(EventKind::WatchSynced);
        let b = Event::new(EventKind::WatchSynced);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn delay_is_saturated_to_u32_millis() {
        let ev = Event::new(EventKind::BackoffScheduled).with_delay(Duration::from_secs(u64::MAX));
        assert_eq!(ev.delay_ms, Some(u32::MAX));
    }

    #[test]
    fn hosts_default_to_empty() {
        let ev = Event::new(EventKind::HostsAdded);
        assert!(ev.hosts().is_empty());

        let ev = ev.with_hosts(["a.local", "b.local"]);
        assert_eq!(ev.hosts(), ["a.local".to_string(), "b.local".to_string()]);
    }
}
