//! # LogWriter: structured event logger
//!
//! A subscriber that renders every [`Event`] as a `tracing` record, so the
//! runtime's observability ends up wherever the installed `tracing` subscriber
//! sends it (plain text or JSON in the `mdnsvisor` binary).
//!
//! ## Levels
//! - `info`: intents, advertiser lifecycle, sync, shutdown
//! - `debug`: idempotent no-ops (already advertised / not advertised)
//! - `warn`: dropped notifications, skipped objects, backend and watch failures
//! - `error`: grace exceeded, subscriber panics

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Debug, Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let host = e.host.as_deref().unwrap_or("");
        let declaration = e.declaration.as_deref().unwrap_or("");
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            EventKind::HostsAdded => {
                info!(seq = e.seq, declaration, hosts = ?e.hosts(), "registering hosts");
            }
            EventKind::HostsRemoved => {
                info!(seq = e.seq, declaration, hosts = ?e.hosts(), "unregistering hosts");
            }
            EventKind::NotificationDropped => {
                warn!(seq = e.seq, reason, "dropped malformed notification");
            }
            EventKind::AdvertiseStarting => {
                info!(seq = e.seq, host, "starting advertiser");
            }
            EventKind::AlreadyAdvertised => {
                debug!(seq = e.seq, host, "host already advertised, skipping");
            }
            EventKind::AdvertiseStopRequested => {
                info!(seq = e.seq, host, "stopping advertiser");
            }
            EventKind::NotAdvertised => {
                debug!(seq = e.seq, host, "host not advertised, nothing to stop");
            }
            EventKind::AdvertiseStopped => {
                info!(seq = e.seq, host, "advertiser stopped");
            }
            EventKind::AdvertiseFailed => {
                warn!(seq = e.seq, host, reason, "advertiser failed");
            }
            EventKind::HostEvicted => {
                debug!(seq = e.seq, host, "cleared registry entry of exited advertiser");
            }
            EventKind::WatchSynced => {
                info!(seq = e.seq, "controller synced and ready");
            }
            EventKind::WatchFailed => {
                warn!(seq = e.seq, attempt = e.attempt, reason, "listing declarations failed");
            }
            EventKind::BackoffScheduled => {
                debug!(seq = e.seq, attempt = e.attempt, delay_ms = e.delay_ms, "retry scheduled");
            }
            EventKind::ObjectSkipped => {
                warn!(seq = e.seq, reason, "skipped object");
            }
            EventKind::ShutdownRequested => {
                info!(seq = e.seq, "shutting down controller");
            }
            EventKind::AllStoppedWithin => {
                info!(seq = e.seq, "all advertisers stopped within grace");
            }
            EventKind::GraceExceeded => {
                error!(seq = e.seq, stuck = ?e.hosts(), "grace exceeded");
            }
            EventKind::SubscriberOverflow => {
                warn!(seq = e.seq, reason, "subscriber dropped an event");
            }
            EventKind::SubscriberPanicked => {
                error!(seq = e.seq, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
