//! # mdnsvisor
//!
//! **mdnsvisor** keeps locally advertised host names in sync with annotated
//! ingress declarations. It watches a declaration store, turns every
//! create/update/delete into the minimal set of "hosts added" / "hosts removed"
//! intents, and supervises exactly one advertiser (e.g. an `avahi-publish`
//! child process) per advertised host.
//!
//! ## Architecture
//! ```text
//!   ┌──────────────────────┐
//!   │ WatchAdapter         │  PollingWatch<KubectlSource | FileSource | ...>
//!   │  on_add/update/delete│
//!   └──────────┬───────────┘
//!              │ Notification (single ordered mpsc channel)
//!              ▼
//!   ┌──────────────────────┐
//!   │ Reconciler           │  extract(enabled, hosts) + diff → [HostsRemoved, HostsAdded]
//!   └──────────┬───────────┘
//!              │ HostHandler::on_hosts_removed / on_hosts_added
//!              ▼
//!   ┌──────────────────────┐
//!   │ Supervisor           │  Registry: host → {generation id, cancel token}
//!   └───┬──────┬──────┬────┘
//!       ▼      ▼      ▼
//!   advertiser per host (Advertise backend), child tokens of one root token
//!
//!   every component ── Event ──► Bus ──► SubscriberSet ──► LogWriter, custom subscribers
//! ```
//!
//! ## Lifecycle
//! ```text
//! Controller::run(adapter)
//!   ├─ wait for the adapter's initial sync (bounded by Config::sync_timeout)
//!   ├─ reconcile until SIGINT/SIGTERM/SIGQUIT, Controller::cancel() or adapter failure
//!   └─ cancel root token → every advertiser is cancelled → drain within Config::grace
//! ```
//!
//! ## Features
//! | Area              | Description                                               | Key types / traits                         |
//! |-------------------|-----------------------------------------------------------|--------------------------------------------|
//! | **Reconciliation**| Declaration transitions into host intents.                | [`Reconciler`], [`transition`], [`diff`]   |
//! | **Supervision**   | One advertiser per host, safe under concurrent intents.   | [`Supervisor`], [`HostHandler`]            |
//! | **Backends**      | How a host gets advertised.                               | [`Advertise`], [`CommandAdvertiser`]       |
//! | **Watching**      | Where declarations come from.                             | [`WatchAdapter`], [`PollingWatch`]         |
//! | **Subscriber API**| Hook into runtime events.                                 | [`Subscribe`], [`LogWriter`]               |
//! | **Errors**        | Typed errors with stable labels.                          | [`RuntimeError`], [`AdvertiseError`]       |
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use mdnsvisor::{Config, Controller, KubectlSource, LogWriter, PollingWatch, Subscribe};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
//!     let controller = Controller::builder(Config::default())
//!         .with_subscribers(subs)
//!         .build();
//!
//!     let adapter = PollingWatch::new(KubectlSource::new(), controller.bus().clone());
//!     controller.run(adapter).await?;
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod net;

pub mod advertise;
pub mod events;
pub mod policies;
pub mod reconcile;
pub mod subscribers;
pub mod watch;

// ---- Public re-exports ----

pub use advertise::{
    Advertise, AdvertiseFn, AdvertiserRef, Advertisement, CommandAdvertiser, LogAdvertiser,
};
pub use config::Config;
pub use crate::core::{Controller, ControllerBuilder, Supervisor, run_advertiser};
pub use error::{AdvertiseError, RuntimeError, WatchError};
pub use events::{Bus, Event, EventKind};
pub use net::local_ipv4;
pub use policies::{BackoffPolicy, JitterPolicy};
pub use reconcile::{
    Declaration, ENABLED_ANNOTATION, Extracted, HostDiff, HostHandler, HostSet, Intent,
    Reconciler, diff, extract, transition,
};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use watch::{
    FileSource, Hooks, KubectlSource, Notification, Object, PollConfig, PollingWatch,
    SnapshotSource, WatchAdapter,
};
