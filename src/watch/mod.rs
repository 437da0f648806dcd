//! # Watching the declaration store.
//!
//! Everything between the external store and the reconciler:
//! - [`Notification`] / [`Object`] / [`Tombstone`]: what crosses the boundary
//! - [`Hooks`]: `on_add` / `on_update` / `on_delete` into one ordered channel
//! - [`ReadySignal`] / [`Readiness`]: the initial-sync barrier
//! - [`WatchAdapter`]: the seam a store integration implements
//! - [`PollingWatch`] + [`Store`]: list-and-diff adapter over a [`SnapshotSource`]
//! - [`KubectlSource`], [`FileSource`]: built-in sources
//!
//! ```text
//! SnapshotSource ──list──► PollingWatch ──Store diff──► Hooks ──mpsc──► Reconciler
//!                               └── ReadySignal (first listing) ──► Controller
//! ```

mod adapter;
mod file;
mod hooks;
mod kubectl;
mod notification;
mod poll;
mod ready;
mod source;
mod store;

pub use adapter::WatchAdapter;
pub use file::FileSource;
pub use hooks::Hooks;
pub use kubectl::KubectlSource;
pub use notification::{Notification, Object, Tombstone};
pub use poll::{PollConfig, PollingWatch};
pub use ready::{ReadySignal, Readiness, readiness};
pub use source::{SnapshotSource, decode_list};
pub use store::Store;
