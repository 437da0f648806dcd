//! Reconciliation engine: declarations → host intents.
//!
//! ## Contents
//! - [`Declaration`], [`extract`] read the enabled flag and hosts of a declaration
//! - [`HostSet`], [`diff`] membership-based host comparison
//! - [`Intent`], [`HostHandler`] the seam towards the supervisor
//! - [`Reconciler`] the single-worker state machine over notifications
//!
//! ```text
//! Notification ──► Reconciler::plan ──► [HostsRemoved?, HostsAdded?] ──► HostHandler
//!                    (extract + diff)
//! ```

mod declaration;
mod handler;
mod hosts;
mod reconciler;

pub use declaration::{
    DECLARATION_KIND, Declaration, DeclarationSpec, ENABLED_ANNOTATION, Extracted, ObjectMeta,
    Rule, extract,
};
pub use handler::{HostHandler, Intent};
pub use hosts::{HostDiff, HostSet, diff};
pub use reconciler::{Dropped, Plan, Reconciler, transition};
