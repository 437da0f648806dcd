//! # Intents and the host handler seam.
//!
//! The reconciler never touches advertisers directly. It emits [`Intent`]s and
//! hands them to a [`HostHandler`]; the [`Supervisor`](crate::Supervisor) is the
//! production implementor, tests and alternative backends can plug in their own.

use async_trait::async_trait;

use super::hosts::HostSet;

/// Receiver of normalized host intents.
///
/// Calls arrive one at a time from the reconciler worker, in the order the
/// intents were derived. Implementations must not block on advertisement
/// actually coming online.
#[async_trait]
pub trait HostHandler: Send + Sync + 'static {
    /// Hosts that should start being advertised.
    async fn on_hosts_added(&self, hosts: &HostSet);

    /// Hosts that should stop being advertised.
    async fn on_hosts_removed(&self, hosts: &HostSet);
}

/// Normalized instruction derived from one declaration transition.
///
/// Never constructed with an empty host set by the reconciler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    /// Start advertising these hosts.
    HostsAdded(HostSet),
    /// Stop advertising these hosts.
    HostsRemoved(HostSet),
}

impl Intent {
    /// Hosts named by the intent.
    pub fn hosts(&self) -> &HostSet {
        match self {
            Intent::HostsAdded(h) | Intent::HostsRemoved(h) => h,
        }
    }

    /// Delivers the intent to `handler`.
    pub async fn apply(&self, handler: &dyn HostHandler) {
        match self {
            Intent::HostsAdded(hosts) => handler.on_hosts_added(hosts).await,
            Intent::HostsRemoved(hosts) => handler.on_hosts_removed(hosts).await,
        }
    }
}
