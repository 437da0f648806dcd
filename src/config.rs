//! # Controller configuration.
//!
//! [`Config`] gathers the settings of one [`Controller`](crate::Controller):
//! what to advertise hosts as, which annotation opts a declaration in, and the
//! time budgets of startup and shutdown.
//!
//! ## Sentinel values
//! - `bus_capacity = 0` and `queue_capacity = 0` are clamped to 1.
//!
//! # Example
//! ```
//! use std::net::{IpAddr, Ipv4Addr};
//! use std::time::Duration;
//! use mdnsvisor::Config;
//!
//! let mut cfg = Config::default();
//! cfg.address = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20));
//! cfg.grace = Duration::from_secs(3);
//!
//! assert_eq!(cfg.annotation, "mdnscontroller/enabled");
//! ```

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use crate::reconcile::ENABLED_ANNOTATION;

/// Settings of the controller runtime.
#[derive(Clone, Debug)]
pub struct Config {
    /// Address every host is advertised with.
    pub address: IpAddr,

    /// Annotation key that must be exactly `"true"` for a declaration to be advertised.
    pub annotation: String,

    /// Maximum time to wait for advertisers to stop after shutdown starts.
    ///
    /// Exceeding it yields `RuntimeError::GraceExceeded` with the stuck hosts.
    pub grace: Duration,

    /// Maximum time to wait for the watch adapter's initial sync.
    pub sync_timeout: Duration,

    /// Capacity of the event bus ring buffer.
    ///
    /// Subscribers lagging further behind skip older events.
    pub bus_capacity: usize,

    /// Capacity of the notification channel between the adapter and the reconciler.
    ///
    /// A full channel makes the adapter wait; notifications are never dropped.
    pub queue_capacity: usize,
}

impl Config {
    /// Bus capacity, at least 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Notification channel capacity, at least 1.
    #[inline]
    pub fn queue_capacity_clamped(&self) -> usize {
        self.queue_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `address = 127.0.0.1`
    /// - `annotation = "mdnscontroller/enabled"`
    /// - `grace = 10s`
    /// - `sync_timeout = 60s`
    /// - `bus_capacity = 1024`
    /// - `queue_capacity = 256`
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            annotation: ENABLED_ANNOTATION.to_owned(),
            grace: Duration::from_secs(10),
            sync_timeout: Duration::from_secs(60),
            bus_capacity: 1024,
            queue_capacity: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacities_are_clamped() {
        let cfg = Config {
            bus_capacity: 0,
            queue_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(cfg.queue_capacity_clamped(), 1);
        assert_eq!(Config::default().queue_capacity_clamped(), 256);
    }
}
