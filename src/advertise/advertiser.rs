//! # Advertisement backend abstraction.
//!
//! This module defines the [`Advertise`] trait (async, cancelable) and the common
//! handle type [`AdvertiserRef`], an `Arc<dyn Advertise>` shared by every per-host
//! task of the supervisor.
//!
//! An advertiser receives a [`CancellationToken`] and must keep the host
//! discoverable until the token is cancelled, then tear down promptly.

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::AdvertiseError;

/// What to advertise: a host name resolving to an address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Advertisement {
    /// Host name (e.g. `printer.local`).
    pub host: String,
    /// Address the host name should resolve to.
    pub address: IpAddr,
}

impl Advertisement {
    /// Creates a new advertisement.
    pub fn new(host: impl Into<String>, address: IpAddr) -> Self {
        Self {
            host: host.into(),
            address,
        }
    }
}

/// # Asynchronous, cancelable advertisement backend.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use mdnsvisor::{Advertise, AdvertiseError, Advertisement};
///
/// struct Quiet;
///
/// #[async_trait]
/// impl Advertise for Quiet {
///     fn name(&self) -> &str { "quiet" }
///
///     async fn advertise(&self, _ad: &Advertisement, ctx: CancellationToken) -> Result<(), AdvertiseError> {
///         ctx.cancelled().await;
///         Err(AdvertiseError::Canceled)
///     }
/// }
/// ```
#[async_trait]
pub trait Advertise: Send + Sync + 'static {
    /// Returns a stable, human-readable backend name.
    fn name(&self) -> &str;

    /// Advertises `ad` until `ctx` is cancelled or the backend fails.
    ///
    /// Returning `Err(AdvertiseError::Canceled)` or `Ok(())` after cancellation
    /// is a graceful stop; anything else is reported as a failure.
    async fn advertise(&self, ad: &Advertisement, ctx: CancellationToken)
    -> Result<(), AdvertiseError>;
}

/// Shared handle to an advertisement backend.
pub type AdvertiserRef = Arc<dyn Advertise>;
