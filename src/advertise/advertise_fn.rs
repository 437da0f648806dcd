//! # Function-backed advertiser (`AdvertiseFn`)
//!
//! [`AdvertiseFn`] wraps a closure `F: Fn(Advertisement, CancellationToken) -> Fut`,
//! producing a fresh future per advertised host. Shared state, if needed, goes
//! into an `Arc` captured by the closure.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use mdnsvisor::{AdvertiseError, AdvertiseFn, AdvertiserRef, Advertisement};
//!
//! let adv: AdvertiserRef = AdvertiseFn::arc("sleepy", |_ad: Advertisement, ctx: CancellationToken| async move {
//!     ctx.cancelled().await;
//!     Ok::<_, AdvertiseError>(())
//! });
//!
//! assert_eq!(adv.name(), "sleepy");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::advertiser::{Advertise, Advertisement};
use crate::error::AdvertiseError;

/// Function-backed advertiser implementation.
#[derive(Debug)]
pub struct AdvertiseFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> AdvertiseFn<F> {
    /// Creates a new function-backed advertiser.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the advertiser and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Advertise for AdvertiseFn<F>
where
    F: Fn(Advertisement, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), AdvertiseError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn advertise(
        &self,
        ad: &Advertisement,
        ctx: CancellationToken,
    ) -> Result<(), AdvertiseError> {
        (self.f)(ad.clone(), ctx).await
    }
}
