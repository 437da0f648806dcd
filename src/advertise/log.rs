//! # Dry-run advertiser.
//!
//! [`LogAdvertiser`] only logs what it would advertise and then holds the host
//! until cancelled. Useful to watch the reconciler work on machines without an
//! mDNS responder.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::advertiser::{Advertise, Advertisement};
use crate::error::AdvertiseError;

/// Advertiser that logs instead of publishing.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogAdvertiser;

#[async_trait]
impl Advertise for LogAdvertiser {
    fn name(&self) -> &str {
        "log"
    }

    async fn advertise(
        &self,
        ad: &Advertisement,
        ctx: CancellationToken,
    ) -> Result<(), AdvertiseError> {
        info!(host = %ad.host, address = %ad.address, "would advertise host");
        ctx.cancelled().await;
        info!(host = %ad.host, "would stop advertising host");
        Err(AdvertiseError::Canceled)
    }
}
