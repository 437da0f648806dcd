//! # Watch adapter seam.
//!
//! A [`WatchAdapter`] observes the external store and reports changes through
//! [`Hooks`]. It marks its [`ReadySignal`] once the initial view is complete and
//! runs until `token` is cancelled.
//!
//! Returning an error is fatal to the controller: before readiness it is a
//! sync failure, afterwards the reconciler can no longer trust its view.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{hooks::Hooks, ready::ReadySignal};
use crate::error::WatchError;

/// Source of declaration notifications.
#[async_trait]
pub trait WatchAdapter: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Delivers notifications until cancelled.
    ///
    /// Returning `Ok(())` before `token` is cancelled is treated like an error.
    async fn run(
        &self,
        hooks: Hooks,
        ready: ReadySignal,
        token: CancellationToken,
    ) -> Result<(), WatchError>;
}
