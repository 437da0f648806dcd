//! # Controller builder.
//!
//! ```text
//! ControllerBuilder::new(cfg)
//!     .with_advertiser(backend)        default: CommandAdvertiser::platform_default()
//!     .with_subscribers(subs)          default: none
//!     .with_parent_token(token)        default: fresh root
//!     .without_signal_handlers()       default: SIGINT/SIGTERM/SIGQUIT stop the run
//!     .build()
//! ```

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{controller::Controller, supervisor::Supervisor};
use crate::{
    advertise::{AdvertiserRef, CommandAdvertiser},
    config::Config,
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for a [`Controller`].
pub struct ControllerBuilder {
    cfg: Config,
    advertiser: Option<AdvertiserRef>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    parent: Option<CancellationToken>,
    handle_signals: bool,
}

impl ControllerBuilder {
    /// Creates a builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            advertiser: None,
            subscribers: Vec::new(),
            parent: None,
            handle_signals: true,
        }
    }

    /// Sets the advertisement backend used for every host.
    pub fn with_advertiser(mut self, advertiser: AdvertiserRef) -> Self {
        self.advertiser = Some(advertiser);
        self
    }

    /// Sets event subscribers.
    ///
    /// Each subscriber gets its own worker and bounded queue.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Ties the controller's lifetime to `parent`: cancelling it stops the run.
    pub fn with_parent_token(mut self, parent: CancellationToken) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Ignores OS termination signals; only [`Controller::cancel`] or the parent token stop the run.
    pub fn without_signal_handlers(mut self) -> Self {
        self.handle_signals = false;
        self
    }

    /// Builds the controller.
    ///
    /// Must be called within a tokio runtime (subscriber workers are spawned here).
    pub fn build(self) -> Controller {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = SubscriberSet::new(self.subscribers, bus.clone());
        let token = match &self.parent {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };

        let advertiser: AdvertiserRef = match self.advertiser {
            Some(advertiser) => advertiser,
            None => Arc::new(CommandAdvertiser::platform_default()),
        };
        let supervisor = Arc::new(Supervisor::new(
            self.cfg.address,
            advertiser,
            bus.clone(),
            &token,
            self.cfg.grace,
        ));

        Controller::new_internal(self.cfg, bus, subs, supervisor, token, self.handle_signals)
    }
}
