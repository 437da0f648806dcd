//! Runtime core: host lifecycle and process wiring.
//!
//! - [`registry`]: host → live advertiser map with generation ids;
//! - [`runner`]: runs one advertiser and publishes its terminal event;
//! - [`supervisor`]: turns intents into advertiser tasks;
//! - [`controller`] / [`builder`]: wire adapter, reconciler and supervisor, own shutdown;
//! - [`shutdown`]: OS termination signals.

mod builder;
mod controller;
mod registry;
mod runner;
mod shutdown;
mod supervisor;

pub use builder::ControllerBuilder;
pub use controller::Controller;
pub use runner::run_advertiser;
pub use supervisor::Supervisor;
