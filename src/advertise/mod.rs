//! # Advertisement backends.
//!
//! - [`Advertise`] trait for implementing cancelable backends
//! - [`AdvertiseFn`] closure-backed implementation
//! - [`AdvertiserRef`] shared reference (`Arc<dyn Advertise>`)
//! - [`CommandAdvertiser`] one child process per host (`avahi-publish`, `dns-sd`, ...)
//! - [`LogAdvertiser`] dry-run backend

mod advertise_fn;
mod advertiser;
mod command;
mod log;

pub use advertise_fn::AdvertiseFn;
pub use advertiser::{Advertise, AdvertiserRef, Advertisement};
pub use command::{ADDRESS_PLACEHOLDER, CommandAdvertiser, HOST_PLACEHOLDER};
pub use log::LogAdvertiser;
