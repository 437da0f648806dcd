//! What the controller reports about itself: [`Event`] / [`EventKind`] and the
//! [`Bus`] they travel on.
//!
//! - **Publishers**: watch adapters, `Reconciler`, `Supervisor`, the per-host
//!   advertiser runner, `Controller`, `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the `Controller` subscriber listener, which fans out to the
//!   `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
