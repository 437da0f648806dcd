//! # Event subscribers for the mdnsvisor runtime.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! and the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Supervisor ── publish(Event) ──► Bus ──► Controller listener ──► SubscriberSet::emit
//!                                                                       │
//!                                                              ┌────────┼────────┐
//!                                                              ▼        ▼        ▼
//!                                                          LogWriter  Metrics  Custom
//! ```

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub(crate) use set::panic_message;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
