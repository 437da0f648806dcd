//! Retry timing for watch adapters.
//!
//! A source listing that fails (e.g. the API server is unreachable) is retried
//! after a delay computed by [`BackoffPolicy`]; [`JitterPolicy`] spreads
//! retries of several controllers sharing one API server.
//!
//! ## Defaults
//! - `BackoffPolicy::default()` → first=500ms, factor=2.0, max=30s, jitter=Equal.

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
