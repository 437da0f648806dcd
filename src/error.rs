//! Error types used by the mdnsvisor runtime, watch adapters and advertisers.
//!
//! This module defines three error enums:
//!
//! - [`RuntimeError`]: failures that reach the process boundary (fatal).
//! - [`WatchError`]: failures of a watch adapter while listing/delivering declarations.
//! - [`AdvertiseError`]: failures of a single per-host advertisement.
//!
//! Every enum provides `as_label` (stable snake_case for logs) in the same way.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// # Errors that terminate the controller.
///
/// Reconciliation cannot proceed safely without a consistent initial view, so
/// every variant here is surfaced to the caller of
/// [`Controller::run`](crate::Controller::run) and should end the process.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The watch adapter did not become ready within the configured window.
    #[error("declaration cache did not sync within {timeout:?}")]
    SyncTimeout {
        /// The configured sync timeout.
        timeout: Duration,
    },

    /// The watch adapter stopped before it ever became ready.
    #[error("declaration cache failed to sync: {reason}")]
    SyncFailed {
        /// What the adapter reported.
        reason: String,
    },

    /// The watch adapter failed after the initial sync.
    #[error("watch adapter failed: {0}")]
    Watch(#[from] WatchError),

    /// Shutdown drain exceeded its grace period.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Hosts whose advertisers did not stop in time.
        stuck: Vec<String>,
    },

    /// OS signal handlers could not be installed.
    #[error("failed to install signal handlers: {0}")]
    Signal(#[source] io::Error),

    /// Local address detection failed.
    #[error("failed to detect a local IPv4 address: {0}")]
    AddressDetection(#[source] io::Error),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use mdnsvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::SyncTimeout { timeout: Duration::from_secs(5) };
    /// assert_eq!(err.as_label(), "runtime_sync_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::SyncTimeout { .. } => "runtime_sync_timeout",
            RuntimeError::SyncFailed { .. } => "runtime_sync_failed",
            RuntimeError::Watch(_) => "runtime_watch_failed",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::Signal(_) => "runtime_signal",
            RuntimeError::AddressDetection(_) => "runtime_address_detection",
        }
    }
}

/// # Errors produced by watch adapters.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum WatchError {
    /// The listing command could not be started.
    #[error("failed to run {program}: {error}")]
    Command {
        /// Program that failed to start.
        program: String,
        /// Underlying I/O error.
        #[source]
        error: io::Error,
    },

    /// The listing command exited unsuccessfully.
    #[error("{program} exited with {code:?}: {stderr}")]
    Status {
        /// Program that failed.
        program: String,
        /// Exit code, if the process was not killed by a signal.
        code: Option<i32>,
        /// Trimmed standard error output.
        stderr: String,
    },

    /// The listing output was not a valid declaration list.
    #[error("failed to decode declaration list: {0}")]
    Decode(#[from] serde_json::Error),

    /// Reading a declaration source failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// The reconciler side of the notification channel is gone.
    #[error("notification channel closed")]
    Closed,

    /// The adapter returned although it was not cancelled.
    #[error("watch adapter stopped unexpectedly")]
    Stopped,

    /// The adapter task panicked.
    #[error("watch adapter panicked: {info}")]
    Panicked {
        /// Panic payload, if it was a string.
        info: String,
    },
}

impl WatchError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            WatchError::Command { .. } => "watch_command",
            WatchError::Status { .. } => "watch_status",
            WatchError::Decode(_) => "watch_decode",
            WatchError::Io(_) => "watch_io",
            WatchError::Closed => "watch_closed",
            WatchError::Stopped => "watch_stopped",
            WatchError::Panicked { .. } => "watch_panicked",
        }
    }
}

/// # Errors produced by a single host advertisement.
///
/// None of these are fatal to the runtime: the supervisor clears the host's
/// registry entry and waits for the next intent to re-add it.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AdvertiseError {
    /// The advertisement process could not be spawned.
    #[error("failed to spawn {program}: {error}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying I/O error.
        #[source]
        error: io::Error,
    },

    /// The advertisement process exited without being cancelled.
    #[error("advertiser exited on its own with {code:?}")]
    Exited {
        /// Exit code, if the process was not killed by a signal.
        code: Option<i32>,
    },

    /// Backend-specific failure.
    #[error("advertisement failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The backend panicked.
    #[error("advertiser panicked: {info}")]
    Panicked {
        /// Panic payload, if it was a string.
        info: String,
    },

    /// Advertisement was cancelled (host removed or shutdown).
    #[error("advertisement cancelled")]
    Canceled,
}

impl AdvertiseError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use mdnsvisor::AdvertiseError;
    ///
    /// let err = AdvertiseError::Exited { code: Some(1) };
    /// assert_eq!(err.as_label(), "advertise_exited");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            AdvertiseError::Spawn { .. } => "advertise_spawn",
            AdvertiseError::Exited { .. } => "advertise_exited",
            AdvertiseError::Fail { .. } => "advertise_failed",
            AdvertiseError::Panicked { .. } => "advertise_panicked",
            AdvertiseError::Canceled => "advertise_canceled",
        }
    }

    /// Indicates whether the error is a graceful stop rather than a failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, AdvertiseError::Canceled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_error_converts_into_runtime_error() {
        let err: RuntimeError = WatchError::Closed.into();
        assert_eq!(err.as_label(), "runtime_watch_failed");
        assert!(err.to_string().contains("notification channel closed"));
    }

    #[test]
    fn only_canceled_is_cancellation() {
        assert!(AdvertiseError::Canceled.is_cancellation());
        assert!(!AdvertiseError::Exited { code: Some(0) }.is_cancellation());
        assert!(
            !AdvertiseError::Fail {
                error: "boom".into()
            }
            .is_cancellation()
        );
    }
}
