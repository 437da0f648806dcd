//! # Termination signals.
//!
//! [`wait_for_shutdown_signal`] completes with the name of the first
//! termination signal the process receives. The name ends up as the reason of
//! the `ShutdownRequested` event.
//!
//! Unix: `SIGINT`, `SIGTERM` (systemd, Kubernetes), `SIGQUIT`.
//! Elsewhere: Ctrl-C only.

/// Waits for a termination signal and returns its name.
///
/// Fails only if the signal handlers cannot be registered.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    let name = tokio::select! {
        _ = sigint.recv()  => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
        _ = sigquit.recv() => "SIGQUIT",
    };
    Ok(name)
}

/// Waits for a termination signal and returns its name.
///
/// Fails only if the signal handler cannot be registered.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}
