//! # Termination signals.
//!
//! Provides [`wait_for_termination_signal`], which completes when the process
//! receives a termination signal. The orchestrator races it against the run when
//! [`Config::cancel_on_signal`](crate::Config::cancel_on_signal) is set and raises
//! the shared cancel signal in response.
//!
//! ## Signals
//! **Unix platforms:** `SIGINT` (Ctrl-C), `SIGTERM`, `SIGQUIT`.
//!
//! **Other platforms:** Ctrl-C via [`tokio::signal::ctrl_c`].

/// Waits for a termination signal.
///
/// Returns the name of the signal received, or `Err` if registration fails.
#[cfg(unix)]
pub(crate) async fn wait_for_termination_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

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

/// Waits for a termination signal.
///
/// Returns once Ctrl-C is received, or `Err` if registration fails.
#[cfg(not(unix))]
pub(crate) async fn wait_for_termination_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}
