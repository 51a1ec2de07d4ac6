//! Graceful shutdown and signal handling.
//!
//! SIGTERM/SIGINT trigger a graceful shutdown with connection draining.

use std::time::Duration;

use axum_server::Handle;

/// Setup graceful shutdown on SIGTERM and SIGINT.
///
/// Signal listeners are registered before this returns, so a signal that
/// arrives right after startup is not lost to the default handler.
///
/// When either signal is received, the server will:
/// 1. Stop accepting new connections
/// 2. Wait up to `drain` for existing connections to complete
/// 3. Shutdown gracefully
pub fn setup_shutdown_handler(handle: Handle, drain: Duration) {
    let signals = ShutdownSignals::install();

    tokio::spawn(async move {
        let signal = signals.recv().await;
        tracing::info!(signal, "Received shutdown signal, initiating graceful shutdown");

        handle.graceful_shutdown(Some(drain));
        tracing::info!(
            drain_secs = drain.as_secs(),
            "Graceful shutdown initiated, waiting for connections to close"
        );
    });
}

#[cfg(unix)]
struct ShutdownSignals {
    interrupt: Option<tokio::signal::unix::Signal>,
    terminate: Option<tokio::signal::unix::Signal>,
}

#[cfg(unix)]
impl ShutdownSignals {
    /// A signal whose handler cannot be installed is logged and never fires.
    fn install() -> Self {
        use tokio::signal::unix::{signal, SignalKind};

        let listen = |kind: SignalKind, name: &str| match signal(kind) {
            Ok(listener) => Some(listener),
            Err(e) => {
                tracing::error!(error = %e, signal = name, "Failed to install signal handler");
                None
            }
        };

        Self {
            interrupt: listen(SignalKind::interrupt(), "SIGINT"),
            terminate: listen(SignalKind::terminate(), "SIGTERM"),
        }
    }

    /// Resolves with the name of the first shutdown signal received.
    async fn recv(mut self) -> &'static str {
        tokio::select! {
            _ = recv_or_pending(self.interrupt.as_mut()) => "SIGINT",
            _ = recv_or_pending(self.terminate.as_mut()) => "SIGTERM",
        }
    }
}

#[cfg(unix)]
async fn recv_or_pending(listener: Option<&mut tokio::signal::unix::Signal>) {
    match listener {
        Some(listener) => {
            listener.recv().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(not(unix))]
struct ShutdownSignals;

#[cfg(not(unix))]
impl ShutdownSignals {
    fn install() -> Self {
        Self
    }

    async fn recv(self) -> &'static str {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        "Ctrl+C"
    }
}
