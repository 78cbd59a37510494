//! Graceful shutdown handling for the JUL node.
//!
//! Listens for SIGINT (Ctrl+C) and SIGTERM and emits the shutdown trace so
//! the main task can wind the node down cleanly.

use crate::tracing::tracers::{TraceEvent, Tracer};

/// Handlers for graceful shutdown.
pub struct Handlers;

impl Handlers {
    /// Blocks until a shutdown signal arrives.
    pub async fn register_signals(tracer: Tracer) {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    tracing::error!(error = %e, "failed to install SIGTERM handler");
                    return;
                }
            };
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl_c");
                return;
            }
        }
        tracer.trace(TraceEvent::Shutdown("signal received".into()));
    }
}
