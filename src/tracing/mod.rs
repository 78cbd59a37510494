//! Structured logging and node event tracing.
//!
//! Wires the global `tracing-subscriber` (env-filtered, `RUST_LOG` aware)
//! and owns the node's `Tracer` handle, which fans typed `TraceEvent`s out
//! to registered handlers. By default every event is also mirrored into the
//! log stream at info level.

pub mod tracers;

use tracers::{TraceEvent, Tracer};
use tracing_subscriber::EnvFilter;

/// Tracing subsystem handle created once at startup.
#[derive(Clone)]
pub struct Tracing {
    pub tracer: Tracer,
}

impl Tracing {
    /// Initializes the global subscriber (idempotent: a second init is
    /// ignored, which keeps tests quiet) and returns the node tracer with
    /// the default log-mirroring handler registered.
    pub fn new() -> Tracing {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

        let tracer = Tracer::default();
        tracer.register(|event: &TraceEvent| {
            tracing::info!(target: "node_events", "{}", event.description());
        });
        Tracing { tracer }
    }

    /// Emits the startup event.
    pub fn startup(&self, node_id: &str) {
        self.tracer
            .trace(TraceEvent::Startup(format!("node {node_id} starting")));
    }

    /// Emits the shutdown event.
    pub fn shutdown(&self) {
        self.tracer
            .trace(TraceEvent::Shutdown("node shutting down".into()));
    }
}

impl Default for Tracing {
    fn default() -> Self {
        Tracing::new()
    }
}
