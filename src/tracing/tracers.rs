//! Tracers for the JUL node.
//!
//! Provides the structured node events and the fan-out handle the ledger,
//! networking, and API layers emit into.

use std::sync::{Arc, Mutex};

/// Structured trace events for the node.
#[derive(Debug, Clone)]
pub enum TraceEvent {
    /// Node startup event.
    Startup(String),
    /// Node shutdown event.
    Shutdown(String),
    /// A wallet was created locally.
    WalletCreated(String),
    /// A transaction passed admission into the mempool.
    TransactionAdmitted(String),
    /// A transaction was rejected at admission (id, reason).
    TransactionRejected(String, String),
    /// A block was forged locally.
    BlockForged(u64),
    /// A block arriving from a peer was appended.
    BlockReceived(u64),
    /// The local chain was replaced by a longer valid one (new length).
    ChainReplaced(usize),
    /// A validator was selected to forge.
    ValidatorSelected(String),
    /// A validator was slashed.
    ValidatorSlashed(String),
    /// A peer joined the network.
    PeerConnected(String),
    /// A peer could not be reached.
    PeerUnavailable(String),
    /// Ledger state was persisted (chain length).
    StateSaved(usize),
}

impl TraceEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> String {
        match self {
            TraceEvent::Startup(msg) => format!("Startup: {msg}"),
            TraceEvent::Shutdown(msg) => format!("Shutdown: {msg}"),
            TraceEvent::WalletCreated(address) => format!("Wallet created: {address}"),
            TraceEvent::TransactionAdmitted(id) => format!("Transaction admitted: {id}"),
            TraceEvent::TransactionRejected(id, reason) => {
                format!("Transaction {id} rejected: {reason}")
            }
            TraceEvent::BlockForged(index) => format!("Block forged: {index}"),
            TraceEvent::BlockReceived(index) => format!("Block received: {index}"),
            TraceEvent::ChainReplaced(len) => format!("Chain replaced, new length: {len}"),
            TraceEvent::ValidatorSelected(address) => format!("Validator selected: {address}"),
            TraceEvent::ValidatorSlashed(address) => format!("Validator slashed: {address}"),
            TraceEvent::PeerConnected(id) => format!("Peer connected: {id}"),
            TraceEvent::PeerUnavailable(id) => format!("Peer unavailable: {id}"),
            TraceEvent::StateSaved(len) => format!("State saved at chain length {len}"),
        }
    }
}

/// Fan-out handle for trace events. Cloning shares the handler list.
#[derive(Clone, Default)]
pub struct Tracer {
    handlers: Arc<Mutex<Vec<Box<dyn Fn(&TraceEvent) + Send + Sync>>>>,
}

impl std::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl Tracer {
    /// Emits a trace event to all registered handlers.
    pub fn trace(&self, event: TraceEvent) {
        if let Ok(handlers) = self.handlers.lock() {
            for handler in handlers.iter() {
                handler(&event);
            }
        }
    }

    /// Registers a new handler for trace events.
    pub fn register<T: Fn(&TraceEvent) + Send + Sync + 'static>(&self, handler: T) {
        if let Ok(mut handlers) = self.handlers.lock() {
            handlers.push(Box::new(handler));
        }
    }
}
