//! Peer manager for the JUL node.
//!
//! Tracks known peers by id. A peer handle holds only a weak reference into
//! the peer's chain; the ledger itself is owned by the peer's node, and a
//! handle whose node has gone away is pruned on the next use.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use tokio::sync::RwLock;

use crate::ledger::{Chain, SharedChain};

/// A weak handle onto one peer's chain.
#[derive(Debug, Clone)]
pub struct PeerHandle {
    pub id: String,
    chain: Weak<RwLock<Chain>>,
}

impl PeerHandle {
    /// Upgrades to the peer's live chain, if the peer still exists.
    pub fn chain(&self) -> Option<SharedChain> {
        self.chain.upgrade()
    }
}

/// The set of peers this node knows about.
#[derive(Debug, Default)]
pub struct PeerManager {
    peers: RwLock<HashMap<String, PeerHandle>>,
}

impl PeerManager {
    pub fn new() -> PeerManager {
        PeerManager::default()
    }

    /// Registers a peer. Replaces any previous handle under the same id.
    pub async fn add_peer(&self, id: &str, chain: &SharedChain) {
        let handle = PeerHandle {
            id: id.to_string(),
            chain: Arc::downgrade(chain),
        };
        self.peers.write().await.insert(id.to_string(), handle);
    }

    pub async fn remove_peer(&self, id: &str) {
        self.peers.write().await.remove(id);
    }

    pub async fn get(&self, id: &str) -> Option<PeerHandle> {
        self.peers.read().await.get(id).cloned()
    }

    /// Snapshot of live peer handles, pruning any whose node is gone.
    pub async fn handles(&self) -> Vec<PeerHandle> {
        let mut peers = self.peers.write().await;
        peers.retain(|_, handle| handle.chain.strong_count() > 0);
        peers.values().cloned().collect()
    }

    pub async fn peer_count(&self) -> usize {
        self.peers.read().await.len()
    }
}
