//! Broadcast and chain synchronization.
//!
//! Implements the peer message semantics: transactions fan out to every other
//! peer's admission check, blocks extend a peer's tip directly or trigger a
//! chain request, and a chain request surveys all peers for the longest fully
//! valid chain. Per-peer failures are logged and ignored; they never alter
//! ledger state. No chain lock is ever held across a call into another peer.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{NodeError, Result};
use crate::ledger::{Block, Chain, SharedChain};
use crate::networking::peer::PeerManager;
use crate::tracing::tracers::{TraceEvent, Tracer};
use crate::wallet::Transaction;

/// The node's handle to the peer network.
#[derive(Debug)]
pub struct P2pNetwork {
    peers: PeerManager,
    tracer: Tracer,
}

impl P2pNetwork {
    pub fn new(tracer: Tracer) -> P2pNetwork {
        P2pNetwork {
            peers: PeerManager::new(),
            tracer,
        }
    }

    /// Registers a node's chain under its id.
    pub async fn register(&self, id: &str, chain: &SharedChain) {
        self.peers.add_peer(id, chain).await;
        self.tracer.trace(TraceEvent::PeerConnected(id.to_string()));
    }

    pub async fn peer_count(&self) -> usize {
        self.peers.peer_count().await
    }

    /// Forwards a transaction to every peer except the sender. Each
    /// recipient runs its own admission check; failures are logged and
    /// ignored.
    pub async fn broadcast_transaction(&self, sender_id: &str, tx: &Transaction) {
        for peer in self.peers.handles().await {
            if peer.id == sender_id {
                continue;
            }
            if let Err(e) = self.send_transaction(&peer.id, tx).await {
                self.tracer
                    .trace(TraceEvent::TransactionRejected(tx.id.clone(), e.to_string()));
                debug!(peer = %peer.id, error = %e, "transaction not accepted by peer");
            }
        }
    }

    /// Delivers one transaction to one peer's admission check.
    pub async fn send_transaction(&self, peer_id: &str, tx: &Transaction) -> Result<()> {
        let chain = self.peer_chain(peer_id).await?;
        let mut chain = chain.write().await;
        chain.submit(tx.clone())
    }

    /// Forwards a block to every peer except the sender.
    pub async fn broadcast_block(&self, sender_id: &str, block: &Block) {
        for peer in self.peers.handles().await {
            if peer.id == sender_id {
                continue;
            }
            if let Err(e) = self.send_block(&peer.id, block).await {
                debug!(peer = %peer.id, error = %e, "block not accepted by peer");
            }
        }
    }

    /// Delivers one block to one peer. If the block directly extends the
    /// peer's tip it is appended; if it is further ahead, the peer requests
    /// the full chain; a stale block is dropped.
    pub async fn send_block(&self, peer_id: &str, block: &Block) -> Result<()> {
        let chain = self.peer_chain(peer_id).await?;

        // Peek at the tip under a read lock, then release before acting; the
        // write path re-checks the precondition.
        let tip_index = {
            let chain = chain.read().await;
            chain.tip().index
        };

        if block.index == tip_index + 1 {
            let mut chain = chain.write().await;
            chain.append_external(block.clone())
        } else if block.index > tip_index {
            drop(chain);
            self.request_chain(peer_id).await
        } else {
            debug!(peer = peer_id, index = block.index, "dropping stale block");
            Ok(())
        }
    }

    /// Surveys every other peer for the longest chain that validates end to
    /// end and, if it is strictly longer than `peer_id`'s own, adopts it.
    pub async fn request_chain(&self, peer_id: &str) -> Result<()> {
        let target = self.peer_chain(peer_id).await?;
        let own_len = target.read().await.len();

        let mut best: Option<Vec<Block>> = None;
        let mut best_len = own_len;
        for peer in self.peers.handles().await {
            if peer.id == peer_id {
                continue;
            }
            let Some(other) = peer.chain() else {
                self.tracer.trace(TraceEvent::PeerUnavailable(peer.id.clone()));
                continue;
            };
            let other = other.read().await;
            if other.len() > best_len && Chain::is_valid_chain(other.blocks()) {
                best_len = other.len();
                best = Some(other.blocks().to_vec());
            }
        }

        if let Some(candidate) = best {
            let mut target = target.write().await;
            // Length and validity are re-checked inside replace_chain; the
            // survey result may have been overtaken in the meantime.
            target.replace_chain(candidate)?;
        }
        Ok(())
    }

    /// Periodic variant of the chain request, run at startup and on demand.
    pub async fn sync_blockchain(&self, peer_id: &str) -> Result<()> {
        let before = {
            let chain = self.peer_chain(peer_id).await?;
            let chain = chain.read().await;
            chain.len()
        };
        self.request_chain(peer_id).await?;
        let after = {
            let chain = self.peer_chain(peer_id).await?;
            let chain = chain.read().await;
            chain.len()
        };
        if after > before {
            debug!(peer = peer_id, from = before, to = after, "chain synced");
        } else {
            debug!(peer = peer_id, length = after, "chain already up to date");
        }
        Ok(())
    }

    /// Background anti-entropy loop: re-runs the sync on a fixed period.
    pub async fn run_periodic_sync(self: Arc<Self>, node_id: String, every: Duration) {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if let Err(e) = self.sync_blockchain(&node_id).await {
                warn!(node = %node_id, error = %e, "periodic sync failed");
            }
        }
    }

    async fn peer_chain(&self, peer_id: &str) -> Result<SharedChain> {
        let handle = self
            .peers
            .get(peer_id)
            .await
            .ok_or_else(|| NodeError::PeerUnavailable(format!("peer {peer_id} not found")))?;
        handle.chain().ok_or_else(|| {
            self.tracer
                .trace(TraceEvent::PeerUnavailable(peer_id.to_string()));
            NodeError::PeerUnavailable(format!("peer {peer_id} has gone away"))
        })
    }
}
