//! Peer-to-peer networking for the JUL node.
//!
//! Handles the peer set, broadcast of transactions and blocks, and chain
//! synchronization. Transport is deliberately abstract: peers are registered
//! as weak handles onto their chain state, and the wire codec below is what
//! any concrete transport (HTTP, TCP framing, or a stream per message type)
//! would carry.

pub mod peer;
pub mod sync;

pub use peer::{PeerHandle, PeerManager};
pub use sync::P2pNetwork;

use serde::{Deserialize, Serialize};

use crate::error::{NodeError, Result};
use crate::ledger::Block;
use crate::wallet::Transaction;

/// The logical peer protocol. Every variant round-trips all block and
/// transaction fields, including signatures and embedded public keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PeerMessage {
    Tx(Transaction),
    Block(Block),
    RequestChainTip,
    SendChain(Vec<Block>),
}

impl PeerMessage {
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| NodeError::Internal(format!("peer message encoding failed: {e}")))
    }

    pub fn decode(bytes: &[u8]) -> Result<PeerMessage> {
        serde_json::from_slice(bytes)
            .map_err(|e| NodeError::InvalidInput(format!("malformed peer message: {e}")))
    }
}
