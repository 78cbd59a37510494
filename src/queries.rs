//! Read-only state snapshots for monitoring and the client API.
//!
//! Every view here is taken under the chain's shared (read) lock and carries
//! boundary-level JUL floats; the core never computes with them.

use serde::{Deserialize, Serialize};

use crate::ledger::Chain;

/// Node state information: chain length and current tip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeStatus {
    pub node_id: String,
    pub chain_length: usize,
    pub tip_hash: String,
    pub mempool_size: usize,
    pub peer_count: usize,
}

/// One account's balances in JUL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceView {
    pub address: String,
    pub spendable: f64,
    pub staked: f64,
}

/// One pending transaction, amounts in JUL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MempoolEntry {
    pub id: String,
    pub from: String,
    pub to: String,
    pub amount: f64,
    pub fee: f64,
}

/// One registered validator, amounts in JUL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorView {
    pub address: String,
    pub stake: f64,
    pub total_balance: f64,
}

/// Snapshot of the mempool in arrival order.
pub fn mempool_view(chain: &Chain) -> Vec<MempoolEntry> {
    chain
        .mempool()
        .iter()
        .map(|tx| MempoolEntry {
            id: tx.id.clone(),
            from: tx.from.clone(),
            to: tx.to.clone(),
            amount: tx.amount.to_jul(),
            fee: tx.fee.to_jul(),
        })
        .collect()
}

/// Snapshot of the validator registry.
pub fn validators_view(chain: &Chain) -> Vec<ValidatorView> {
    chain
        .pos()
        .validators()
        .iter()
        .map(|v| ValidatorView {
            address: v.address.clone(),
            stake: v.stake.to_jul(),
            total_balance: v.total_balance.to_jul(),
        })
        .collect()
}

/// Current node status.
pub fn status_view(node_id: &str, peer_count: usize, chain: &Chain) -> NodeStatus {
    NodeStatus {
        node_id: node_id.to_string(),
        chain_length: chain.len(),
        tip_hash: chain.tip().hash.clone(),
        mempool_size: chain.mempool().len(),
        peer_count,
    }
}
