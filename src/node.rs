//! The node: one chain, one wallet manager, one network handle.
//!
//! All client-facing verbs funnel through here. Lock discipline: wallet
//! manager before chain, and never either across a peer call; callers
//! broadcast only after every guard is dropped. Persistence runs after the
//! mutation commits, outside the critical section.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::warn;

use crate::chaindb::ChainDb;
use crate::error::{NodeError, Result};
use crate::ledger::{ForgedBlock, SharedChain};
use crate::networking::P2pNetwork;
use crate::tracing::tracers::{TraceEvent, Tracer};
use crate::units::Amount;
use crate::wallet::{Transaction, WalletManager};

pub struct Node {
    pub id: String,
    pub chain: SharedChain,
    pub wallets: Arc<RwLock<WalletManager>>,
    db: Option<ChainDb>,
    tracer: Tracer,
}

impl Node {
    pub fn new(id: &str, chain: SharedChain, tracer: Tracer) -> Node {
        Node {
            id: id.to_string(),
            chain,
            wallets: Arc::new(RwLock::new(WalletManager::new())),
            db: None,
            tracer,
        }
    }

    /// Attaches a persistence backend; every committed mutation is saved.
    pub fn with_db(mut self, db: ChainDb) -> Node {
        self.db = Some(db);
        self
    }

    /// Announces this node's chain to the peer network.
    pub async fn join_network(&self, network: &P2pNetwork) {
        network.register(&self.id, &self.chain).await;
    }

    /// Creates a wallet, registers its account, and returns the address.
    pub async fn create_wallet(&self) -> Result<String> {
        let address = {
            let mut wallets = self.wallets.write().await;
            let address = wallets.create_wallet();
            let mut chain = self.chain.write().await;
            chain.register_account(&address);
            address
        };
        self.tracer.trace(TraceEvent::WalletCreated(address.clone()));
        self.persist().await?;
        Ok(address)
    }

    /// Spendable and staked balance of an account.
    pub async fn balance(&self, address: &str) -> Result<(Amount, Amount)> {
        let chain = self.chain.read().await;
        chain.balance(address)
    }

    /// Builds, signs, and admits a transfer from a local wallet. Returns the
    /// admitted transaction so the caller can broadcast it once no lock is
    /// held.
    pub async fn send_transaction(&self, from: &str, to: &str, amount: Amount) -> Result<Transaction> {
        let tx = {
            let wallets = self.wallets.read().await;
            let wallet = wallets
                .get(from)
                .ok_or_else(|| NodeError::InvalidInput(format!("unknown wallet {from}")))?;
            Transaction::new(wallet, to, amount)?
        };
        {
            let mut chain = self.chain.write().await;
            chain.submit(tx.clone())?;
        }
        Ok(tx)
    }

    /// Picks a validator by stake weight and forges the next block. The
    /// caller broadcasts the block after the lock is gone.
    pub async fn forge_block(&self) -> Result<ForgedBlock> {
        let forged = {
            let mut chain = self.chain.write().await;
            let validator = chain
                .select_validator()
                .ok_or_else(|| NodeError::InvalidInput("no validator available".into()))?;
            self.tracer
                .trace(TraceEvent::ValidatorSelected(validator.address.clone()));
            chain.forge(&validator.address)?
        };
        self.persist().await?;
        Ok(forged)
    }

    /// Moves a local wallet's JUL from spendable into stake and registers the
    /// validator.
    pub async fn stake(&self, address: &str, amount: Amount) -> Result<()> {
        self.with_synced_wallet(address, |wallet| wallet.stake(amount)).await
    }

    /// Moves staked JUL back to spendable, updating the validator registry.
    pub async fn unstake(&self, address: &str, amount: Amount) -> Result<()> {
        self.with_synced_wallet(address, |wallet| wallet.unstake(amount)).await
    }

    /// Fiat bridge: credits `usd × rate` JUL to a local wallet.
    pub async fn purchase(&self, address: &str, usd: f64) -> Result<Amount> {
        let mut credited = Amount::ZERO;
        self.with_synced_wallet(address, |wallet| {
            credited = wallet.purchase(usd)?;
            Ok(())
        })
        .await?;
        Ok(credited)
    }

    /// Pulls the longest valid chain from peers, adopting it if longer.
    pub async fn sync_with_peers(&self, network: &P2pNetwork) -> Result<()> {
        network.sync_blockchain(&self.id).await?;
        self.persist().await
    }

    /// Runs a balance-moving wallet operation against the authoritative
    /// account: refresh the local mirror, apply the wallet rule, write the
    /// result back, then persist.
    async fn with_synced_wallet<F>(&self, address: &str, op: F) -> Result<()>
    where
        F: FnOnce(&mut crate::wallet::Wallet) -> Result<()>,
    {
        {
            let mut wallets = self.wallets.write().await;
            let wallet = wallets
                .get_mut(address)
                .ok_or_else(|| NodeError::InvalidInput(format!("unknown wallet {address}")))?;
            let mut chain = self.chain.write().await;
            let (spendable, staked) = chain.balance(address)?;
            wallet.sync_balances(spendable, staked);
            op(wallet)?;
            chain.commit_balances(address, wallet.spendable(), wallet.staked())?;
        }
        self.persist().await
    }

    /// Saves blocks and balances if a database is attached. A failed save is
    /// surfaced; the in-memory ledger has already committed.
    async fn persist(&self) -> Result<()> {
        let Some(db) = &self.db else {
            return Ok(());
        };
        let (blocks, accounts, len) = {
            let chain = self.chain.read().await;
            (chain.blocks().to_vec(), chain.accounts().clone(), chain.len())
        };
        if let Err(e) = db.save(&blocks, &accounts).await {
            warn!(error = %e, "failed to persist ledger state");
            return Err(NodeError::Internal(format!("persistence failed: {e}")));
        }
        self.tracer.trace(TraceEvent::StateSaved(len));
        Ok(())
    }
}
