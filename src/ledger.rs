//! Ledger for the JUL chain.
//!
//! Owns the append-only block list, the replicated account registry, the
//! mempool, and the proof-of-stake validator registry, all behind one lock:
//! `SharedChain` is the single serialized gate for every ledger mutation.
//! Writers (submit, forge, replace, stake bookkeeping) take the write half;
//! balance and chain queries take the read half.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::consensus::{ProofOfStake, Validator};
use crate::error::{NodeError, Result};
use crate::mempool::Mempool;
use crate::tracing::tracers::{TraceEvent, Tracer};
use crate::units::{Amount, BLOCK_REWARD, MAX_TX_PER_BLOCK, MIN_STAKE};
use crate::wallet::Transaction;
use crate::wallet::transaction::now_ns;

/// Validator name stamped on the genesis block.
pub const GENESIS_VALIDATOR: &str = "Genesis";

/// Shared, concurrency-safe chain handle.
pub type SharedChain = Arc<RwLock<Chain>>;

/// The authoritative, replicated view of one address.
///
/// The wallet is the local secret-bearing twin; accounts are what peers
/// converge on. An address appears here the first time it receives value or
/// is registered by the local node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: String,
    pub spendable: Amount,
    pub staked: Amount,
    /// Count of transfers this account has sent that were applied.
    pub nonce: u64,
}

impl Account {
    pub fn new(address: &str) -> Account {
        Account {
            address: address.to_string(),
            spendable: Amount::ZERO,
            staked: Amount::ZERO,
            nonce: 0,
        }
    }

    pub fn total_balance(&self) -> Amount {
        self.spendable + self.staked
    }
}

/// An immutable container of ordered transactions, hash-chained to its
/// predecessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp_ns: i64,
    pub transactions: Vec<Transaction>,
    pub prev_hash: String,
    pub hash: String,
    pub validator: String,
}

impl Block {
    /// The deterministic first block: every honest node derives the same
    /// genesis hash.
    pub fn genesis() -> Block {
        let mut block = Block {
            index: 0,
            timestamp_ns: 0,
            transactions: Vec::new(),
            prev_hash: String::new(),
            hash: String::new(),
            validator: GENESIS_VALIDATOR.to_string(),
        };
        block.hash = block.calculate_hash();
        block
    }

    /// Builds the successor of `prev` carrying `transactions`, stamped with
    /// the current time (clamped strictly after the predecessor).
    pub fn next(prev: &Block, transactions: Vec<Transaction>, validator: &str) -> Result<Block> {
        let timestamp_ns = now_ns()?.max(prev.timestamp_ns + 1);
        let mut block = Block {
            index: prev.index + 1,
            timestamp_ns,
            transactions,
            prev_hash: prev.hash.clone(),
            hash: String::new(),
            validator: validator.to_string(),
        };
        block.hash = block.calculate_hash();
        Ok(block)
    }

    /// Canonical block hash: SHA-256 over a length-prefixed binary encoding
    /// of index, timestamp, transaction ids, previous hash, and validator.
    pub fn calculate_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.index.to_be_bytes());
        hasher.update(self.timestamp_ns.to_be_bytes());
        hasher.update((self.transactions.len() as u32).to_be_bytes());
        for tx in &self.transactions {
            hasher.update((tx.id.len() as u32).to_be_bytes());
            hasher.update(tx.id.as_bytes());
        }
        for field in [self.prev_hash.as_bytes(), self.validator.as_bytes()] {
            hasher.update((field.len() as u32).to_be_bytes());
            hasher.update(field);
        }
        hex::encode(hasher.finalize())
    }

    /// Structural validity against the predecessor. With no predecessor only
    /// a genesis-shaped block (index 0) is valid.
    pub fn is_valid(&self, prev: Option<&Block>) -> bool {
        if self.hash != self.calculate_hash() {
            return false;
        }
        match prev {
            None => self.index == 0 && self.prev_hash.is_empty(),
            Some(prev) => {
                self.index == prev.index + 1
                    && self.prev_hash == prev.hash
                    && self.timestamp_ns > prev.timestamp_ns
            }
        }
    }

    /// Every transaction verifies against its embedded key, ids are pairwise
    /// unique, and every fee matches the fee schedule.
    pub fn has_valid_transactions(&self) -> bool {
        let mut seen = HashSet::new();
        self.transactions
            .iter()
            .all(|tx| seen.insert(tx.id.as_str()) && tx.fee_matches() && tx.verify())
    }
}

/// Result of a successful forge.
#[derive(Debug, Clone)]
pub struct ForgedBlock {
    pub block: Block,
    pub validator: String,
    pub reward: Amount,
}

/// The chain state machine. Exclusively owns blocks, accounts, mempool, and
/// the validator registry.
#[derive(Debug)]
pub struct Chain {
    blocks: Vec<Block>,
    accounts: HashMap<String, Account>,
    mempool: Mempool,
    pos: ProofOfStake,
    tracer: Tracer,
}

impl Chain {
    /// A fresh chain holding only the genesis block.
    pub fn new(tracer: Tracer) -> Chain {
        Chain {
            blocks: vec![Block::genesis()],
            accounts: HashMap::new(),
            mempool: Mempool::new(),
            pos: ProofOfStake::new(),
            tracer,
        }
    }

    /// Rebuilds a chain from persisted blocks and account balances. The
    /// validator registry is reconstructed from staked balances. Fails if the
    /// persisted chain does not validate end to end.
    pub fn restore(
        blocks: Vec<Block>,
        accounts: HashMap<String, Account>,
        tracer: Tracer,
    ) -> Result<Chain> {
        if !Self::is_valid_chain(&blocks) {
            return Err(NodeError::ChainInvariant(
                "persisted chain failed validation".into(),
            ));
        }
        let mut pos = ProofOfStake::new();
        for account in accounts.values() {
            if account.staked >= MIN_STAKE {
                pos.add_validator(&account.address, account.staked, account.total_balance());
            }
        }
        Ok(Chain {
            blocks,
            accounts,
            mempool: Mempool::new(),
            pos,
            tracer,
        })
    }

    /// Ensures an account entry exists for a locally created wallet.
    pub fn register_account(&mut self, address: &str) {
        self.accounts
            .entry(address.to_string())
            .or_insert_with(|| Account::new(address));
    }

    pub fn account(&self, address: &str) -> Option<&Account> {
        self.accounts.get(address)
    }

    pub fn accounts(&self) -> &HashMap<String, Account> {
        &self.accounts
    }

    /// Spendable and staked balance of a known account.
    pub fn balance(&self, address: &str) -> Result<(Amount, Amount)> {
        self.accounts
            .get(address)
            .map(|a| (a.spendable, a.staked))
            .ok_or_else(|| NodeError::InvalidInput(format!("unknown account {address}")))
    }

    /// Credits freshly minted JUL to an address, creating the account if
    /// needed. Off-consensus supply injection (initial funding, fiat bridge).
    pub fn mint(&mut self, address: &str, amount: Amount) -> Result<()> {
        if !amount.is_positive() {
            return Err(NodeError::InvalidInput(format!(
                "mint amount must be positive, got {amount}"
            )));
        }
        self.accounts
            .entry(address.to_string())
            .or_insert_with(|| Account::new(address))
            .spendable += amount;
        Ok(())
    }

    /// Writes back a wallet's balance split after a local stake, unstake, or
    /// purchase, and keeps the validator registry in sync with it.
    pub fn commit_balances(&mut self, address: &str, spendable: Amount, staked: Amount) -> Result<()> {
        let account = self
            .accounts
            .get_mut(address)
            .ok_or_else(|| NodeError::InvalidInput(format!("unknown account {address}")))?;
        account.spendable = spendable;
        account.staked = staked;
        let total = spendable + staked;
        if staked >= MIN_STAKE {
            self.pos.add_validator(address, staked, total);
        } else {
            self.pos.update_stake(address, staked, total);
        }
        Ok(())
    }

    /// Admission check and mempool append, checked in order: sender exists,
    /// spendable covers this and every already-pending transfer, the fee
    /// matches the schedule, the signature verifies, and the id is fresh in
    /// both mempool and chain. Rejection is non-retryable.
    pub fn submit(&mut self, tx: Transaction) -> Result<()> {
        let account = self
            .accounts
            .get(&tx.from)
            .ok_or_else(|| NodeError::InvalidInput(format!("unknown sender {}", tx.from)))?;
        let committed = self.mempool.pending_total(&tx.from);
        if account.spendable < committed + tx.total() {
            return Err(NodeError::InsufficientFunds);
        }
        if !tx.fee_matches() {
            return Err(NodeError::InvalidInput(
                "transaction fee does not match the fee schedule".into(),
            ));
        }
        if !tx.verify() {
            return Err(NodeError::Crypto("transaction signature rejected".into()));
        }
        if self.mempool.contains(&tx.id) {
            return Err(NodeError::InvalidInput(format!(
                "transaction {} already pending",
                tx.id
            )));
        }
        if self.tx_in_chain(&tx.id) {
            return Err(NodeError::InvalidInput(format!(
                "transaction {} already included in the chain",
                tx.id
            )));
        }
        self.tracer.trace(TraceEvent::TransactionAdmitted(tx.id.clone()));
        debug!(id = %tx.id, from = %tx.from, to = %tx.to, "transaction admitted");
        self.mempool.push(tx);
        Ok(())
    }

    /// Drains up to `MAX_TX_PER_BLOCK` pending transactions in arrival order,
    /// forges the next block on the tip, validates it, and atomically appends
    /// it, applies every transfer, and credits the validator the fees plus
    /// the minted block reward. An empty mempool still forges an empty block.
    pub fn forge(&mut self, validator: &str) -> Result<ForgedBlock> {
        if !self.pos.is_validator(validator) {
            return Err(NodeError::InvalidInput(format!(
                "{validator} is not a registered validator"
            )));
        }
        let transactions = self.mempool.drain(MAX_TX_PER_BLOCK);
        let block = match Block::next(self.tip(), transactions, validator) {
            Ok(block) if block.is_valid(Some(self.tip())) && block.has_valid_transactions() => block,
            Ok(block) => {
                self.mempool.restore_front(block.transactions);
                return Err(NodeError::ChainInvariant(
                    "forged block failed validation against the tip".into(),
                ));
            }
            Err(e) => return Err(e),
        };

        self.apply_and_append(block.clone());
        self.tracer.trace(TraceEvent::BlockForged(block.index));
        info!(index = block.index, validator, txs = block.transactions.len(), "block forged");
        Ok(ForgedBlock {
            block,
            validator: validator.to_string(),
            reward: BLOCK_REWARD,
        })
    }

    /// Appends a block forged elsewhere. The block must extend the local tip
    /// directly; anything further ahead is the peer-sync path's business.
    pub fn append_external(&mut self, block: Block) -> Result<()> {
        let prev = self.tip();
        if block.index != prev.index + 1 || block.prev_hash != prev.hash {
            return Err(NodeError::ChainInvariant(format!(
                "block {} does not extend the local tip {}",
                block.index, prev.index
            )));
        }
        if !block.is_valid(Some(prev)) || !block.has_valid_transactions() {
            return Err(NodeError::ChainInvariant(
                "received block failed validation".into(),
            ));
        }
        let included: HashSet<String> =
            block.transactions.iter().map(|tx| tx.id.clone()).collect();
        self.mempool.retain(|tx| !included.contains(&tx.id));
        self.tracer.trace(TraceEvent::BlockReceived(block.index));
        self.apply_and_append(block);
        Ok(())
    }

    /// The longest-valid-chain rule. Accepts only a strictly longer candidate
    /// that shares our genesis and validates end to end; equal length is a
    /// tie and ties are rejected. On acceptance every account's spendable
    /// balance is reset and rebuilt by replaying the candidate from block 1,
    /// so replay must stay deterministic and pure. Pending transactions not
    /// included in the adopted chain survive in the mempool. Failure leaves
    /// local state untouched.
    pub fn replace_chain(&mut self, candidate: Vec<Block>) -> Result<()> {
        if candidate.len() <= self.blocks.len() {
            return Err(NodeError::ChainInvariant(format!(
                "candidate length {} does not exceed local length {}",
                candidate.len(),
                self.blocks.len()
            )));
        }
        if candidate.first().map(|b| &b.hash) != self.blocks.first().map(|b| &b.hash) {
            return Err(NodeError::ChainInvariant(
                "candidate chain has a different genesis".into(),
            ));
        }
        if !Self::is_valid_chain(&candidate) {
            return Err(NodeError::ChainInvariant(
                "candidate chain failed validation".into(),
            ));
        }

        for account in self.accounts.values_mut() {
            account.spendable = Amount::ZERO;
            account.nonce = 0;
        }
        for block in candidate.iter().skip(1) {
            Self::apply_block_to_accounts(&mut self.accounts, block);
        }
        let included: HashSet<&str> = candidate
            .iter()
            .flat_map(|b| b.transactions.iter().map(|tx| tx.id.as_str()))
            .collect();
        self.mempool.retain(|tx| !included.contains(tx.id.as_str()));

        let old_len = self.blocks.len();
        self.blocks = candidate;
        self.tracer.trace(TraceEvent::ChainReplaced(self.blocks.len()));
        info!(from = old_len, to = self.blocks.len(), "adopted longer chain");
        Ok(())
    }

    /// Full walk: genesis shape, then every block valid against its
    /// predecessor with valid transactions.
    pub fn is_valid_chain(blocks: &[Block]) -> bool {
        let Some(genesis) = blocks.first() else {
            return false;
        };
        if !genesis.is_valid(None) {
            return false;
        }
        blocks
            .windows(2)
            .all(|pair| pair[1].is_valid(Some(&pair[0])) && pair[1].has_valid_transactions())
    }

    pub fn validate_chain(&self) -> bool {
        Self::is_valid_chain(&self.blocks)
    }

    /// Punitively deducts 5% of a validator's stake into the community fund,
    /// mirrored onto the account's staked balance.
    pub fn slash(&mut self, address: &str) -> Result<Amount> {
        let slashed = self.pos.slash(address)?;
        if let Some(account) = self.accounts.get_mut(address) {
            account.staked = account.staked.saturating_sub(slashed);
        }
        self.tracer
            .trace(TraceEvent::ValidatorSlashed(address.to_string()));
        Ok(slashed)
    }

    pub fn select_validator(&mut self) -> Option<Validator> {
        self.pos.select_validator()
    }

    pub fn tip(&self) -> &Block {
        self.blocks.last().expect("chain always contains genesis")
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn mempool(&self) -> &Mempool {
        &self.mempool
    }

    pub fn pos(&self) -> &ProofOfStake {
        &self.pos
    }

    pub fn community_fund(&self) -> Amount {
        self.pos.community_fund()
    }

    fn tx_in_chain(&self, id: &str) -> bool {
        self.blocks
            .iter()
            .any(|block| block.transactions.iter().any(|tx| tx.id == id))
    }

    fn apply_and_append(&mut self, block: Block) {
        Self::apply_block_to_accounts(&mut self.accounts, &block);
        self.blocks.push(block);
    }

    /// Applies one block's transfers in order: sender pays amount plus fee,
    /// recipient receives the amount, the validator collects the fee, and the
    /// block reward is minted from outside any account. Used identically by
    /// forge, external append, and replay so all three stay deterministic.
    fn apply_block_to_accounts(accounts: &mut HashMap<String, Account>, block: &Block) {
        for tx in &block.transactions {
            let sender = accounts
                .entry(tx.from.clone())
                .or_insert_with(|| Account::new(&tx.from));
            sender.spendable -= tx.total();
            sender.nonce += 1;

            let recipient = accounts
                .entry(tx.to.clone())
                .or_insert_with(|| Account::new(&tx.to));
            recipient.spendable += tx.amount;

            let validator = accounts
                .entry(block.validator.clone())
                .or_insert_with(|| Account::new(&block.validator));
            validator.spendable += tx.fee;
        }
        if block.validator != GENESIS_VALIDATOR {
            accounts
                .entry(block.validator.clone())
                .or_insert_with(|| Account::new(&block.validator))
                .spendable += BLOCK_REWARD;
        }
    }

}
