//! Wallets: the local, secret-bearing twin of a ledger account.
//!
//! A `Wallet` owns its keypair and tracks a spendable and a staked balance.
//! The replicated `Account` registry inside the chain is the authoritative
//! ledger view; wallet balances are the node-local mirror, refreshed from the
//! account before any balance-moving operation. Peers never see wallets.

pub mod keys;
pub mod transaction;

pub use keys::{ADDRESS_LEN, Keypair, SIGNATURE_LEN, address_of, decode_public_key, verify};
pub use transaction::Transaction;

use std::collections::HashMap;

use p256::ecdsa::VerifyingKey;

use crate::error::{NodeError, Result};
use crate::units::{Amount, MIN_STAKE, USD_TO_JUL_RATE};

/// A keypair plus the owner's local view of spendable and staked JUL.
#[derive(Debug)]
pub struct Wallet {
    keypair: Keypair,
    address: String,
    spendable: Amount,
    staked: Amount,
}

impl Wallet {
    /// Creates a wallet with a fresh keypair and zero balances.
    pub fn generate() -> Wallet {
        let keypair = Keypair::generate();
        let address = keypair.address();
        Wallet {
            keypair,
            address,
            spendable: Amount::ZERO,
            staked: Amount::ZERO,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn public_key(&self) -> &VerifyingKey {
        self.keypair.public_key()
    }

    pub fn spendable(&self) -> Amount {
        self.spendable
    }

    pub fn staked(&self) -> Amount {
        self.staked
    }

    /// Spendable plus staked.
    pub fn total_balance(&self) -> Amount {
        self.spendable + self.staked
    }

    /// Credits the spendable balance.
    pub fn add(&mut self, amount: Amount) {
        self.spendable += amount;
    }

    /// Debits the spendable balance. Refuses to go negative.
    pub fn deduct(&mut self, amount: Amount) -> Result<()> {
        if !amount.is_positive() {
            return Err(NodeError::InvalidInput(format!(
                "deduction must be positive, got {amount}"
            )));
        }
        if amount > self.spendable {
            return Err(NodeError::InsufficientFunds);
        }
        self.spendable -= amount;
        Ok(())
    }

    /// Moves JUL from spendable to staked. The stake must meet the protocol
    /// minimum and fit within the spendable balance.
    pub fn stake(&mut self, amount: Amount) -> Result<()> {
        if amount < MIN_STAKE {
            return Err(NodeError::below_minimum(MIN_STAKE));
        }
        if amount > self.spendable {
            return Err(NodeError::InsufficientFunds);
        }
        self.spendable -= amount;
        self.staked += amount;
        Ok(())
    }

    /// Moves JUL back from staked to spendable.
    pub fn unstake(&mut self, amount: Amount) -> Result<()> {
        if !amount.is_positive() {
            return Err(NodeError::InvalidInput(format!(
                "unstake amount must be positive, got {amount}"
            )));
        }
        if amount > self.staked {
            return Err(NodeError::OverStaked);
        }
        self.staked -= amount;
        self.spendable += amount;
        Ok(())
    }

    /// Fiat bridge: credits `usd * USD_TO_JUL_RATE` JUL to the spendable
    /// balance and returns the credited amount. Outside consensus scope.
    pub fn purchase(&mut self, usd: f64) -> Result<Amount> {
        if !usd.is_finite() || usd <= 0.0 {
            return Err(NodeError::InvalidInput(format!(
                "purchase amount must be positive, got {usd}"
            )));
        }
        let credited = Amount::from_jul(usd * USD_TO_JUL_RATE as f64);
        self.spendable += credited;
        Ok(credited)
    }

    /// Signs an arbitrary digest with the wallet key.
    pub fn sign(&self, msg: &[u8]) -> Result<[u8; SIGNATURE_LEN]> {
        self.keypair.sign(msg)
    }

    /// Overwrites the local balance mirror from the authoritative account.
    pub fn sync_balances(&mut self, spendable: Amount, staked: Amount) {
        self.spendable = spendable;
        self.staked = staked;
    }
}

/// Owns every wallet created on this node, keyed by address.
#[derive(Debug, Default)]
pub struct WalletManager {
    wallets: HashMap<String, Wallet>,
}

impl WalletManager {
    pub fn new() -> WalletManager {
        WalletManager::default()
    }

    /// Creates and registers a new wallet, returning its address.
    pub fn create_wallet(&mut self) -> String {
        let wallet = Wallet::generate();
        let address = wallet.address().to_string();
        self.wallets.insert(address.clone(), wallet);
        address
    }

    pub fn get(&self, address: &str) -> Option<&Wallet> {
        self.wallets.get(address)
    }

    pub fn get_mut(&mut self, address: &str) -> Option<&mut Wallet> {
        self.wallets.get_mut(address)
    }

    pub fn contains(&self, address: &str) -> bool {
        self.wallets.contains_key(address)
    }

    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.wallets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }
}
