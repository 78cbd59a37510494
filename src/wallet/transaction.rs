//! Signed JUL transfer records.
//!
//! A transaction binds sender, recipient, amount, fee and timestamp into a
//! canonical SHA-256 id, then carries an ECDSA signature over that id by the
//! sender's key. The fee is fixed at construction time; verification checks
//! the recorded fee against the fee schedule rather than recomputing the id
//! from different fields.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{NodeError, Result};
use crate::units::{Amount, fee_for};
use crate::wallet::Wallet;
use crate::wallet::keys;

/// A signed transfer of JUL between two addresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Canonical hash of (from, to, amount, fee, timestamp).
    pub id: String,
    pub from: String,
    pub to: String,
    pub amount: Amount,
    pub fee: Amount,
    pub timestamp_ns: i64,
    /// Raw (r ‖ s) ECDSA signature over `id`, hex-encoded.
    pub signature: String,
    /// Uncompressed SEC1 point of the sender's public key, hex-encoded.
    pub sender_public_key: String,
}

impl Transaction {
    /// Builds and signs a transfer from `wallet` to `to`. The fee is computed
    /// here, once, from the fee schedule.
    pub fn new(wallet: &Wallet, to: &str, amount: Amount) -> Result<Transaction> {
        if !amount.is_positive() {
            return Err(NodeError::InvalidInput(format!(
                "transfer amount must be positive, got {amount}"
            )));
        }
        let fee = fee_for(amount);
        let timestamp_ns = now_ns()?;
        let from = wallet.address().to_string();
        let id = canonical_id(&from, to, amount, fee, timestamp_ns);
        let signature = wallet.sign(id.as_bytes())?;
        Ok(Transaction {
            id,
            from,
            to: to.to_string(),
            amount,
            fee,
            timestamp_ns,
            signature: hex::encode(signature),
            sender_public_key: keys::encode_public_key(wallet.public_key()),
        })
    }

    /// Recomputes the canonical id from this transaction's fields.
    pub fn computed_id(&self) -> String {
        canonical_id(&self.from, &self.to, self.amount, self.fee, self.timestamp_ns)
    }

    /// Full signature check: the id matches the fields, the embedded public
    /// key hashes to the claimed sender address, and the signature verifies
    /// over the id. Any malformed field verifies false.
    pub fn verify(&self) -> bool {
        if self.computed_id() != self.id {
            return false;
        }
        let Ok(public_key) = keys::decode_public_key(&self.sender_public_key) else {
            return false;
        };
        if keys::address_of(&public_key) != self.from {
            return false;
        }
        let Ok(signature) = hex::decode(&self.signature) else {
            return false;
        };
        keys::verify(&public_key, self.id.as_bytes(), &signature)
    }

    /// True when the recorded fee equals the fee schedule for the amount.
    pub fn fee_matches(&self) -> bool {
        self.fee == fee_for(self.amount)
    }

    /// Amount plus fee: what admission charges against the sender.
    pub fn total(&self) -> Amount {
        self.amount + self.fee
    }
}

/// Canonical transaction id: SHA-256 over a length-prefixed binary encoding
/// of the signed fields. Byte-identical on every platform.
fn canonical_id(from: &str, to: &str, amount: Amount, fee: Amount, timestamp_ns: i64) -> String {
    let mut hasher = Sha256::new();
    for field in [from.as_bytes(), to.as_bytes()] {
        hasher.update((field.len() as u32).to_be_bytes());
        hasher.update(field);
    }
    hasher.update(amount.0.to_be_bytes());
    hasher.update(fee.0.to_be_bytes());
    hasher.update(timestamp_ns.to_be_bytes());
    hex::encode(hasher.finalize())
}

pub(crate) fn now_ns() -> Result<i64> {
    Utc::now()
        .timestamp_nanos_opt()
        .ok_or_else(|| NodeError::Internal("system clock out of nanosecond range".into()))
}
