//! Error vocabulary for the JUL node.
//!
//! Validation errors are reported to the originating caller; peer-side errors
//! are logged and the offending message dropped. No error leaves the ledger
//! partially mutated.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, NodeError>;

#[derive(Debug, Error)]
pub enum NodeError {
    /// Malformed request, bad amount, unknown address.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Spendable balance cannot cover the requested movement.
    #[error("insufficient funds")]
    InsufficientFunds,

    /// Unstake request exceeds the staked balance.
    #[error("amount exceeds staked balance")]
    OverStaked,

    /// Stake request below the protocol minimum.
    #[error("stake below the minimum of {0} JUL")]
    BelowMinimum(String),

    /// Signature generation or verification failed.
    #[error("crypto failure: {0}")]
    Crypto(String),

    /// A block or chain failed structural or transactional validation.
    #[error("chain invariant violated: {0}")]
    ChainInvariant(String),

    /// Transient transport failure; never alters ledger state.
    #[error("peer unavailable: {0}")]
    PeerUnavailable(String),

    /// Unreachable invariant violation. Fatal, never masked.
    #[error("internal error: {0}")]
    Internal(String),
}

impl NodeError {
    pub fn below_minimum(min: crate::units::Amount) -> Self {
        NodeError::BelowMinimum(min.to_string())
    }
}
