//! Fixed-point money for the JUL ledger.
//!
//! All core arithmetic runs on integer nanojules (10^-9 JUL). Floating point
//! exists only at API and CLI boundaries; hashing a float-formatted amount is
//! not byte-stable across platforms.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Nanojules per JUL.
pub const NANOJULES_PER_JUL: i64 = 1_000_000_000;

/// Flat fee divisor: fee = amount / 1000 (0.1%).
pub const FEE_DIVISOR: i64 = 1_000;

/// Reward minted to the forging validator per block.
pub const BLOCK_REWARD: Amount = Amount(50 * NANOJULES_PER_JUL);

/// Minimum stake required to enter (and stay in) the validator set.
pub const MIN_STAKE: Amount = Amount(100 * NANOJULES_PER_JUL);

/// Slash divisor: a slash deducts stake / 20 (5%).
pub const SLASH_DIVISOR: i64 = 20;

/// Fiat bridge rate: JUL credited per USD.
pub const USD_TO_JUL_RATE: i64 = 35;

/// Upper bound on transactions drained into a single block.
pub const MAX_TX_PER_BLOCK: usize = 100;

/// A quantity of JUL in nanojules.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(pub i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Converts a boundary-level JUL value into nanojules, rounding to the
    /// nearest nanojule.
    pub fn from_jul(jul: f64) -> Amount {
        Amount((jul * NANOJULES_PER_JUL as f64).round() as i64)
    }

    /// Boundary-level JUL value. Not for hashing.
    pub fn to_jul(self) -> f64 {
        self.0 as f64 / NANOJULES_PER_JUL as f64
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn saturating_sub(self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }
}

impl std::ops::Add for Amount {
    type Output = Amount;
    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Amount {
    type Output = Amount;
    fn sub(self, rhs: Amount) -> Amount {
        Amount(self.0 - rhs.0)
    }
}

impl std::ops::AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        self.0 += rhs.0;
    }
}

impl std::ops::SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Amount) {
        self.0 -= rhs.0;
    }
}

impl std::iter::Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, |acc, a| acc + a)
    }
}

impl fmt::Display for Amount {
    /// Renders as a decimal JUL string with integer math, e.g. `12.500000000`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / NANOJULES_PER_JUL as u64;
        let frac = abs % NANOJULES_PER_JUL as u64;
        write!(f, "{sign}{whole}.{frac:09}")
    }
}

/// The fee schedule: a flat 0.1% of the transfer amount, truncated toward
/// zero. Admission and block validation both call this, never a reimplementation.
pub fn fee_for(amount: Amount) -> Amount {
    Amount(amount.0 / FEE_DIVISOR)
}
