//! Proof-of-stake consensus: validator registry, weighted selection, slashing.
//!
//! Any address whose wallet stakes at least the protocol minimum joins the
//! validator set. Selection is a stake-weighted random pick with a recency
//! bonus shared across the whole set and a commitment bonus for validators
//! who stake a larger fraction of their wealth. Misbehavior is punished by
//! slashing a fixed percentage of stake into a protocol-owned community fund.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{NodeError, Result};
use crate::networking::P2pNetwork;
use crate::units::{Amount, MIN_STAKE, SLASH_DIVISOR};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// A staked participant eligible to forge blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Validator {
    pub address: String,
    pub stake: Amount,
    /// The validator's whole wealth (spendable + staked) at registration
    /// time; the commitment bonus weighs stake against it.
    pub total_balance: Amount,
}

/// The validator set plus the aggregate bookkeeping selection depends on.
#[derive(Debug)]
pub struct ProofOfStake {
    validators: Vec<Validator>,
    total_stake: Amount,
    community_fund: Amount,
    /// One global clock: the last time any validator was selected. Reset on
    /// every pick, so only the first selection after a pause earns the
    /// recency bonus.
    last_validation: DateTime<Utc>,
}

impl Default for ProofOfStake {
    fn default() -> Self {
        ProofOfStake::new()
    }
}

impl ProofOfStake {
    pub fn new() -> ProofOfStake {
        ProofOfStake {
            validators: Vec::new(),
            total_stake: Amount::ZERO,
            community_fund: Amount::ZERO,
            last_validation: Utc::now(),
        }
    }

    /// Registers or updates a validator. Stakes below the minimum are
    /// silently ignored; staking is the caller's opt-in, not an error path.
    pub fn add_validator(&mut self, address: &str, stake: Amount, total_balance: Amount) {
        if stake < MIN_STAKE {
            return;
        }
        match self.validators.iter_mut().find(|v| v.address == address) {
            Some(existing) => {
                existing.stake = stake;
                existing.total_balance = total_balance;
            }
            None => self.validators.push(Validator {
                address: address.to_string(),
                stake,
                total_balance,
            }),
        }
        self.recompute_total();
    }

    /// Adjusts a validator's stake, removing it when the stake drops below
    /// the minimum.
    pub fn update_stake(&mut self, address: &str, new_stake: Amount, new_total: Amount) {
        if new_stake < MIN_STAKE {
            self.validators.retain(|v| v.address != address);
        } else if let Some(v) = self.validators.iter_mut().find(|v| v.address == address) {
            v.stake = new_stake;
            v.total_balance = new_total;
        }
        self.recompute_total();
    }

    /// Stake-weighted random selection. Resets the shared recency clock on
    /// every pick. Returns `None` when the set is empty.
    pub fn select_validator(&mut self) -> Option<Validator> {
        self.select_validator_at(Utc::now())
    }

    fn select_validator_at(&mut self, now: DateTime<Utc>) -> Option<Validator> {
        if self.validators.is_empty() {
            return None;
        }
        let weights: Vec<f64> = self.validators.iter().map(|v| self.weight_at(v, now)).collect();
        let total: f64 = weights.iter().sum();
        let sample = rand::rng().random_range(0.0..total);

        let mut cumulative = 0.0;
        let mut picked = self.validators.len() - 1;
        for (i, w) in weights.iter().enumerate() {
            cumulative += w;
            if sample < cumulative {
                picked = i;
                break;
            }
        }
        self.last_validation = now;
        Some(self.validators[picked].clone())
    }

    /// Selection weight:
    /// `stake * (1 + days since the last selection) * (1 + stake / total_balance)`.
    ///
    /// The recency factor damps single-validator domination after quiet
    /// periods; the commitment factor rewards staking a larger fraction of
    /// personal wealth.
    fn weight_at(&self, v: &Validator, now: DateTime<Utc>) -> f64 {
        let stake = v.stake.to_jul();
        let idle_days =
            (now - self.last_validation).num_seconds().max(0) as f64 / SECONDS_PER_DAY;
        let commitment = if v.total_balance.is_positive() {
            v.stake.0 as f64 / v.total_balance.0 as f64
        } else {
            0.0
        };
        stake * (1.0 + idle_days) * (1.0 + commitment)
    }

    /// Deducts 5% of the validator's stake into the community fund. Removes
    /// the validator when the remainder falls below the minimum. Returns the
    /// slashed amount.
    pub fn slash(&mut self, address: &str) -> Result<Amount> {
        let v = self
            .validators
            .iter_mut()
            .find(|v| v.address == address)
            .ok_or_else(|| NodeError::InvalidInput(format!("unknown validator {address}")))?;

        let slashed = Amount(v.stake.0 / SLASH_DIVISOR);
        v.stake -= slashed;
        v.total_balance -= slashed;
        let remaining = v.stake;
        self.community_fund += slashed;

        if remaining < MIN_STAKE {
            self.validators.retain(|v| v.address != address);
            warn!(address, remaining = %remaining, "validator slashed below minimum, removed");
        } else {
            info!(address, slashed = %slashed, remaining = %remaining, "validator slashed");
        }
        self.recompute_total();
        Ok(slashed)
    }

    pub fn community_fund(&self) -> Amount {
        self.community_fund
    }

    pub fn total_stake(&self) -> Amount {
        self.total_stake
    }

    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    pub fn is_validator(&self, address: &str) -> bool {
        self.validators.iter().any(|v| v.address == address)
    }

    pub fn stake_of(&self, address: &str) -> Option<Amount> {
        self.validators
            .iter()
            .find(|v| v.address == address)
            .map(|v| v.stake)
    }

    fn recompute_total(&mut self) {
        self.total_stake = self.validators.iter().map(|v| v.stake).sum();
    }
}

/// The block-forging scheduler: every slot, pick a validator, forge, persist,
/// and broadcast. The chain lock is never held across the broadcast.
pub async fn run_forging_loop(
    node: Arc<crate::node::Node>,
    network: Arc<P2pNetwork>,
    slot_duration: Duration,
) {
    let mut interval = tokio::time::interval(slot_duration);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        match node.forge_block().await {
            Ok(forged) => {
                info!(
                    index = forged.block.index,
                    validator = %forged.validator,
                    txs = forged.block.transactions.len(),
                    "forged block"
                );
                network.broadcast_block(&node.id, &forged.block).await;
            }
            Err(NodeError::InvalidInput(reason)) => {
                // No validator registered yet; wait for the next slot.
                tracing::debug!(%reason, "skipping slot");
            }
            Err(e) => warn!(error = %e, "forging failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::NANOJULES_PER_JUL;
    use chrono::TimeDelta;

    fn jul(v: f64) -> Amount {
        Amount::from_jul(v)
    }

    #[test]
    fn below_minimum_stake_is_ignored() {
        let mut pos = ProofOfStake::new();
        pos.add_validator("v1", jul(99.999_999_999), jul(200.0));
        assert!(pos.validators().is_empty());

        pos.add_validator("v1", jul(100.0), jul(200.0));
        assert_eq!(pos.validators().len(), 1);
        assert_eq!(pos.total_stake(), jul(100.0));
    }

    #[test]
    fn add_validator_updates_in_place() {
        let mut pos = ProofOfStake::new();
        pos.add_validator("v1", jul(150.0), jul(300.0));
        pos.add_validator("v1", jul(250.0), jul(300.0));
        assert_eq!(pos.validators().len(), 1);
        assert_eq!(pos.stake_of("v1"), Some(jul(250.0)));
        assert_eq!(pos.total_stake(), jul(250.0));
    }

    #[test]
    fn update_stake_below_minimum_removes() {
        let mut pos = ProofOfStake::new();
        pos.add_validator("v1", jul(150.0), jul(300.0));
        pos.update_stake("v1", jul(50.0), jul(300.0));
        assert!(!pos.is_validator("v1"));
        assert_eq!(pos.total_stake(), Amount::ZERO);
    }

    #[test]
    fn select_from_empty_set_is_none() {
        let mut pos = ProofOfStake::new();
        assert!(pos.select_validator().is_none());
    }

    #[test]
    fn sole_validator_is_always_selected() {
        let mut pos = ProofOfStake::new();
        pos.add_validator("v1", jul(150.0), jul(200.0));
        for _ in 0..10 {
            assert_eq!(pos.select_validator().unwrap().address, "v1");
        }
    }

    #[test]
    fn selection_returns_a_registered_validator() {
        let mut pos = ProofOfStake::new();
        pos.add_validator("v1", jul(100.0), jul(100.0));
        pos.add_validator("v2", jul(500.0), jul(1_000.0));
        pos.add_validator("v3", jul(250.0), jul(250.0));
        for _ in 0..50 {
            let picked = pos.select_validator().unwrap();
            assert!(pos.is_validator(&picked.address));
        }
    }

    #[test]
    fn idle_time_raises_weight() {
        let mut pos = ProofOfStake::new();
        pos.add_validator("v1", jul(100.0), jul(200.0));
        let v = pos.validators()[0].clone();
        let now = pos.last_validation;
        let fresh = pos.weight_at(&v, now);
        let later = pos.weight_at(&v, now + TimeDelta::days(2));
        // Two idle days triple the weight: (1 + 2) vs (1 + 0).
        assert!((later / fresh - 3.0).abs() < 1e-9);
    }

    #[test]
    fn selection_resets_the_shared_clock() {
        let mut pos = ProofOfStake::new();
        pos.add_validator("v1", jul(100.0), jul(100.0));
        let before = pos.last_validation;
        pos.select_validator_at(before + TimeDelta::days(1)).unwrap();
        assert_eq!(pos.last_validation, before + TimeDelta::days(1));
    }

    #[test]
    fn slash_sequence_matches_five_percent_schedule() {
        let mut pos = ProofOfStake::new();
        pos.add_validator("v1", jul(200.0), jul(200.0));

        let first = pos.slash("v1").unwrap();
        assert_eq!(first, jul(10.0));
        assert_eq!(pos.stake_of("v1"), Some(jul(190.0)));
        assert_eq!(pos.community_fund(), jul(10.0));

        let second = pos.slash("v1").unwrap();
        assert_eq!(second, jul(9.5));
        assert_eq!(pos.stake_of("v1"), Some(jul(180.5)));
        assert_eq!(pos.community_fund(), jul(19.5));

        // Keep slashing until the validator drops below the minimum.
        let mut rounds = 0;
        while pos.is_validator("v1") {
            pos.slash("v1").unwrap();
            rounds += 1;
            assert!(rounds < 100, "slashing must eventually evict");
        }
        assert!(pos.validators().is_empty());
        assert_eq!(pos.total_stake(), Amount::ZERO);
        assert!(pos.community_fund() > jul(19.5));
        assert!(pos.community_fund() < jul(200.0));
    }

    #[test]
    fn slash_unknown_address_is_invalid_input() {
        let mut pos = ProofOfStake::new();
        assert!(matches!(pos.slash("ghost"), Err(NodeError::InvalidInput(_))));
    }

    #[test]
    fn commitment_factor_uses_total_balance() {
        let pos = ProofOfStake::new();
        let now = pos.last_validation;
        let fully_committed = Validator {
            address: "a".into(),
            stake: Amount(100 * NANOJULES_PER_JUL),
            total_balance: Amount(100 * NANOJULES_PER_JUL),
        };
        let half_committed = Validator {
            address: "b".into(),
            stake: Amount(100 * NANOJULES_PER_JUL),
            total_balance: Amount(200 * NANOJULES_PER_JUL),
        };
        let full = pos.weight_at(&fully_committed, now);
        let half = pos.weight_at(&half_committed, now);
        assert!(full > half);
        assert!((full / half - (2.0 / 1.5)).abs() < 1e-9);
    }
}
