//! Integration tests for wallets, keys, and transaction signing.

use jul_node::error::NodeError;
use jul_node::units::{Amount, MIN_STAKE, fee_for};
use jul_node::wallet::{Transaction, Wallet, WalletManager, address_of, decode_public_key};

#[test]
fn wallet_addresses_are_unique_and_well_formed() {
    let mut manager = WalletManager::new();
    let a = manager.create_wallet();
    let b = manager.create_wallet();
    assert_ne!(a, b);
    for address in [&a, &b] {
        assert_eq!(address.len(), 64);
        assert!(address.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

#[test]
fn address_matches_embedded_public_key() {
    let wallet = Wallet::generate();
    let mut funded = Wallet::generate();
    funded.add(Amount::from_jul(10.0));

    let tx = Transaction::new(&funded, wallet.address(), Amount::from_jul(1.0)).unwrap();
    let key = decode_public_key(&tx.sender_public_key).unwrap();
    assert_eq!(address_of(&key), tx.from);
}

#[test]
fn stake_boundary_is_exact() {
    let mut wallet = Wallet::generate();
    wallet.add(Amount::from_jul(200.0));

    // 99.999999999 JUL: one nanojule below the minimum.
    let below = MIN_STAKE - Amount(1);
    assert!(matches!(
        wallet.stake(below),
        Err(NodeError::BelowMinimum(_))
    ));

    // Exactly 100 JUL succeeds.
    wallet.stake(MIN_STAKE).unwrap();
    assert_eq!(wallet.staked(), MIN_STAKE);
}

#[test]
fn stake_then_unstake_restores_prior_balances() {
    let mut wallet = Wallet::generate();
    wallet.add(Amount::from_jul(350.5));
    let before = (wallet.spendable(), wallet.staked());

    wallet.stake(Amount::from_jul(120.0)).unwrap();
    assert_eq!(wallet.total_balance(), Amount::from_jul(350.5));
    wallet.unstake(Amount::from_jul(120.0)).unwrap();

    assert_eq!((wallet.spendable(), wallet.staked()), before);
}

#[test]
fn purchase_converts_usd_at_fixed_rate() {
    let mut wallet = Wallet::generate();
    let credited = wallet.purchase(10.0).unwrap();
    assert_eq!(credited, Amount::from_jul(350.0));
    assert_eq!(wallet.spendable(), credited);
}

#[test]
fn transaction_fee_is_computed_once_at_construction() {
    let mut wallet = Wallet::generate();
    wallet.add(Amount::from_jul(1_000.0));

    let amount = Amount::from_jul(250.0);
    let tx = Transaction::new(&wallet, "recipient", amount).unwrap();
    assert_eq!(tx.fee, fee_for(amount));
    assert_eq!(tx.total(), amount + tx.fee);
    assert!(tx.verify());
}

#[test]
fn signatures_do_not_transfer_between_wallets() {
    let mut alice = Wallet::generate();
    let mut mallory = Wallet::generate();
    alice.add(Amount::from_jul(100.0));
    mallory.add(Amount::from_jul(100.0));

    let honest = Transaction::new(&alice, "merchant", Amount::from_jul(10.0)).unwrap();
    let mut forged = Transaction::new(&mallory, "merchant", Amount::from_jul(10.0)).unwrap();
    forged.signature = honest.signature.clone();
    assert!(!forged.verify());
}
