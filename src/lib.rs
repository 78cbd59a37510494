//! # JUL Node
//!
//! A small proof-of-stake ledger node for the JUL token: an append-only chain
//! of signed transactions, a FIFO mempool, stake-weighted validator
//! selection, and longest-valid-chain synchronization between peers.
//!
//! ## Modules
//! - [`wallet`]: P-256 keypairs, addresses, signed transactions, and the
//!   local secret-bearing wallet.
//! - [`ledger`]: blocks, the replicated account registry, and the chain state
//!   machine (admission, forging, replacement).
//! - [`mempool`]: the pending-transaction buffer.
//! - [`consensus`]: the validator registry, weighted selection, and slashing.
//! - [`networking`]: peer set, broadcast, and chain synchronization.
//! - [`node`]: the assembly of chain, wallets, and network.
//! - [`chaindb`]: on-disk persistence of blocks and balances.
//! - [`api`]: the axum REST surface.
//! - [`configuration`]: CLI/env/file configuration loading.
//! - [`tracing`]: structured logging and typed node events.
//!
//! All monetary arithmetic runs on fixed-point nanojules ([`units::Amount`]);
//! floats appear only at API boundaries.

pub mod api;
pub mod chaindb;
pub mod configuration;
pub mod consensus;
pub mod error;
pub mod handlers;
pub mod ledger;
pub mod mempool;
pub mod networking;
pub mod node;
pub mod queries;
pub mod tracing;
pub mod units;
pub mod wallet;
