//! Integration tests for peer networking: broadcast, tip extension, and the
//! longest-valid-chain sync.

use std::sync::Arc;

use jul_node::ledger::{Chain, SharedChain};
use jul_node::networking::{P2pNetwork, PeerMessage};
use jul_node::node::Node;
use jul_node::tracing::tracers::Tracer;
use jul_node::units::Amount;
use tokio::sync::RwLock;

fn jul(v: f64) -> Amount {
    Amount::from_jul(v)
}

fn shared_chain() -> SharedChain {
    Arc::new(RwLock::new(Chain::new(Tracer::default())))
}

/// A node joined to `network` with a funded, staked wallet.
async fn staked_node(network: &P2pNetwork, id: &str) -> (Arc<Node>, String) {
    let node = Arc::new(Node::new(id, shared_chain(), Tracer::default()));
    node.join_network(network).await;
    let address = node.create_wallet().await.unwrap();
    node.chain.write().await.mint(&address, jul(1_000.0)).unwrap();
    node.stake(&address, jul(200.0)).await.unwrap();
    (node, address)
}

#[tokio::test]
async fn transaction_broadcast_lands_in_peer_mempools() {
    let network = P2pNetwork::new(Tracer::default());
    let (n1, sender) = staked_node(&network, "n1").await;
    let (n2, _) = staked_node(&network, "n2").await;

    // n2 must know the sender's account before admission can pass.
    n2.chain.write().await.mint(&sender, jul(1_000.0)).unwrap();

    let tx = n1.send_transaction(&sender, "recipient", jul(10.0)).await.unwrap();
    network.broadcast_transaction(&n1.id, &tx).await;

    assert!(n2.chain.read().await.mempool().contains(&tx.id));
}

#[tokio::test]
async fn forged_blocks_propagate_to_followers() {
    let network = P2pNetwork::new(Tracer::default());
    let (n1, _) = staked_node(&network, "n1").await;
    let (n2, _) = staked_node(&network, "n2").await;

    let forged = n1.forge_block().await.unwrap();
    network.broadcast_block(&n1.id, &forged.block).await;

    let follower = n2.chain.read().await;
    assert_eq!(follower.len(), 2);
    assert_eq!(follower.tip().hash, forged.block.hash);
}

#[tokio::test]
async fn lagging_peer_catches_up_via_chain_request() {
    let network = P2pNetwork::new(Tracer::default());
    let (n1, _) = staked_node(&network, "n1").await;
    let (n2, _) = staked_node(&network, "n2").await;

    // n1 forges twice without n2 hearing the first block.
    n1.forge_block().await.unwrap();
    let second = n1.forge_block().await.unwrap();

    network.broadcast_block(&n1.id, &second.block).await;
    let follower = n2.chain.read().await;
    assert_eq!(follower.len(), 3);
    assert_eq!(follower.tip().hash, second.block.hash);
}

#[tokio::test]
async fn sync_prefers_the_longest_valid_chain() {
    let network = P2pNetwork::new(Tracer::default());
    let (n1, _) = staked_node(&network, "n1").await;
    let (n2, _) = staked_node(&network, "n2").await;
    let (n3, _) = staked_node(&network, "n3").await;

    for _ in 0..2 {
        n2.forge_block().await.unwrap();
    }
    for _ in 0..4 {
        n3.forge_block().await.unwrap();
    }

    n1.sync_with_peers(&network).await.unwrap();
    let synced = n1.chain.read().await;
    assert_eq!(synced.len(), 5);
    assert_eq!(synced.tip().hash, n3.chain.read().await.tip().hash);
}

#[tokio::test]
async fn diverged_tips_converge_on_the_longer_fork() {
    let network = P2pNetwork::new(Tracer::default());
    let (n1, _) = staked_node(&network, "n1").await;
    let (n2, _) = staked_node(&network, "n2").await;

    // Both forge on the same genesis tip: a fork.
    n1.forge_block().await.unwrap();
    n2.forge_block().await.unwrap();
    assert_ne!(
        n1.chain.read().await.tip().hash,
        n2.chain.read().await.tip().hash
    );

    // n2 extends its fork; n1 converges on the longer chain.
    n2.forge_block().await.unwrap();
    n1.sync_with_peers(&network).await.unwrap();
    assert_eq!(
        n1.chain.read().await.tip().hash,
        n2.chain.read().await.tip().hash
    );
}

#[tokio::test]
async fn wire_tampering_is_dropped_without_mutation() {
    let network = P2pNetwork::new(Tracer::default());
    let (n1, sender) = staked_node(&network, "n1").await;
    let (n2, _) = staked_node(&network, "n2").await;
    n2.chain.write().await.mint(&sender, jul(1_000.0)).unwrap();

    let tx = n1.send_transaction(&sender, "honest-recipient", jul(10.0)).await.unwrap();

    // Tamper with the recipient inside the wire message.
    let encoded = PeerMessage::Tx(tx).encode().unwrap();
    let decoded = PeerMessage::decode(&encoded).unwrap();
    let PeerMessage::Tx(mut tampered) = decoded else {
        panic!("expected a transaction message");
    };
    tampered.to = "attacker".into();

    let result = network.send_transaction("n2", &tampered).await;
    assert!(result.is_err());
    assert!(n2.chain.read().await.mempool().is_empty());
    assert!(n2.chain.read().await.balance("attacker").is_err());
}

#[tokio::test]
async fn peer_failures_do_not_stop_a_broadcast() {
    let network = P2pNetwork::new(Tracer::default());
    let (n1, sender) = staked_node(&network, "n1").await;
    // n2 never learns the sender's account, so its admission fails.
    let (n2, _) = staked_node(&network, "n2").await;
    let (n3, _) = staked_node(&network, "n3").await;
    n3.chain.write().await.mint(&sender, jul(1_000.0)).unwrap();

    let tx = n1.send_transaction(&sender, "recipient", jul(5.0)).await.unwrap();
    network.broadcast_transaction(&n1.id, &tx).await;

    assert!(n2.chain.read().await.mempool().is_empty());
    assert!(n3.chain.read().await.mempool().contains(&tx.id));
}

#[tokio::test]
async fn mempool_transaction_submitted_via_transaction_api() {
    // A submitted-but-unincluded transaction survives a chain replacement if
    // the adopted chain does not include it.
    let network = P2pNetwork::new(Tracer::default());
    let (n1, sender) = staked_node(&network, "n1").await;
    let (n2, _) = staked_node(&network, "n2").await;

    let tx = n1.send_transaction(&sender, "recipient", jul(5.0)).await.unwrap();
    for _ in 0..2 {
        n2.forge_block().await.unwrap();
    }
    n1.sync_with_peers(&network).await.unwrap();

    let chain = n1.chain.read().await;
    assert_eq!(chain.len(), 3);
    assert!(chain.mempool().contains(&tx.id));
}

#[tokio::test]
async fn transaction_from_wallet_missing_locally_is_rejected() {
    let network = P2pNetwork::new(Tracer::default());
    let (n1, _) = staked_node(&network, "n1").await;
    let result = n1.send_transaction("no-such-wallet", "recipient", jul(1.0)).await;
    assert!(result.is_err());
}
