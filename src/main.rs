//! Main entrypoint for the JUL node.
//!
//! Loads configuration, restores or creates the chain, joins the peer
//! network, and runs the REST API, the forging scheduler, and the periodic
//! chain sync until a shutdown signal arrives.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::RwLock;

use jul_node::api::{AppState, rest_router};
use jul_node::chaindb::ChainDb;
use jul_node::configuration::{self, Cli};
use jul_node::consensus;
use jul_node::handlers::Handlers;
use jul_node::ledger::Chain;
use jul_node::networking::P2pNetwork;
use jul_node::node::Node;
use jul_node::tracing::Tracing;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = configuration::load_configuration(&cli)?;

    let tracing_sub = Tracing::new();
    let tracer = tracing_sub.tracer.clone();
    tracing_sub.startup(&config.node.id);

    // Restore the persisted ledger, or start from genesis.
    let db = ChainDb::open(config.database.path.clone())
        .await
        .context("opening chain database")?;
    let chain = match db.load().await.context("loading persisted chain")? {
        Some((blocks, accounts)) => {
            tracing::info!(blocks = blocks.len(), "restoring persisted chain");
            Chain::restore(blocks, accounts, tracer.clone())
                .map_err(|e| anyhow::anyhow!("restoring persisted chain: {e}"))?
        }
        None => Chain::new(tracer.clone()),
    };
    let chain = Arc::new(RwLock::new(chain));

    let network = Arc::new(P2pNetwork::new(tracer.clone()));
    let node = Arc::new(Node::new(&config.node.id, Arc::clone(&chain), tracer.clone()).with_db(db));
    node.join_network(&network).await;

    // REST API server.
    let api_addr: std::net::SocketAddr = config
        .api
        .bind_addr
        .parse()
        .context("parsing api bind address")?;
    let app_state = Arc::new(AppState {
        node: Arc::clone(&node),
        network: Arc::clone(&network),
    });
    let api_task = tokio::spawn(async move {
        let app = rest_router(app_state);
        match TcpListener::bind(api_addr).await {
            Ok(listener) => {
                tracing::info!(%api_addr, "REST API listening");
                if let Err(e) = axum::serve(listener, app).await {
                    tracing::error!(error = %e, "API server stopped");
                }
            }
            Err(e) => tracing::error!(error = %e, "failed to bind API listener"),
        }
    });

    // Forging scheduler.
    let forging_task = tokio::spawn(consensus::run_forging_loop(
        Arc::clone(&node),
        Arc::clone(&network),
        Duration::from_millis(config.consensus.slot_duration_ms),
    ));

    // Startup sync plus the periodic anti-entropy loop.
    if let Err(e) = node.sync_with_peers(&network).await {
        tracing::warn!(error = %e, "initial chain sync failed");
    }
    let sync_task = tokio::spawn(Arc::clone(&network).run_periodic_sync(
        node.id.clone(),
        Duration::from_secs(config.network.sync_interval_secs),
    ));

    // Run until a shutdown signal arrives, then reap the background tasks.
    Handlers::register_signals(tracer).await;
    api_task.abort();
    forging_task.abort();
    sync_task.abort();
    let _ = futures::join!(api_task, forging_task, sync_task);
    tracing_sub.shutdown();
    Ok(())
}
