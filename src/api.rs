//! REST API for the JUL node.
//!
//! A thin collaborator over the core: every verb delegates to the node and
//! the chain's read/write lock, maps domain errors onto HTTP statuses, and
//! speaks JUL floats only at this boundary. Broadcasts happen after the
//! ledger lock is released.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::NodeError;
use crate::ledger::Block;
use crate::networking::P2pNetwork;
use crate::node::Node;
use crate::queries::{self, BalanceView, MempoolEntry, NodeStatus, ValidatorView};
use crate::units::Amount;

/// Application state for API handlers.
#[derive(Clone)]
pub struct AppState {
    pub node: Arc<Node>,
    pub network: Arc<P2pNetwork>,
}

/// Shared application state type alias for API handlers.
pub type SharedAppState = Arc<AppState>;

/// Builds the REST router with every client verb registered.
pub fn rest_router(state: SharedAppState) -> Router {
    Router::new()
        .route("/wallet/create", post(create_wallet))
        .route("/balance/{address}", get(get_balance))
        .route("/transaction/send", post(send_transaction))
        .route("/block/forge", post(forge_block))
        .route("/stake", post(stake))
        .route("/unstake", post(unstake))
        .route("/purchase", post(purchase))
        .route("/chain", get(get_chain))
        .route("/mempool", get(get_mempool))
        .route("/validators", get(get_validators))
        .route("/community_fund", get(community_fund))
        .route("/status", get(get_status))
        .route("/sync", post(sync_chain))
        .with_state(state)
}

/// Domain error carried across the HTTP boundary.
struct ApiError(NodeError);

impl From<NodeError> for ApiError {
    fn from(e: NodeError) -> ApiError {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            NodeError::InvalidInput(_)
            | NodeError::InsufficientFunds
            | NodeError::OverStaked
            | NodeError::BelowMinimum(_)
            | NodeError::Crypto(_) => StatusCode::BAD_REQUEST,
            NodeError::ChainInvariant(_) => StatusCode::CONFLICT,
            NodeError::PeerUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            NodeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[derive(Serialize)]
struct CreateWalletResponse {
    address: String,
}

async fn create_wallet(
    State(state): State<SharedAppState>,
) -> Result<Json<CreateWalletResponse>, ApiError> {
    let address = state.node.create_wallet().await?;
    Ok(Json(CreateWalletResponse { address }))
}

async fn get_balance(
    State(state): State<SharedAppState>,
    Path(address): Path<String>,
) -> Result<Json<BalanceView>, ApiError> {
    let (spendable, staked) = state.node.balance(&address).await?;
    Ok(Json(BalanceView {
        address,
        spendable: spendable.to_jul(),
        staked: staked.to_jul(),
    }))
}

#[derive(Deserialize)]
struct SendTransactionRequest {
    from: String,
    to: String,
    /// Amount in JUL.
    amount: f64,
}

#[derive(Serialize)]
struct SendTransactionResponse {
    tx_id: String,
    fee: f64,
    total: f64,
}

async fn send_transaction(
    State(state): State<SharedAppState>,
    Json(req): Json<SendTransactionRequest>,
) -> Result<Json<SendTransactionResponse>, ApiError> {
    let amount = Amount::from_jul(req.amount);
    let tx = state.node.send_transaction(&req.from, &req.to, amount).await?;
    state.network.broadcast_transaction(&state.node.id, &tx).await;
    Ok(Json(SendTransactionResponse {
        tx_id: tx.id.clone(),
        fee: tx.fee.to_jul(),
        total: tx.total().to_jul(),
    }))
}

#[derive(Serialize)]
struct ForgeBlockResponse {
    block: Block,
    validator: String,
    reward: f64,
}

async fn forge_block(
    State(state): State<SharedAppState>,
) -> Result<Json<ForgeBlockResponse>, ApiError> {
    let forged = state.node.forge_block().await?;
    state.network.broadcast_block(&state.node.id, &forged.block).await;
    Ok(Json(ForgeBlockResponse {
        block: forged.block,
        validator: forged.validator,
        reward: forged.reward.to_jul(),
    }))
}

#[derive(Deserialize)]
struct StakeRequest {
    address: String,
    /// Amount in JUL.
    amount: f64,
}

async fn stake(
    State(state): State<SharedAppState>,
    Json(req): Json<StakeRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .node
        .stake(&req.address, Amount::from_jul(req.amount))
        .await?;
    Ok(Json(json!({ "staked": req.amount })))
}

async fn unstake(
    State(state): State<SharedAppState>,
    Json(req): Json<StakeRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .node
        .unstake(&req.address, Amount::from_jul(req.amount))
        .await?;
    Ok(Json(json!({ "unstaked": req.amount })))
}

#[derive(Deserialize)]
struct PurchaseRequest {
    address: String,
    usd_amount: f64,
}

#[derive(Serialize)]
struct PurchaseResponse {
    jul_credited: f64,
}

async fn purchase(
    State(state): State<SharedAppState>,
    Json(req): Json<PurchaseRequest>,
) -> Result<Json<PurchaseResponse>, ApiError> {
    let credited = state.node.purchase(&req.address, req.usd_amount).await?;
    Ok(Json(PurchaseResponse {
        jul_credited: credited.to_jul(),
    }))
}

async fn get_chain(State(state): State<SharedAppState>) -> Json<Vec<Block>> {
    let chain = state.node.chain.read().await;
    Json(chain.blocks().to_vec())
}

async fn get_mempool(State(state): State<SharedAppState>) -> Json<Vec<MempoolEntry>> {
    let chain = state.node.chain.read().await;
    Json(queries::mempool_view(&chain))
}

async fn get_validators(State(state): State<SharedAppState>) -> Json<Vec<ValidatorView>> {
    let chain = state.node.chain.read().await;
    Json(queries::validators_view(&chain))
}

async fn community_fund(State(state): State<SharedAppState>) -> Json<serde_json::Value> {
    let chain = state.node.chain.read().await;
    Json(json!({ "amount": chain.community_fund().to_jul() }))
}

async fn get_status(State(state): State<SharedAppState>) -> Json<NodeStatus> {
    let peer_count = state.network.peer_count().await;
    let chain = state.node.chain.read().await;
    Json(queries::status_view(&state.node.id, peer_count, &chain))
}

async fn sync_chain(State(state): State<SharedAppState>) -> Result<Json<NodeStatus>, ApiError> {
    state.node.sync_with_peers(&state.network).await?;
    let peer_count = state.network.peer_count().await;
    let chain = state.node.chain.read().await;
    Ok(Json(queries::status_view(&state.node.id, peer_count, &chain)))
}
