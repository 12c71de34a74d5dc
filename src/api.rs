//! HTTP/JSON surface of the node: chain queries, staking, wallet helpers,
//! transaction submission and a minimal JSON-RPC 2.0 endpoint.

use axum::{
    extract::{rejection::JsonRejection, Path, Request, State},
    http::{self, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, RwLock};
use tower_http::cors::{Any, CorsLayer};

use crate::blockchain::{Block, ChainStats, Ledger, ValidatorRecord};
use crate::error::ChainError;
use crate::node::NodeState;
use crate::transaction::validation::{validate_address, validate_amount, ValidationError};
use crate::transaction::{calculate_fee, Transaction, BASE_FEE};
use crate::wallet::{self, Account};

/// JSON-RPC "method not found"
pub const RPC_METHOD_NOT_FOUND: i64 = -32601;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct ApiNode {
    pub ledger: Ledger,
    pub node_address: String,
    // Optional orchestrator state for health checks and request logging
    pub state: Option<Arc<RwLock<NodeState>>>,
}

impl ApiNode {
    pub fn new_shared(ledger: Ledger, node_address: String, state: Option<Arc<RwLock<NodeState>>>) -> Self {
        Self {
            ledger,
            node_address,
            state,
        }
    }
}

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    Chain(ChainError),
    InvalidInput(String),
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Chain(e) => {
                let status = match e {
                    ChainError::Validation(_)
                    | ChainError::CapacityExceeded { .. }
                    | ChainError::WalletError(_) => StatusCode::BAD_REQUEST,
                    ChainError::SupplyExhausted => StatusCode::SERVICE_UNAVAILABLE,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.to_string())
            }
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        ApiError::Chain(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Chain(ChainError::Validation(err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct StakeRequest {
    pub address: String,
    pub amount: String,
}

#[derive(Deserialize)]
pub struct RecoverRequest {
    pub mnemonic: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTransactionRequest {
    pub transaction: Transaction,
    pub private_key: String,
}

#[derive(Serialize, Deserialize)]
pub struct SendTransactionResponse {
    pub status: String,
    pub hash: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeRequest {
    pub gas: i64,
    pub gas_price: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeResponse {
    pub fee: String,
    pub base_fee: u64,
    pub gas_price: String,
    pub gas_limit: i64,
}

#[derive(Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub id: Value,
}

// ============================================================================
// Middleware
// ============================================================================

/// Logs method, path, status, duration and the orchestrator state when known.
async fn logging_middleware(State(node): State<Arc<ApiNode>>, req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    let node_state = match &node.state {
        Some(s) => format!("{:?}", s.read().await),
        None => "unknown".to_string(),
    };

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        node_state = %node_state,
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

/// Build the API router with all endpoints
pub fn build_api_router(node: Arc<ApiNode>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![http::Method::GET, http::Method::POST, http::Method::OPTIONS])
        .allow_headers(vec![http::header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(home))
        .route("/health", get(health_check))
        .route("/rpc", post(handle_rpc))
        // Chain queries
        .route("/blocks", get(get_blocks))
        .route("/block/:index", get(get_block))
        .route("/transactions", get(get_transactions))
        .route("/validators", get(get_validators))
        .route("/stats", get(get_stats))
        // Staking
        .route("/stake", post(stake))
        // Wallet
        .route("/wallet/create", post(create_wallet))
        .route("/wallet/recover", post(recover_wallet))
        // Transactions
        .route("/transaction/send", post(send_transaction))
        .route("/transaction/fee", post(transaction_fee))
        .layer(middleware::from_fn_with_state(node.clone(), logging_middleware))
        .with_state(node)
        .layer(cors)
}

/// Serve the router on `0.0.0.0:port` until `shutdown` flips to true.
pub async fn run_api_server(
    node: Arc<ApiNode>,
    port: u16,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_api_router(node);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("✅ Node ready on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await.map(|_| ());
        })
        .await?;

    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn home(State(node): State<Arc<ApiNode>>) -> impl IntoResponse {
    let config = node.ledger.chain_config();
    Json(json!({
        "chain": config.chain_name,
        "version": env!("CARGO_PKG_VERSION"),
        "node": node.node_address,
        "status": "running",
        "chainId": config.chain_id,
    }))
}

async fn health_check(State(node): State<Arc<ApiNode>>) -> impl IntoResponse {
    let state = match &node.state {
        Some(s) => s.read().await.clone(),
        // No orchestrator state available; assume healthy
        None => NodeState::Ready,
    };
    if state == NodeState::Ready {
        (StatusCode::OK, Json(json!({ "status": "healthy" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unhealthy", "nodeState": format!("{:?}", state) })),
        )
    }
}

async fn get_blocks(State(node): State<Arc<ApiNode>>) -> Json<Vec<Block>> {
    Json(node.ledger.blocks())
}

async fn get_block(State(node): State<Arc<ApiNode>>, Path(index): Path<u64>) -> Result<Json<Block>, ApiError> {
    node.ledger
        .block(index)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Block {} not found", index)))
}

async fn get_transactions(State(node): State<Arc<ApiNode>>) -> Json<Vec<Transaction>> {
    Json(node.ledger.pending_transactions())
}

async fn get_validators(State(node): State<Arc<ApiNode>>) -> Json<BTreeMap<String, ValidatorRecord>> {
    Json(node.ledger.validators())
}

async fn get_stats(State(node): State<Arc<ApiNode>>) -> Json<ChainStats> {
    Json(node.ledger.stats(&node.node_address))
}

async fn stake(
    State(node): State<Arc<ApiNode>>,
    payload: Result<Json<StakeRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = payload?;

    validate_address(&req.address)
        .map_err(|reason| ValidationError::InvalidAddress { field: "validator", reason })?;
    let max_supply = node.ledger.read(|s| s.params().max_supply);
    validate_amount(&req.amount, max_supply)?;

    node.ledger.register_validator(&req.address, &req.amount)?;
    tracing::info!("Validator {} staked {}", req.address, req.amount);

    Ok(Json(json!({ "status": "staked" })))
}

async fn create_wallet() -> Result<Json<Account>, ApiError> {
    Ok(Json(wallet::create_account()?))
}

async fn recover_wallet(payload: Result<Json<RecoverRequest>, JsonRejection>) -> Result<Json<Account>, ApiError> {
    let Json(req) = payload?;
    Ok(Json(wallet::recover_account(&req.mnemonic)?))
}

async fn send_transaction(
    State(node): State<Arc<ApiNode>>,
    payload: Result<Json<SendTransactionRequest>, JsonRejection>,
) -> Result<Json<SendTransactionResponse>, ApiError> {
    let Json(req) = payload?;
    let mut tx = req.transaction;

    node.ledger.admit(&tx)?;
    wallet::sign_transaction(&mut tx, &req.private_key)?;
    let queued = node.ledger.enqueue_transaction(tx);

    Ok(Json(SendTransactionResponse {
        status: "pending".to_string(),
        hash: queued.hash,
    }))
}

async fn transaction_fee(payload: Result<Json<FeeRequest>, JsonRejection>) -> Result<Json<FeeResponse>, ApiError> {
    let Json(req) = payload?;
    let fee = calculate_fee(req.gas, &req.gas_price)?;

    Ok(Json(FeeResponse {
        fee: fee.to_string(),
        base_fee: BASE_FEE,
        gas_price: req.gas_price,
        gas_limit: req.gas,
    }))
}

async fn handle_rpc(
    State(node): State<Arc<ApiNode>>,
    payload: Result<Json<RpcRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = payload?;
    Ok(Json(rpc_response(&node, &req)))
}

fn rpc_response(node: &ApiNode, req: &RpcRequest) -> Value {
    let (chain_id, network_id, height) =
        node.ledger.read(|s| (s.config().chain_id, s.config().network_id, s.tip().index));

    let result = match req.method.as_str() {
        "eth_chainId" => Some(format!("0x{:x}", chain_id)),
        "eth_blockNumber" => Some(format!("0x{:x}", height)),
        "net_version" => Some(network_id.to_string()),
        _ => None,
    };

    match result {
        Some(result) => json!({ "jsonrpc": "2.0", "id": req.id, "result": result }),
        None => json!({
            "jsonrpc": "2.0",
            "id": req.id,
            "error": { "code": RPC_METHOD_NOT_FOUND, "message": "Method not found" },
        }),
    }
}
