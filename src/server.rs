//! HTTP read API over the published index.
//!
//! A thin dispatcher: every handler loads the current snapshot once and
//! answers from it, so a single response never mixes two snapshots.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Liveness probe (empty 200) |
//! | `GET` | `/health` | Version, chain count, last refresh time |
//! | `GET` | `/v1/chains` | Chain names |
//! | `GET` | `/v1/chain/{chain}` | Chain descriptor by name or chain id |
//! | `GET` | `/v1/chain/{chain}/endpoints/{type}` | `rpc`, `grpc`, `rest`, `peers`, or `seeds` |
//! | `GET` | `/v1/chain/{chain}/assets` | A chain's assets |
//! | `GET` | `/v1/assets` | Asset display names |
//! | `GET` | `/v1/asset/{asset}` | Asset by display name |
//!
//! A chain whose directory exists but whose `chain.json` is missing is
//! served as `{"chain_name": "<name>"}` with no endpoints or assets.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "no chain named or with id 'foo'" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404).

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::published::PublishedIndex;
use skymap_core::models::{Asset, EndpointKind};

/// Build the router serving `index`.
pub fn router(index: Arc<PublishedIndex>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/", get(|| async { StatusCode::OK }))
        .route("/health", get(handle_health))
        .route("/v1/chains", get(handle_chains))
        .route("/v1/chain/{chain}", get(handle_chain))
        .route(
            "/v1/chain/{chain}/endpoints/{kind}",
            get(handle_endpoints),
        )
        .route("/v1/chain/{chain}/assets", get(handle_chain_assets))
        .route("/v1/assets", get(handle_assets))
        .route("/v1/asset/{asset}", get(handle_asset))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(index)
}

/// Serve the read API on `listener` until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    index: Arc<PublishedIndex>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("server up on http://{}", addr);
    }
    axum::serve(listener, router(index))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    tracing::info!("server shut down");
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found",
        message: message.into(),
    }
}

fn unknown_chain(chain: &str) -> AppError {
    not_found(format!("no chain named or with id '{}'", chain))
}

// ============ GET /health ============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub chains: usize,
    /// Construction time of the served snapshot; `None` before the first refresh.
    pub last_refresh: Option<DateTime<Utc>>,
}

async fn handle_health(State(index): State<Arc<PublishedIndex>>) -> Json<HealthResponse> {
    let snap = index.current();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        chains: snap.chains().len(),
        last_refresh: (snap.built_at() != DateTime::UNIX_EPOCH).then(|| snap.built_at()),
    })
}

// ============ /v1 ============

async fn handle_chains(State(index): State<Arc<PublishedIndex>>) -> Response {
    Json(index.current().chains()).into_response()
}

async fn handle_assets(State(index): State<Arc<PublishedIndex>>) -> Response {
    Json(index.current().assets()).into_response()
}

async fn handle_chain(
    State(index): State<Arc<PublishedIndex>>,
    Path(chain): Path<String>,
) -> Result<Response, AppError> {
    let snap = index.current();
    let entry = snap.chain(&chain).ok_or_else(|| unknown_chain(&chain))?;
    Ok(match entry.record {
        Some(record) => Json(&record.chain).into_response(),
        None => Json(serde_json::json!({ "chain_name": entry.name })).into_response(),
    })
}

async fn handle_endpoints(
    State(index): State<Arc<PublishedIndex>>,
    Path((chain, kind)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let snap = index.current();
    if snap.chain(&chain).is_none() {
        return Err(unknown_chain(&chain));
    }
    let kind: EndpointKind = kind.parse().map_err(bad_request)?;
    let endpoints = snap
        .endpoints(&chain, kind)
        .ok_or_else(|| unknown_chain(&chain))?;
    Ok(Json(endpoints).into_response())
}

async fn handle_chain_assets(
    State(index): State<Arc<PublishedIndex>>,
    Path(chain): Path<String>,
) -> Result<Response, AppError> {
    let snap = index.current();
    let records = snap
        .chain_assets(&chain)
        .ok_or_else(|| unknown_chain(&chain))?;
    let assets: Vec<&Asset> = records.iter().map(|r| &r.asset).collect();
    Ok(Json(assets).into_response())
}

async fn handle_asset(
    State(index): State<Arc<PublishedIndex>>,
    Path(asset): Path<String>,
) -> Result<Response, AppError> {
    let snap = index.current();
    let record = snap
        .asset(&asset)
        .ok_or_else(|| not_found(format!("no asset with display name '{}'", asset)))?;
    Ok(Json(&record.asset).into_response())
}
