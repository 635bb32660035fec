//! Axum route handlers for the local status API.

use crate::roster;
use crate::sync::SyncEngine;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use bio_roster_types::*;
use std::sync::Arc;
use std::time::Instant;

pub struct AppState {
    pub engine: Arc<SyncEngine>,
    pub start_time: Instant,
}

pub fn router(state: Arc<AppState>) -> axum::Router {
    axum::Router::new()
        .route("/rpc/status", axum::routing::get(status))
        .route("/rpc/roster", axum::routing::get(roster_entries))
        .route("/rpc/roster/refresh", axum::routing::post(refresh_roster))
        .with_state(state)
        .layer(tower_http::cors::CorsLayer::permissive())
}

// GET /rpc/status
pub async fn status(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<RpcResponse<ServiceStatus>>) {
    let cache = state.engine.cache();
    (
        StatusCode::OK,
        Json(RpcResponse::ok(ServiceStatus {
            running: true,
            uptime_secs: state.start_time.elapsed().as_secs(),
            cache_initialized: cache.is_initialized(),
            member_count: cache.len(),
            refreshed_at: cache.refreshed_at().map(|t| t.to_rfc3339()),
        })),
    )
}

// GET /rpc/roster
pub async fn roster_entries(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<RpcResponse<Vec<RosterEntry>>>) {
    match state.engine.roster().await {
        Ok(records) => (StatusCode::OK, Json(RpcResponse::ok(roster::render(&records)))),
        Err(e) => (StatusCode::BAD_GATEWAY, Json(RpcResponse::err(e.to_string()))),
    }
}

// POST /rpc/roster/refresh
pub async fn refresh_roster(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<RpcResponse<usize>>) {
    match state.engine.refresh(true).await {
        Ok(records) => (StatusCode::OK, Json(RpcResponse::ok(records.len()))),
        Err(e) => (StatusCode::BAD_GATEWAY, Json(RpcResponse::err(e.to_string()))),
    }
}
