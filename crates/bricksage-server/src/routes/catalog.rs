//! Live catalog routes — fetch and search against the provider APIs.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::warn;

use crate::state::AppState;
use bricksage_core::Error;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/catalog/sets/{set_id}", get(fetch_set))
        .route("/catalog/search", post(search))
}

/// GET /api/catalog/sets/{set_id} — fetch from the providers, store locally.
async fn fetch_set(
    State(state): State<Arc<AppState>>,
    Path(set_id): Path<String>,
) -> impl IntoResponse {
    match state.catalog.fetch_set(&set_id).await {
        Ok(set) => {
            if let Err(e) = state.store.upsert_set(&set) {
                warn!("Failed to store fetched set {}: {}", set.set_id, e);
            } else {
                state.queue_embedding(&set.set_id);
            }
            (StatusCode::OK, Json(serde_json::json!({ "set": set })))
        }
        Err(Error::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("Set {} not found", set_id) })),
        ),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({ "error": e.to_string() })),
        ),
    }
}

#[derive(Deserialize)]
struct CatalogSearchRequest {
    query: String,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    5
}

/// POST /api/catalog/search — search Brickset, hydrate and store results.
async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CatalogSearchRequest>,
) -> impl IntoResponse {
    match state.catalog.search_sets(&req.query, req.limit).await {
        Ok(sets) => {
            for set in &sets {
                if let Err(e) = state.store.upsert_set(set) {
                    warn!("Failed to store set {}: {}", set.set_id, e);
                } else {
                    state.queue_embedding(&set.set_id);
                }
            }
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "results": sets,
                    "total": sets.len(),
                    "query": req.query,
                })),
            )
        }
        Err(Error::Config(msg)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": msg })),
        ),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({ "error": e.to_string() })),
        ),
    }
}
