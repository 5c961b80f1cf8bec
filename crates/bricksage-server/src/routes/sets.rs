//! Stored-set routes — CRUD, search, structured filters.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::state::AppState;
use bricksage_core::LegoSet;
use bricksage_store::{SetFilter, SetHit};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sets", get(list_sets).post(add_set))
        .route("/sets/{set_id}", get(get_set).delete(delete_set))
        .route("/sets/search", post(search))
        .route("/sets/filter", post(filter))
}

// ---------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------

#[derive(Deserialize)]
struct ListQuery {
    page: Option<usize>,
    page_size: Option<usize>,
    ascending: Option<bool>,
}

async fn list_sets(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListQuery>,
) -> impl IntoResponse {
    let page = params.page.unwrap_or(1);
    let page_size = params.page_size.unwrap_or(10);
    let ascending = params.ascending.unwrap_or(false);

    match state.store.get_sets_paginated(page, page_size, ascending) {
        Ok((sets, total)) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "sets": sets,
                "total": total,
                "page": page,
                "pageSize": page_size,
                "totalPages": (total as f64 / page_size as f64).ceil() as i64,
            })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        ),
    }
}

async fn add_set(
    State(state): State<Arc<AppState>>,
    Json(set): Json<LegoSet>,
) -> impl IntoResponse {
    if let Err(e) = set.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": e.to_string() })),
        );
    }

    match state.store.upsert_set(&set) {
        Ok(()) => {
            state.queue_embedding(&set.set_id);
            (
                StatusCode::CREATED,
                Json(serde_json::json!({
                    "set_id": set.set_id,
                    "status": "stored",
                })),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        ),
    }
}

async fn get_set(
    State(state): State<Arc<AppState>>,
    Path(set_id): Path<String>,
) -> impl IntoResponse {
    match state.store.get_set(&set_id) {
        Ok(Some(set)) => (StatusCode::OK, Json(serde_json::json!({ "set": set }))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Set not found" })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        ),
    }
}

async fn delete_set(
    State(state): State<Arc<AppState>>,
    Path(set_id): Path<String>,
) -> impl IntoResponse {
    match state.store.delete_set(&set_id) {
        Ok(true) => (
            StatusCode::OK,
            Json(serde_json::json!({ "deleted": true, "set_id": set_id })),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Set not found" })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        ),
    }
}

// ---------------------------------------------------------------
// Search
// ---------------------------------------------------------------

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default = "default_top_k")]
    top_k: usize,
}

fn default_top_k() -> usize {
    10
}

async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> impl IntoResponse {
    let (hits, search_type) = search_store(&state, &req.query, req.top_k);

    // Re-rank against the parsed query (theme/modifier/keyword boosts)
    let parsed = bricksage_query::parse(&req.query);
    let candidates: Vec<LegoSet> = hits.iter().map(|h| h.set.clone()).collect();
    let ranked = bricksage_query::rank(&candidates, &parsed);

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "results": ranked,
            "total": ranked.len(),
            "query": req.query,
            "search_type": search_type,
            "parsed": parsed,
        })),
    )
}

/// Hybrid search when the embedder is up, BM25 otherwise.
pub fn search_store(state: &AppState, query: &str, top_k: usize) -> (Vec<SetHit>, &'static str) {
    if state.embedder.is_available() {
        if let Some(emb_result) = state.embedder.embed(query) {
            match state
                .store
                .hybrid_search(query, &emb_result.embedding, top_k * 2, top_k * 2, 60)
            {
                Ok(mut hits) => {
                    hits.truncate(top_k);
                    return (hits, "hybrid");
                }
                Err(e) => {
                    tracing::warn!("Hybrid search failed, falling back to BM25: {}", e);
                }
            }
        }
    }

    match state.store.bm25_search(query, top_k) {
        Ok(hits) => (hits, "bm25"),
        Err(e) => {
            tracing::error!("BM25 search failed: {}", e);
            (Vec::new(), "bm25")
        }
    }
}

async fn filter(
    State(state): State<Arc<AppState>>,
    Json(filter): Json<SetFilter>,
) -> impl IntoResponse {
    match state.store.filter_sets(&filter) {
        Ok(sets) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "results": sets,
                "total": sets.len(),
            })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        ),
    }
}
