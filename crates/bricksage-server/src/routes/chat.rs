//! Chat routes — assistant answers over retrieved catalog context.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::Stream;
use tokio_stream::StreamExt;
use tracing::warn;

use crate::routes::sets::search_store;
use crate::state::AppState;
use bricksage_chat::providers::{self, StreamChunk};
use bricksage_chat::{build_messages, AssistantContext};
use bricksage_chat::types::*;

type SseStream = Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>>;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chat/status", get(get_status))
        .route("/chat", post(chat))
        .route("/chat/stream", post(stream_chat))
        .route("/chat/config", get(get_config).put(update_config))
        .route("/chat/config/test", post(test_key))
}

// ---------------------------------------------------------------
// Status
// ---------------------------------------------------------------

async fn get_status(State(state): State<Arc<AppState>>) -> Json<ChatStatus> {
    let config = state.llm_config.read();
    let resolved = config.resolve_provider();

    Json(ChatStatus {
        llm_available: resolved.is_some(),
        llm_provider: resolved.as_ref().map(|(p, _, _)| p.to_string()),
        default_model: resolved.as_ref().map(|(_, m, _)| m.clone()),
        available_models: config.available_models(),
        semantic_search_available: state.embedder.is_available(),
        catalog_providers: state
            .catalog
            .config()
            .configured_providers()
            .iter()
            .map(|p| p.to_string())
            .collect(),
    })
}

// ---------------------------------------------------------------
// Non-streaming chat
// ---------------------------------------------------------------

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> impl IntoResponse {
    let start = Instant::now();

    let resolved = {
        let config = state.llm_config.read();
        config.resolve_provider()
    };
    let (provider, model, api_key) = match resolved {
        Some(r) => r,
        None => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "error": "No LLM provider configured" })),
            );
        }
    };

    let context = if req.use_context {
        build_context(&state, &req.message, req.top_k, req.live_search).await
    } else {
        AssistantContext::default()
    };

    let messages = build_messages(&context, &req.conversation_history, &req.message);

    let temperature = req.temperature.unwrap_or(0.7);
    let max_tokens = req.max_tokens.unwrap_or(2048);

    let client = reqwest::Client::new();
    let completion = providers::complete(
        &client,
        provider,
        &messages,
        &model,
        &api_key,
        temperature,
        max_tokens,
    )
    .await;

    let completion = match completion {
        Ok(c) => c,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            );
        }
    };

    // Surface the sets the answer drew on, best matches first
    let parsed = bricksage_query::parse(&req.message);
    let sets = bricksage_query::rank(&context.all_sets(), &parsed);

    let duration = start.elapsed().as_millis() as u64;
    let response = ChatResponse {
        message: completion.text,
        model,
        sets,
        tokens_used: Some(completion.tokens_used),
        duration: Some(duration),
    };

    (
        StatusCode::OK,
        Json(serde_json::to_value(response).unwrap()),
    )
}

// ---------------------------------------------------------------
// Streaming chat (SSE)
// ---------------------------------------------------------------

async fn stream_chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Sse<SseStream> {
    let start = Instant::now();

    let resolved = {
        let config = state.llm_config.read();
        config.resolve_provider()
    };

    let (provider, model, api_key) = match resolved {
        Some(r) => r,
        None => {
            let error_stream: SseStream = Box::pin(async_stream::stream! {
                let event = StreamEvent::Error {
                    error: "No LLM provider configured".into(),
                };
                yield Ok::<_, Infallible>(Event::default().data(
                    serde_json::to_string(&event).unwrap()
                ));
            });
            return Sse::new(error_stream);
        }
    };

    let context = if req.use_context {
        build_context(&state, &req.message, req.top_k, req.live_search).await
    } else {
        AssistantContext::default()
    };

    let messages = build_messages(&context, &req.conversation_history, &req.message);

    let temperature = req.temperature.unwrap_or(0.7);
    let max_tokens = req.max_tokens.unwrap_or(2048);

    let client = reqwest::Client::new();
    let llm_stream = providers::stream_llm(
        &client,
        provider,
        messages,
        &model,
        &api_key,
        temperature,
        max_tokens,
    );

    let parsed = bricksage_query::parse(&req.message);
    let context_sets = bricksage_query::rank(&context.all_sets(), &parsed);
    let model_clone = model.clone();

    let sse_stream: SseStream = Box::pin(async_stream::stream! {
        // First: emit the retrieved sets
        if !context_sets.is_empty() {
            let event = StreamEvent::Context { sets: context_sets };
            yield Ok::<_, Infallible>(Event::default().data(
                serde_json::to_string(&event).unwrap()
            ));
        }

        // Stream tokens from the LLM
        tokio::pin!(llm_stream);
        while let Some(chunk) = llm_stream.next().await {
            match chunk {
                StreamChunk::Token(text) => {
                    let event = StreamEvent::Token { content: text };
                    yield Ok(Event::default().data(
                        serde_json::to_string(&event).unwrap()
                    ));
                }
                StreamChunk::Done { tokens_used } => {
                    let duration = start.elapsed().as_millis() as u64;
                    let event = StreamEvent::Done {
                        model: model_clone.clone(),
                        tokens_used,
                        duration,
                    };
                    yield Ok(Event::default().data(
                        serde_json::to_string(&event).unwrap()
                    ));
                    // Final [DONE] marker
                    yield Ok(Event::default().data("[DONE]".to_string()));
                    return;
                }
                StreamChunk::Error(e) => {
                    let event = StreamEvent::Error { error: e };
                    yield Ok(Event::default().data(
                        serde_json::to_string(&event).unwrap()
                    ));
                    return;
                }
            }
        }
    });

    Sse::new(sse_stream)
}

// ---------------------------------------------------------------
// Config
// ---------------------------------------------------------------

async fn get_config(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let config = state.llm_config.read();
    Json(serde_json::to_value(config.to_response()).unwrap())
}

async fn update_config(
    State(state): State<Arc<AppState>>,
    Json(update): Json<LLMConfigUpdate>,
) -> impl IntoResponse {
    let mut config = state.llm_config.write();
    config.apply_update(&update);

    if let Err(e) = config.save() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": format!("Failed to save config: {}", e) })),
        );
    }

    (
        StatusCode::OK,
        Json(serde_json::to_value(config.to_response()).unwrap()),
    )
}

async fn test_key(Json(req): Json<TestKeyRequest>) -> impl IntoResponse {
    match providers::test_api_key(&req.provider, &req.api_key).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "success": true })),
        ),
        Err(e) => (
            StatusCode::OK,
            Json(serde_json::json!({ "success": false, "error": e })),
        ),
    }
}

// ---------------------------------------------------------------
// Context assembly
// ---------------------------------------------------------------

/// Gather the three context blocks for a question: structured rows from the
/// local catalog, semantic search hits, and live provider results.
async fn build_context(
    state: &AppState,
    query: &str,
    top_k: usize,
    live_search: bool,
) -> AssistantContext {
    let parsed = bricksage_query::parse(query);

    // Structured: name lookup first, modifier-driven filter as fallback
    let mut structured = state.store.find_by_name(query, top_k).unwrap_or_default();
    if structured.is_empty()
        && (parsed.theme.is_some() || parsed.year.is_some() || parsed.set_number.is_some())
    {
        let mut filter = bricksage_query::to_filter(&parsed);
        filter.limit = top_k;
        structured = state.store.filter_sets(&filter).unwrap_or_default();
    }

    // Semantic: hybrid or BM25 over the stored catalog
    let semantic = search_store(state, query, top_k)
        .0
        .into_iter()
        .map(|hit| hit.set)
        .collect();

    // Live: query the provider APIs and keep the local catalog warm.
    // A provider outage degrades to stored data only.
    let live = if live_search {
        match state.catalog.search_sets(query, top_k.min(5)).await {
            Ok(sets) => {
                for set in &sets {
                    if let Err(e) = state.store.upsert_set(set) {
                        warn!("Failed to store live result {}: {}", set.set_id, e);
                    } else {
                        state.queue_embedding(&set.set_id);
                    }
                }
                sets
            }
            Err(e) => {
                warn!("Live catalog search unavailable: {}", e);
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    AssistantContext {
        structured,
        semantic,
        live,
    }
}
