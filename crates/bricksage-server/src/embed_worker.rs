//! Background embedding queue — embeds stored sets asynchronously.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::state::AppState;

/// Start the background embedding worker task.
pub fn start_embed_worker(state: Arc<AppState>) {
    let mut rx = match state.take_embed_rx() {
        Some(rx) => rx,
        None => {
            error!("Embed worker already started");
            return;
        }
    };

    // Embed any sets left without embeddings by prior sessions
    let catchup_state = state.clone();
    tokio::spawn(async move {
        tokio::task::spawn_blocking(move || embed_pending_sets(&catchup_state))
            .await
            .ok();
    });

    tokio::spawn(async move {
        info!("Background embedding worker started");
        while let Some(request) = rx.recv().await {
            let worker_state = state.clone();
            let set_id = request.set_id;
            tokio::task::spawn_blocking(move || embed_set(&worker_state, &set_id))
                .await
                .ok();
        }
    });
}

/// Embed one stored set's description text.
fn embed_set(state: &AppState, set_id: &str) {
    if !state.embedder.is_available() {
        return;
    }

    let set = match state.store.get_set(set_id) {
        Ok(Some(set)) => set,
        Ok(None) => {
            debug!("Set {} vanished before embedding", set_id);
            return;
        }
        Err(e) => {
            error!("Failed to load set {} for embedding: {}", set_id, e);
            return;
        }
    };

    if let Some(result) = state.embedder.embed(set.embedding_text()) {
        if let Err(e) = state.store.store_embedding(set_id, &result.embedding) {
            error!("Failed to store embedding for {}: {}", set_id, e);
            return;
        }
        if let Err(e) = state.store.append_to_matrix(set_id, &result.embedding) {
            debug!("Matrix append deferred for {}: {}", set_id, e);
        }
        debug!("Embedded set {}", set_id);
    }
}

/// Embed stored sets that don't have embeddings yet, in batches.
fn embed_pending_sets(state: &AppState) {
    if !state.embedder.is_available() {
        return;
    }

    let batch_size = 50;
    let mut total = 0;

    loop {
        let sets = match state.store.sets_without_embedding(batch_size) {
            Ok(s) => s,
            Err(e) => {
                error!("Failed to list sets pending embedding: {}", e);
                break;
            }
        };

        if sets.is_empty() {
            break;
        }

        let mut embedded_this_batch = 0;
        for set in &sets {
            if let Some(result) = state.embedder.embed(set.embedding_text()) {
                if let Err(e) = state.store.store_embedding(&set.set_id, &result.embedding) {
                    error!("Failed to store embedding for {}: {}", set.set_id, e);
                    continue;
                }
                let _ = state.store.append_to_matrix(&set.set_id, &result.embedding);
                embedded_this_batch += 1;
            }
        }

        total += embedded_this_batch;
        // A batch that made no progress would repeat forever
        if embedded_this_batch == 0 {
            break;
        }
    }

    if total > 0 {
        info!("Embedded {} sets from prior sessions", total);
    }
}
