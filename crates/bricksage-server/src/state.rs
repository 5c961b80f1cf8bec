//! Shared application state.

use std::sync::Arc;

use bricksage_catalog::CatalogClient;
use bricksage_chat::LLMConfig;
use bricksage_core::BrickSageConfig;
use bricksage_infer::EmbedderBackend;
use bricksage_store::CatalogStore;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::debug;

/// A request to embed a stored set.
pub struct EmbedRequest {
    pub set_id: String,
}

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: BrickSageConfig,
    pub store: CatalogStore,
    pub embedder: Arc<dyn EmbedderBackend>,
    pub catalog: CatalogClient,
    pub llm_config: RwLock<LLMConfig>,
    pub embed_tx: mpsc::UnboundedSender<EmbedRequest>,
    embed_rx: parking_lot::Mutex<Option<mpsc::UnboundedReceiver<EmbedRequest>>>,
}

impl AppState {
    pub fn new(
        config: BrickSageConfig,
        store: CatalogStore,
        embedder: Arc<dyn EmbedderBackend>,
        catalog: CatalogClient,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let llm_config = LLMConfig::load(&config.data_paths.llm_config_file);

        Self {
            config,
            store,
            embedder,
            catalog,
            llm_config: RwLock::new(llm_config),
            embed_tx: tx,
            embed_rx: parking_lot::Mutex::new(Some(rx)),
        }
    }

    /// Take the embed receiver (can only be called once, by the worker).
    pub fn take_embed_rx(&self) -> Option<mpsc::UnboundedReceiver<EmbedRequest>> {
        self.embed_rx.lock().take()
    }

    /// Queue a set for background embedding.
    pub fn queue_embedding(&self, set_id: &str) {
        if !self.embedder.is_available() {
            return;
        }
        if self
            .embed_tx
            .send(EmbedRequest {
                set_id: set_id.to_string(),
            })
            .is_err()
        {
            debug!("Embed worker gone; dropping request for {}", set_id);
        }
    }
}
