//! BrickSage — LEGO catalog aggregation and AI assistant server.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

mod embed_worker;
mod routes;
mod state;

use state::AppState;

fn resolve_data_dir() -> PathBuf {
    std::env::var("BRICKSAGE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        match args[1].as_str() {
            "--help" | "-h" | "help" => {
                println!("BrickSage — LEGO catalog aggregation and AI assistant server");
                println!();
                println!("Usage: bricksage");
                println!();
                println!("Environment:");
                println!("  PORT                 Listen port (default 8501)");
                println!("  BRICKSAGE_DATA_DIR   Data directory (default ./data)");
                println!("  OPENAI_API_KEY       LLM provider key");
                println!("  BRICKSET_API_KEY     Brickset catalog key");
                println!("  REBRICKABLE_API_KEY  Rebrickable catalog key");
                println!("  BRICKOWL_API_KEY     BrickOwl catalog key");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'bricksage help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = bricksage_core::BrickSageConfig::from_env(&data_dir)?;
    let port = config.port;

    let store = bricksage_store::CatalogStore::open(
        &config.data_paths.catalogdb,
        config.embedding_dim,
    )
    .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?;

    // ONNX embedder if available, otherwise BM25-only
    let embedder = bricksage_infer::create_embedder(&config.data_paths.models);

    let catalog =
        bricksage_catalog::CatalogClient::new(bricksage_catalog::CatalogConfig::from_env());
    info!(
        "Catalog providers configured: {:?}",
        catalog.config().configured_providers()
    );

    let state = Arc::new(AppState::new(config, store, embedder, catalog));

    // Background embedding queue
    embed_worker::start_embed_worker(state.clone());

    let app = routes::build_router(state.clone());

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("BrickSage server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
