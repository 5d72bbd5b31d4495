mod cache;
mod catalog;
mod config;
mod error;
mod executor;
mod extract;
mod feeds;
mod model;
mod permute;
mod pipeline;
mod rank;
mod score;
mod server;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rmcp::{ServiceExt, transport::stdio};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cache::TenderCache;
use catalog::CatalogIndex;
use config::Config;
use feeds::FeedRegistry;
use pipeline::Pipeline;
use server::TenderSearchServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing to stderr (stdout is reserved for MCP JSON-RPC)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting tender-search MCP server");

    // 1. Load config from environment
    let config = Config::from_env()?;
    info!(
        feeds_dir = %config.feeds_dir,
        catalog_dir = config.catalog_dir.as_deref().unwrap_or("<builtin>"),
        redis = config.redis_url.is_some(),
        "configuration loaded"
    );

    // 2. Connect to Redis (optional — graceful degradation if unavailable)
    let redis_cache = tender_common::redis::RedisCache::new(config.redis_url.as_deref());
    if redis_cache.is_available().await {
        info!("redis connected");
    } else {
        info!("redis unavailable, running without cache");
    }
    let cache = Arc::new(TenderCache::new(redis_cache));

    // 3. Build the catalog index (bundled data, optionally overridden per category)
    let catalog = match config.catalog_dir.as_deref() {
        Some(dir) => Arc::new(CatalogIndex::load(Path::new(dir))),
        None => Arc::new(CatalogIndex::builtin()),
    };
    info!(categories = catalog.categories().count(), "catalog index ready");

    // 4. Register tender feeds
    let registry = FeedRegistry::new(PathBuf::from(&config.feeds_dir));
    let feed_ids = registry.feed_ids();
    info!(feeds = feed_ids.len(), ids = ?feed_ids, "feed registry ready");

    // 5. Build MCP server and serve on stdio
    let pipeline = Arc::new(Pipeline::new(catalog, registry, cache));
    let server = TenderSearchServer::new(pipeline);

    info!("MCP server ready, serving on stdio");
    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!(error = %e, "MCP server error");
    })?;

    service.waiting().await?;
    info!("MCP server shut down");
    Ok(())
}
