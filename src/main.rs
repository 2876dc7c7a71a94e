//! Cache Ledger demo
//!
//! Exercises the instrumented store against an in-process memory store, then
//! fetches every url given on the command line twice through the content
//! cache.
//!
//! ```text
//! cache_ledger http://example.com
//! ```

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cache_ledger::cache::STORE_OPERATION;
use cache_ledger::{
    spawn_cleanup_task, Config, ContentCache, HttpOrigin, InstrumentedStore, MemoryStore,
    ReplayReporter,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cache_ledger=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: content_ttl={}s, origin_timeout={}s, cleanup_interval={}s",
        config.content_ttl, config.origin_timeout, config.cleanup_interval
    );

    let store = Arc::new(MemoryStore::new());
    let cleanup_handle = spawn_cleanup_task(store.clone(), config.cleanup_interval);

    let cache = InstrumentedStore::initialize(store.clone()).await?;
    let text_key = cache.store("foo").await?;
    let int_key = cache.store(42).await?;
    cache.store(b"bar".to_vec()).await?;

    println!("{text_key} = {:?}", cache.get_str(&text_key).await?);
    println!("{int_key} = {:?}", cache.get_int(&int_key).await?);

    let reporter = ReplayReporter::new(store.clone());
    println!("{}", reporter.replay(STORE_OPERATION).await?.render_with_header());

    let urls: Vec<String> = std::env::args().skip(1).collect();
    if !urls.is_empty() {
        let content = ContentCache::from_config(store.clone(), &config);
        let origin = HttpOrigin::from_config(&config)?;

        for url in &urls {
            for _ in 0..2 {
                let body = content
                    .fetch(url, &origin)
                    .await
                    .with_context(|| format!("fetching {url}"))?;
                println!("{url}: {} bytes", body.len());
            }
            println!("{url} accessed {} times", content.access_count(url).await?);
        }
        println!("{}", serde_json::to_string(&content.stats())?);
    }

    cleanup_handle.abort();
    info!("Shutdown complete");
    Ok(())
}
