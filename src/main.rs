//! TTL Cache demo
//!
//! Builds a store from environment configuration, exercises it once and
//! shuts the janitor down.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ttl_cache::{CacheConfig, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttl_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CacheConfig::from_env();
    info!(
        "Configuration loaded: capacity={}, default_ttl={}s, cleanup_interval={}s, eviction_window={}",
        config.capacity,
        config.default_ttl.as_secs(),
        config.cleanup_interval.as_secs(),
        config.eviction_window
    );

    let cache: Store<String> = Store::new(config).context("failed to build cache")?;

    cache.put("test", "hello".to_string())?;
    let value = cache.get("test");
    info!("test => {:?}", value);

    let stats = serde_json::to_string(&cache.stats()).context("failed to encode stats")?;
    info!("Cache stats: {}", stats);

    cache.stop();
    cache.janitor().join().await;
    info!("Shutdown complete");
    Ok(())
}
