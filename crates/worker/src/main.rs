//! skiffd entry point.
//!
//! Boots the interception worker in front of the configured origin: opens
//! the durable store, installs and activates the cache generation for this
//! build, starts the replay host, and serves intercepted traffic over HTTP.
//! Logging goes to stderr as JSON.

use std::sync::Arc;

use anyhow::Result;
use skiff_client::{HttpClient, HttpConfig, NetworkClient};
use skiff_core::{AppConfig, CacheStore, DurableQueue, StoreDb};
use tracing_subscriber::EnvFilter;

mod host;
mod router;
mod serve;
mod sync;
mod worker;

#[cfg(test)]
mod testing;

use worker::Worker;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;

    let db = StoreDb::open(&config.db_path).await?;
    let cache = CacheStore::new(db.clone(), &config.build_suffix);
    let queue = DurableQueue::new(db);

    let net: Arc<dyn NetworkClient> = Arc::new(HttpClient::new(HttpConfig {
        origin: config.origin.clone(),
        timeout: config.timeout(),
        credentials_header: config.credentials_header.clone(),
    })?);

    let (registrar, tags) = host::ChannelRegistrar::new();
    let worker = Arc::new(Worker::new(
        cache,
        queue,
        net,
        Some(registrar),
        config.precache_paths.clone(),
    ));

    // An offline boot cannot precache, but the previous generation still
    // serves; activation is skipped so it survives.
    match worker.install().await {
        Ok(()) => worker.activate().await,
        Err(e) => tracing::warn!(error = %e, "install failed; keeping existing cache generations"),
    }

    host::spawn_replay_host(Arc::clone(&worker), tags);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, origin = %config.origin, "skiffd intercepting requests");
    axum::serve(listener, serve::app(worker)).await?;

    Ok(())
}
