//! The interception worker and its lifecycle.
//!
//! Install pre-populates the cache generation for the current build; it does
//! not touch whichever generation is currently serving. Activation prunes
//! every other generation, leaving exactly one.

use std::sync::Arc;

use skiff_client::NetworkClient;
use skiff_core::routes::{APP_SHELL_PATH, INITIAL_DATA_PATH};
use skiff_core::{CacheStore, DurableQueue, Error, WorkerRequest};

use crate::host::ReplayRegistrar;

/// Per-process worker state. All handles are explicitly injected; nothing
/// here is module-scope state.
pub struct Worker {
    pub(crate) cache: CacheStore,
    pub(crate) queue: DurableQueue,
    pub(crate) net: Arc<dyn NetworkClient>,
    pub(crate) registrar: Option<Arc<dyn ReplayRegistrar>>,
    precache_paths: Vec<String>,
}

impl Worker {
    pub fn new(
        cache: CacheStore, queue: DurableQueue, net: Arc<dyn NetworkClient>,
        registrar: Option<Arc<dyn ReplayRegistrar>>, precache_paths: Vec<String>,
    ) -> Self {
        Self { cache, queue, net, registrar, precache_paths }
    }

    /// Pre-populate the current generation: the app-shell document, the
    /// initial-data payload (with credentials), and the configured static
    /// assets. A failed precache fetch fails install; the host may retry.
    pub async fn install(&self) -> Result<(), Error> {
        tracing::info!(generation = self.cache.generation(), "installing worker");

        self.precache(WorkerRequest::get(APP_SHELL_PATH)).await?;
        self.precache(WorkerRequest::get(INITIAL_DATA_PATH).with_credentials())
            .await?;
        for path in &self.precache_paths {
            self.precache(WorkerRequest::get(path)).await?;
        }

        Ok(())
    }

    async fn precache(&self, request: WorkerRequest) -> Result<(), Error> {
        let key = request.cache_key();
        let response = self.net.send(request).await?;
        if !response.is_success() {
            return Err(Error::Network(format!("precache of {key} returned status {}", response.status)));
        }
        self.cache.store(&key, &response).await
    }

    /// Prune every generation other than the current build's.
    ///
    /// A prune failure is logged and swallowed: a stale generation left
    /// behind is accepted degradation. In-flight reads holding the old
    /// generation are unaffected by the deletes.
    pub async fn activate(&self) {
        match self.cache.activate().await {
            Ok(pruned) => {
                tracing::info!(generation = self.cache.generation(), pruned, "activated worker");
            }
            Err(e) => {
                tracing::warn!(error = %e, "generation prune failed; stale generation left behind");
            }
        }
    }

    /// Queue keys that survived a process restart and still await replay.
    pub async fn pending_replays(&self) -> Result<Vec<String>, Error> {
        self.queue.keys().await
    }
}
