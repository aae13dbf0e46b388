//! Per-request routing: classify once, resolve once.
//!
//! Each intercepted request enters exactly one strategy and is terminal on
//! first resolution. The read paths race the network against a delayed cache
//! lookup; the mutation path falls back to the durable queue and waits for
//! replay confirmation.

use std::sync::Arc;
use std::time::Duration;

use skiff_client::first_successful;
use skiff_core::routes::{APP_SHELL_PATH, classify};
use skiff_core::{Error, RouteClass, WorkerRequest, WorkerResponse};
use tokio::time::sleep;
use uuid::Uuid;

use crate::host::ReplayRegistrar;
use crate::worker::Worker;

/// How long the app-shell path gives the network before consulting the cache.
const APP_SHELL_FALLBACK: Duration = Duration::from_millis(800);

/// How long the initial-data path gives the network before consulting the cache.
const INITIAL_DATA_FALLBACK: Duration = Duration::from_millis(1500);

/// First replay-confirmation poll interval; grows by [`REPLAY_POLL_STEP`]
/// each attempt.
const REPLAY_POLL_START: Duration = Duration::from_millis(2);
const REPLAY_POLL_STEP: Duration = Duration::from_millis(1);

impl Worker {
    /// Resolve one intercepted request.
    pub async fn handle_fetch(&self, request: WorkerRequest) -> Result<WorkerResponse, Error> {
        match classify(&request.path) {
            RouteClass::AppShell => self.app_shell(request).await,
            RouteClass::InitialData => self.initial_data(request).await,
            RouteClass::Mutation => self.mutation(request).await,
            RouteClass::Other => self.passthrough(request).await,
        }
    }

    /// Network first; after 800 ms without a result, the cached shell
    /// document. The shell lookup uses the fixed shell key, whatever app
    /// path was requested.
    async fn app_shell(&self, request: WorkerRequest) -> Result<WorkerResponse, Error> {
        tracing::debug!(path = %request.path, "fetch or delayed cache");

        let net = Arc::clone(&self.net);
        let cache = self.cache.clone();
        first_successful(
            async move { net.send(request).await },
            async move {
                sleep(APP_SHELL_FALLBACK).await;
                let key = WorkerRequest::get(APP_SHELL_PATH).cache_key();
                cache.lookup(&key).await?.ok_or_else(|| Error::NoCachedValue(key))
            },
        )
        .await
    }

    /// Network first, refreshing the cached payload on success; after
    /// 1500 ms without a result, the cached payload. The refresh completes
    /// even when the cache lookup has already won the race.
    async fn initial_data(&self, request: WorkerRequest) -> Result<WorkerResponse, Error> {
        tracing::debug!(path = %request.path, "(fetch and cache) or cache");

        let key = request.cache_key();
        let fallback_key = key.clone();
        let net = Arc::clone(&self.net);
        let store = self.cache.clone();
        let cache = self.cache.clone();
        let outbound = request.with_credentials();

        first_successful(
            async move {
                let response = net.send(outbound).await?;
                store.store(&key, &response).await?;
                Ok(response)
            },
            async move {
                sleep(INITIAL_DATA_FALLBACK).await;
                cache
                    .lookup(&fallback_key)
                    .await?
                    .ok_or_else(|| Error::NoCachedValue(fallback_key))
            },
        )
        .await
    }

    /// Network first; on transport failure, durably queue the body and wait
    /// for the replay to confirm delivery. Without a replay registrar the
    /// primary result is returned as-is.
    async fn mutation(&self, request: WorkerRequest) -> Result<WorkerResponse, Error> {
        let body = request.body.clone();
        let outbound = request.with_credentials();

        match self.net.send(outbound).await {
            Ok(response) => Ok(response),
            Err(primary_err) => {
                let Some(registrar) = &self.registrar else {
                    return Err(primary_err);
                };

                tracing::warn!(error = %primary_err, "mutation delivery failed; queueing for replay");
                match self.queue_for_replay(registrar, body).await {
                    Ok(response) => Ok(response),
                    Err(queue_err) => {
                        // Durability is lost; degrade to plain network behavior.
                        tracing::warn!(error = %queue_err, "replay queueing failed");
                        Err(primary_err)
                    }
                }
            }
        }
    }

    async fn queue_for_replay(
        &self, registrar: &Arc<dyn ReplayRegistrar>, payload: Vec<u8>,
    ) -> Result<WorkerResponse, Error> {
        let key = Uuid::new_v4().to_string();
        self.queue.put(&key, payload).await?;
        registrar.register(&key).await?;
        tracing::debug!(%key, "mutation queued for replay");

        // Entry disappearing from the queue is the delivery confirmation.
        let mut interval = REPLAY_POLL_START;
        loop {
            sleep(interval).await;
            if self.queue.get(&key).await?.is_none() {
                tracing::debug!(%key, "replay confirmed");
                return Ok(WorkerResponse::empty_ok());
            }
            interval += REPLAY_POLL_STEP;
        }
    }

    /// Cache first; network on miss, returned as-is whether it succeeds or
    /// fails.
    async fn passthrough(&self, request: WorkerRequest) -> Result<WorkerResponse, Error> {
        let key = request.cache_key();
        match self.cache.lookup(&key).await {
            Ok(Some(response)) => Ok(response),
            Ok(None) => self.net.send(request).await,
            Err(e) => {
                tracing::warn!(error = %e, "cache lookup failed; falling through to network");
                self.net.send(request).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ChannelRegistrar;
    use crate::testing::{FailingNet, FlakyNet, NeverNet, StaticNet, mem_db, text_response, worker_with};
    use skiff_core::routes::{INITIAL_DATA_PATH, MUTATION_PATH};
    use skiff_core::{CacheStore, DurableQueue};

    #[tokio::test(start_paused = true)]
    async fn test_app_shell_prefers_network() {
        let db = mem_db().await;
        let cache = CacheStore::new(db.clone(), "test");
        cache.store("GET /app/", &text_response("stale shell")).await.unwrap();

        let worker = worker_with(db, Arc::new(StaticNet(text_response("live shell"))), None);
        let response = worker.handle_fetch(WorkerRequest::get("/")).await.unwrap();
        assert_eq!(response.body, b"live shell");
    }

    #[tokio::test(start_paused = true)]
    async fn test_app_shell_falls_back_to_cache_when_network_hangs() {
        let db = mem_db().await;
        let cache = CacheStore::new(db.clone(), "test");
        cache.store("GET /app/", &text_response("cached shell")).await.unwrap();

        let worker = worker_with(db, Arc::new(NeverNet), None);
        let response = worker
            .handle_fetch(WorkerRequest::get("/app/settings"))
            .await
            .unwrap();
        assert_eq!(response.body, b"cached shell");
    }

    #[tokio::test(start_paused = true)]
    async fn test_app_shell_rejects_with_network_error_when_cache_empty() {
        let db = mem_db().await;
        let worker = worker_with(db, Arc::new(FailingNet), None);

        let result = worker.handle_fetch(WorkerRequest::get("/")).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_data_refreshes_cache_on_success() {
        let db = mem_db().await;
        let cache = CacheStore::new(db.clone(), "test");
        cache
            .store("GET /api/getInitialData", &text_response("stale data"))
            .await
            .unwrap();

        let worker = worker_with(db, Arc::new(StaticNet(text_response("fresh data"))), None);
        let response = worker
            .handle_fetch(WorkerRequest::get(INITIAL_DATA_PATH))
            .await
            .unwrap();

        assert_eq!(response.body, b"fresh data");
        let cached = cache.lookup("GET /api/getInitialData").await.unwrap().unwrap();
        assert_eq!(cached.body, b"fresh data");
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_data_served_from_cache_when_offline() {
        let db = mem_db().await;
        let cache = CacheStore::new(db.clone(), "test");
        cache
            .store("GET /api/getInitialData", &text_response("cached data"))
            .await
            .unwrap();

        let worker = worker_with(db, Arc::new(FailingNet), None);
        let response = worker
            .handle_fetch(WorkerRequest::get(INITIAL_DATA_PATH))
            .await
            .unwrap();

        assert_eq!(response.body, b"cached data");
        // The offline path leaves the cache untouched.
        let cached = cache.lookup("GET /api/getInitialData").await.unwrap().unwrap();
        assert_eq!(cached.body, b"cached data");
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_data_offline_without_cache_rejects() {
        let db = mem_db().await;
        let worker = worker_with(db, Arc::new(FailingNet), None);
        let result = worker.handle_fetch(WorkerRequest::get(INITIAL_DATA_PATH)).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }

    #[tokio::test]
    async fn test_mutation_passes_through_on_network_success() {
        let db = mem_db().await;
        let worker = worker_with(db, Arc::new(StaticNet(text_response("persisted"))), None);
        let response = worker
            .handle_fetch(WorkerRequest::post(MUTATION_PATH, b"{}".to_vec()))
            .await
            .unwrap();
        assert_eq!(response.body, b"persisted");
    }

    #[tokio::test]
    async fn test_mutation_without_registrar_propagates_failure() {
        let db = mem_db().await;
        let worker = worker_with(db.clone(), Arc::new(FailingNet), None);

        let result = worker
            .handle_fetch(WorkerRequest::post(MUTATION_PATH, b"{}".to_vec()))
            .await;

        assert!(matches!(result, Err(Error::Network(_))));
        assert!(DurableQueue::new(db).keys().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutation_queues_and_resolves_after_replay() {
        let db = mem_db().await;
        let (registrar, tags) = ChannelRegistrar::new();
        // First delivery fails, the replay succeeds.
        let worker = Arc::new(worker_with(db.clone(), Arc::new(FlakyNet::failing_once()), Some(registrar)));
        crate::host::spawn_replay_host(Arc::clone(&worker), tags);

        let response = worker
            .handle_fetch(WorkerRequest::post(MUTATION_PATH, b"{\"op\":1}".to_vec()))
            .await
            .unwrap();

        assert_eq!(response, WorkerResponse::empty_ok());
        assert!(DurableQueue::new(db).keys().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_mutations_get_distinct_keys() {
        let db = mem_db().await;
        let (registrar, mut tags) = ChannelRegistrar::new();
        let worker = Arc::new(worker_with(db.clone(), Arc::new(FailingNet), Some(registrar)));

        let first = tokio::spawn({
            let worker = Arc::clone(&worker);
            async move { worker.handle_fetch(WorkerRequest::post(MUTATION_PATH, b"one".to_vec())).await }
        });
        let second = tokio::spawn({
            let worker = Arc::clone(&worker);
            async move { worker.handle_fetch(WorkerRequest::post(MUTATION_PATH, b"two".to_vec())).await }
        });

        let tag_a = tags.recv().await.unwrap();
        let tag_b = tags.recv().await.unwrap();
        assert_ne!(tag_a, tag_b);

        // Confirm each delivery independently; both callers resolve.
        let queue = DurableQueue::new(db);
        queue.delete(&tag_a).await.unwrap();
        queue.delete(&tag_b).await.unwrap();

        assert_eq!(first.await.unwrap().unwrap(), WorkerResponse::empty_ok());
        assert_eq!(second.await.unwrap().unwrap(), WorkerResponse::empty_ok());
    }

    #[tokio::test]
    async fn test_other_prefers_cache() {
        let db = mem_db().await;
        let cache = CacheStore::new(db.clone(), "test");
        cache
            .store("GET /assets/main.js", &text_response("cached asset"))
            .await
            .unwrap();

        let worker = worker_with(db, Arc::new(FailingNet), None);
        let response = worker
            .handle_fetch(WorkerRequest::get("/assets/main.js"))
            .await
            .unwrap();
        assert_eq!(response.body, b"cached asset");
    }

    #[tokio::test]
    async fn test_other_misses_to_network() {
        let db = mem_db().await;
        let worker = worker_with(db, Arc::new(StaticNet(text_response("from origin"))), None);
        let response = worker
            .handle_fetch(WorkerRequest::get("/assets/other.js"))
            .await
            .unwrap();
        assert_eq!(response.body, b"from origin");
    }

    #[tokio::test]
    async fn test_other_miss_and_network_failure_rejects() {
        let db = mem_db().await;
        let worker = worker_with(db, Arc::new(FailingNet), None);
        let result = worker.handle_fetch(WorkerRequest::get("/assets/other.js")).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }
}
