//! Shared test doubles for the worker's unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use skiff_client::NetworkClient;
use skiff_core::{CacheStore, DurableQueue, Error, StoreDb, WorkerRequest, WorkerResponse};

use crate::host::ReplayRegistrar;
use crate::worker::Worker;

pub async fn mem_db() -> StoreDb {
    StoreDb::open_in_memory().await.unwrap()
}

pub fn text_response(body: &str) -> WorkerResponse {
    WorkerResponse { status: 200, content_type: Some("text/html".to_string()), body: body.as_bytes().to_vec() }
}

/// Worker over an in-memory store with generation suffix "test".
pub fn worker_with(db: StoreDb, net: Arc<dyn NetworkClient>, registrar: Option<Arc<dyn ReplayRegistrar>>) -> Worker {
    Worker::new(CacheStore::new(db.clone(), "test"), DurableQueue::new(db), net, registrar, vec![])
}

/// Always responds with the same payload.
pub struct StaticNet(pub WorkerResponse);

#[async_trait]
impl NetworkClient for StaticNet {
    async fn send(&self, _request: WorkerRequest) -> Result<WorkerResponse, Error> {
        Ok(self.0.clone())
    }
}

/// Always fails at the transport level.
pub struct FailingNet;

#[async_trait]
impl NetworkClient for FailingNet {
    async fn send(&self, _request: WorkerRequest) -> Result<WorkerResponse, Error> {
        Err(Error::Network("connection refused".to_string()))
    }
}

/// Never resolves, like a request stalled on a dead link.
pub struct NeverNet;

#[async_trait]
impl NetworkClient for NeverNet {
    async fn send(&self, _request: WorkerRequest) -> Result<WorkerResponse, Error> {
        std::future::pending().await
    }
}

/// Fails the first `failures` sends, then succeeds with an empty 200.
pub struct FlakyNet {
    failures: usize,
    calls: AtomicUsize,
}

impl FlakyNet {
    pub fn failing(failures: usize) -> Self {
        Self { failures, calls: AtomicUsize::new(0) }
    }

    pub fn failing_once() -> Self {
        Self::failing(1)
    }
}

#[async_trait]
impl NetworkClient for FlakyNet {
    async fn send(&self, _request: WorkerRequest) -> Result<WorkerResponse, Error> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            Err(Error::Network("connection refused".to_string()))
        } else {
            Ok(WorkerResponse::empty_ok())
        }
    }
}
