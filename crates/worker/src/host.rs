//! The replay host: registration and retry/backoff for queued mutations.
//!
//! This plays the role the platform's sync manager plays for a service
//! worker. The router registers a tag when it queues a mutation; the host
//! loop drives `Worker::sync` for each tag, retrying with capped exponential
//! backoff until delivery succeeds. Each tag gets its own task, so one stuck
//! replay never blocks the others.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use skiff_core::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::worker::Worker;

/// Capability to register a replay tag with the host runtime.
///
/// The router treats its absence as "no replay support": mutations then
/// resolve or reject directly from the network attempt.
#[async_trait]
pub trait ReplayRegistrar: Send + Sync {
    async fn register(&self, tag: &str) -> Result<(), Error>;
}

/// Registrar that feeds tags to the in-process replay host loop.
pub struct ChannelRegistrar {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelRegistrar {
    /// Build a registrar plus the receiving end for [`spawn_replay_host`].
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

#[async_trait]
impl ReplayRegistrar for ChannelRegistrar {
    async fn register(&self, tag: &str) -> Result<(), Error> {
        self.tx
            .send(tag.to_string())
            .map_err(|_| Error::ReplayRegistration("replay host is gone".to_string()))
    }
}

const RETRY_INITIAL: Duration = Duration::from_millis(500);
const RETRY_CAP: Duration = Duration::from_secs(60);

/// Start the replay host loop.
///
/// Entries already in the queue lost their registration when the previous
/// process exited, so the loop first re-registers those, then serves newly
/// registered tags until every registrar is dropped.
pub fn spawn_replay_host(worker: Arc<Worker>, mut tags: mpsc::UnboundedReceiver<String>) -> JoinHandle<()> {
    tokio::spawn(async move {
        match worker.pending_replays().await {
            Ok(backlog) => {
                for tag in backlog {
                    tracing::info!(%tag, "re-registering replay from previous run");
                    tokio::spawn(drive_replay(Arc::clone(&worker), tag));
                }
            }
            Err(e) => tracing::warn!(error = %e, "could not list pending replays"),
        }

        while let Some(tag) = tags.recv().await {
            tokio::spawn(drive_replay(Arc::clone(&worker), tag));
        }
    })
}

async fn drive_replay(worker: Arc<Worker>, tag: String) {
    let mut backoff = RETRY_INITIAL;
    loop {
        match worker.sync(&tag).await {
            Ok(()) => return,
            Err(e) => {
                tracing::warn!(%tag, error = %e, backoff_ms = backoff.as_millis() as u64, "replay failed; will retry");
                sleep(backoff).await;
                backoff = (backoff * 2).min(RETRY_CAP);
            }
        }
    }
}
