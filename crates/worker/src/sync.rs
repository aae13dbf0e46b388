//! Replay of queued mutations once connectivity returns.
//!
//! Invoked by the replay host with a tag equal to a previously registered
//! queue key. Deleting the queue entry is the sole signal that unblocks the
//! caller still polling in the mutation path.

use skiff_core::routes::MUTATION_PATH;
use skiff_core::{Error, WorkerRequest};

use crate::worker::Worker;

impl Worker {
    /// Re-issue the queued mutation for `tag`.
    ///
    /// On delivery the entry is removed; on failure it stays and the error
    /// is returned so the host's backoff policy can re-invoke with the same
    /// tag. No retry is scheduled here. A missing entry means the payload
    /// was already delivered; that is not an error.
    pub async fn sync(&self, tag: &str) -> Result<(), Error> {
        tracing::debug!(%tag, "replaying queued mutation");

        let Some(payload) = self.queue.get(tag).await? else {
            tracing::debug!(%tag, "no queue entry; already delivered");
            return Ok(());
        };

        let request = WorkerRequest::post(MUTATION_PATH, payload).with_credentials();
        self.net.send(request).await?;
        self.queue.delete(tag).await?;

        tracing::info!(%tag, "replay delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingNet, StaticNet, mem_db, text_response, worker_with};
    use skiff_core::DurableQueue;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_sync_delivers_and_deletes() {
        let db = mem_db().await;
        let queue = DurableQueue::new(db.clone());
        queue.put("tag-1", b"{\"op\":1}".to_vec()).await.unwrap();

        let worker = worker_with(db, Arc::new(StaticNet(text_response("ok"))), None);
        worker.sync("tag-1").await.unwrap();

        assert!(queue.get("tag-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sync_failure_keeps_entry() {
        let db = mem_db().await;
        let queue = DurableQueue::new(db.clone());
        queue.put("tag-1", b"{\"op\":1}".to_vec()).await.unwrap();

        let worker = worker_with(db, Arc::new(FailingNet), None);
        assert!(worker.sync("tag-1").await.is_err());

        assert!(queue.get("tag-1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sync_missing_tag_is_ok() {
        let db = mem_db().await;
        let worker = worker_with(db, Arc::new(FailingNet), None);
        worker.sync("never-registered").await.unwrap();
    }
}
