//! Durable staging queue for undelivered mutation payloads.
//!
//! Entries are created when a mutation cannot reach the origin and deleted
//! only after a replay confirms delivery. The backing table survives process
//! restarts; nothing here is in-memory state.

use super::connection::StoreDb;
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Keyed durable table of pending mutation payloads.
#[derive(Clone, Debug)]
pub struct DurableQueue {
    db: StoreDb,
}

impl DurableQueue {
    pub fn new(db: StoreDb) -> Self {
        Self { db }
    }

    /// Upsert a payload under `key`. Resolves once the write is committed.
    pub async fn put(&self, key: &str, payload: Vec<u8>) -> Result<(), Error> {
        let key = key.to_string();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO replay_queue (key, payload, queued_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET payload = excluded.payload, queued_at = excluded.queued_at",
                    params![key, payload, chrono::Utc::now().to_rfc3339()],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Point read. Returns None once the entry has been delivered and removed.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        let key = key.to_string();
        self.db
            .conn
            .call(move |conn| -> Result<Option<Vec<u8>>, Error> {
                let result = conn.query_row("SELECT payload FROM replay_queue WHERE key = ?1", params![key], |row| {
                    row.get::<_, Vec<u8>>(0)
                });

                match result {
                    Ok(payload) => Ok(Some(payload)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Remove an entry. Resolves once the delete is committed; removing an
    /// absent key is not an error.
    pub async fn delete(&self, key: &str) -> Result<(), Error> {
        let key = key.to_string();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute("DELETE FROM replay_queue WHERE key = ?1", params![key])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Keys of all live entries, oldest first.
    ///
    /// Used at startup to re-register replays for entries that survived a
    /// restart.
    pub async fn keys(&self) -> Result<Vec<String>, Error> {
        self.db
            .conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT key FROM replay_queue ORDER BY queued_at")?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
                let mut keys = Vec::new();
                for key in rows {
                    keys.push(key?);
                }
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }
}
