//! Versioned response cache, one generation live at a time.
//!
//! Each deployed build writes its responses under a generation named for the
//! build suffix. Install populates the new generation without touching the
//! one currently serving; activation deletes every other generation, leaving
//! exactly one.

use super::connection::StoreDb;
use crate::message::WorkerResponse;
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Handle on the cache table, bound to the current build's generation.
#[derive(Clone, Debug)]
pub struct CacheStore {
    db: StoreDb,
    generation: String,
}

impl CacheStore {
    /// Bind a cache handle to the generation for `build_suffix`.
    pub fn new(db: StoreDb, build_suffix: &str) -> Self {
        Self { db, generation: format!("skiff-{build_suffix}") }
    }

    /// Name of the generation this handle reads and writes.
    pub fn generation(&self) -> &str {
        &self.generation
    }

    /// Insert or refresh a cached response in the current generation.
    ///
    /// Uses UPSERT semantics: inserts if the key doesn't exist, replaces the
    /// stored response if it does.
    pub async fn store(&self, request_key: &str, response: &WorkerResponse) -> Result<(), Error> {
        let generation = self.generation.clone();
        let request_key = request_key.to_string();
        let response = response.clone();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO cache_entries (generation, request_key, status, content_type, body, stored_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(generation, request_key) DO UPDATE SET
                        status = excluded.status,
                        content_type = excluded.content_type,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![
                        generation,
                        request_key,
                        response.status as i64,
                        &response.content_type,
                        &response.body,
                        chrono::Utc::now().to_rfc3339(),
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Read-only match against the current generation.
    ///
    /// Returns None if the key has never been cached for this build.
    pub async fn lookup(&self, request_key: &str) -> Result<Option<WorkerResponse>, Error> {
        let generation = self.generation.clone();
        let request_key = request_key.to_string();
        self.db
            .conn
            .call(move |conn| -> Result<Option<WorkerResponse>, Error> {
                let result = conn.query_row(
                    "SELECT status, content_type, body FROM cache_entries
                     WHERE generation = ?1 AND request_key = ?2",
                    params![generation, request_key],
                    |row| {
                        Ok(WorkerResponse {
                            status: row.get::<_, i64>(0)? as u16,
                            content_type: row.get(1)?,
                            body: row.get(2)?,
                        })
                    },
                );

                match result {
                    Ok(response) => Ok(Some(response)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every generation other than the current one.
    ///
    /// Idempotent; activating twice leaves the same single generation.
    /// Returns the number of pruned entries.
    pub async fn activate(&self) -> Result<u64, Error> {
        let generation = self.generation.clone();
        self.db
            .conn
            .call(move |conn| -> Result<u64, Error> {
                let pruned = conn.execute("DELETE FROM cache_entries WHERE generation != ?1", params![generation])?;
                Ok(pruned as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Distinct generation names currently present in the store.
    pub async fn generations(&self) -> Result<Vec<String>, Error> {
        self.db
            .conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT DISTINCT generation FROM cache_entries ORDER BY generation")?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
                let mut names = Vec::new();
                for name in rows {
                    names.push(name?);
                }
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }
}
