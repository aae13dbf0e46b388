//! Unified error types for skiff.

use tokio_rusqlite::rusqlite;

/// Unified error type for the interception layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A fallback consulted the cache and found nothing.
    ///
    /// This is the only error class normally surfaced to the application.
    #[error("no cached value for {0}")]
    NoCachedValue(String),

    /// Transport-level network failure (DNS, connection refused, reset).
    ///
    /// An HTTP error status is not a `Network` error; a response was
    /// received, so the transport succeeded.
    #[error("network error: {0}")]
    Network(String),

    /// Durable store operation failed.
    #[error("store error: {0}")]
    Store(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("store error: migration failed: {0}")]
    MigrationFailed(String),

    /// Request could not be built against the configured origin.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// The host runtime refused a replay registration.
    #[error("replay registration failed: {0}")]
    ReplayRegistration(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Store(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Store(tokio_rusqlite::Error::Close(c)),
            _ => Error::Store(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Store(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Store(tokio_rusqlite::Error::Error(err))
    }
}
