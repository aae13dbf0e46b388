//! SQLite-backed durable store for cached responses and queued mutations.
//!
//! One database file holds both tables, opened once at process start with
//! async access via tokio-rusqlite. It supports:
//!
//! - Versioned cache generations, pruned to one on activation
//! - A durable replay queue for undelivered mutation payloads
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod cache;
pub mod connection;
pub mod migrations;
pub mod queue;

pub use crate::Error;

pub use cache::CacheStore;
pub use connection::StoreDb;
pub use queue::DurableQueue;
