//! Core types and shared functionality for skiff.
//!
//! This crate provides:
//! - The durable SQLite-backed store (cache generations + replay queue)
//! - The request/response model for intercepted traffic
//! - URL classification
//! - Unified error types
//! - Configuration structures

pub mod config;
pub mod error;
pub mod message;
pub mod routes;
pub mod store;

pub use config::AppConfig;
pub use error::Error;
pub use message::{WorkerRequest, WorkerResponse};
pub use routes::RouteClass;
pub use store::{CacheStore, DurableQueue, StoreDb};
