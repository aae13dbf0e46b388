//! Network side of skiff.
//!
//! This crate provides the outbound HTTP client behind the `NetworkClient`
//! seam, and the generic race-fallback combinator used by the read paths.

pub mod net;
pub mod race;

pub use net::{HttpClient, HttpConfig, NetworkClient};
pub use race::first_successful;
