//! Request/response model for intercepted traffic.
//!
//! The host front-end converts inbound HTTP traffic into [`WorkerRequest`]
//! values; the router resolves each one to a [`WorkerResponse`] or an error.

/// An intercepted request on its way to the origin server.
#[derive(Debug, Clone)]
pub struct WorkerRequest {
    /// HTTP method, uppercase ("GET", "POST", ...).
    pub method: String,
    /// Path plus query string, as received from the page.
    pub path: String,
    /// Content-Type of the body, if any.
    pub content_type: Option<String>,
    /// Raw body bytes. Empty for body-less requests.
    pub body: Vec<u8>,
    /// Whether the outbound request carries the configured credentials.
    pub credentials: bool,
}

impl WorkerRequest {
    /// A body-less GET for `path`, without credentials.
    pub fn get(path: &str) -> Self {
        Self {
            method: "GET".to_string(),
            path: path.to_string(),
            content_type: None,
            body: Vec::new(),
            credentials: false,
        }
    }

    /// A POST carrying `body`, without credentials.
    pub fn post(path: &str, body: Vec<u8>) -> Self {
        Self { method: "POST".to_string(), path: path.to_string(), content_type: None, body, credentials: false }
    }

    /// Mark the request to be delivered with credentials attached.
    pub fn with_credentials(mut self) -> Self {
        self.credentials = true;
        self
    }

    /// Request identity used as the cache key: method plus path.
    pub fn cache_key(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// A response produced by the network, the cache, or replay completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerResponse {
    /// HTTP status code.
    pub status: u16,
    /// Content-Type header value, if any.
    pub content_type: Option<String>,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl WorkerResponse {
    /// The synthetic empty success returned once a queued mutation has been
    /// confirmed delivered.
    pub fn empty_ok() -> Self {
        Self { status: 200, content_type: None, body: Vec::new() }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
