//! Outbound request delivery to the origin server.
//!
//! `NetworkClient` is the seam between the router and the wire: the router
//! only ever sees transport-level success or failure. An HTTP error status
//! is a resolved response, not an error, matching what the page itself would
//! observe from a plain fetch.

use async_trait::async_trait;
use reqwest::{Client, header};
use skiff_core::{Error, WorkerRequest, WorkerResponse};
use std::time::Duration;
use url::Url;

/// Delivers intercepted requests to the origin.
#[async_trait]
pub trait NetworkClient: Send + Sync {
    /// Deliver a request. `Ok` means the transport resolved, whatever the
    /// HTTP status; `Err` is a transport-level failure (offline, refused,
    /// reset, timeout).
    async fn send(&self, request: WorkerRequest) -> Result<WorkerResponse, Error>;
}

/// Configuration for the HTTP network client.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base URL of the origin server.
    pub origin: String,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Cookie value attached to with-credentials requests.
    pub credentials_header: Option<String>,
}

/// reqwest-backed `NetworkClient` bound to a single origin.
pub struct HttpClient {
    http: Client,
    origin: Url,
    credentials_header: Option<String>,
}

impl HttpClient {
    /// Build a client for the configured origin.
    pub fn new(config: HttpConfig) -> Result<Self, Error> {
        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.origin)))?;

        let http = Client::builder()
            .timeout(config.timeout)
            .use_rustls_tls()
            .gzip(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, origin, credentials_header: config.credentials_header })
    }
}

#[async_trait]
impl NetworkClient for HttpClient {
    async fn send(&self, request: WorkerRequest) -> Result<WorkerResponse, Error> {
        let url = self
            .origin
            .join(&request.path)
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", request.path)))?;

        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|_| Error::InvalidUrl(format!("unsupported method {}", request.method)))?;

        let mut builder = self.http.request(method, url);
        if let Some(content_type) = &request.content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        if request.credentials
            && let Some(credentials) = &self.credentials_header
        {
            builder = builder.header(header::COOKIE, credentials);
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        let response = builder.send().await.map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response: {e}")))?
            .to_vec();

        tracing::debug!(path = %request.path, status, bytes = body.len(), "origin responded");

        Ok(WorkerResponse { status, content_type, body })
    }
}
