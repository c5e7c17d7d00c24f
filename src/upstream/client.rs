//! Docker Engine API client
//!
//! Forwards proxied requests to the upstream Docker daemon and buffers the
//! answer so the response filters can rewrite it.

use crate::config::UpstreamConfig;
use crate::error::{UpstreamError, UpstreamResult};
use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, Method, StatusCode, header};
use reqwest::redirect::Policy;
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Headers that describe a single connection, or that belong to the proxy,
/// and must not be forwarded upstream. Accept-Encoding is dropped so the
/// filters always receive plain JSON.
const NON_FORWARDED_HEADERS: [HeaderName; 11] = [
    header::CONNECTION,
    header::HOST,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::CONTENT_LENGTH,
    header::AUTHORIZATION,
    header::ACCEPT_ENCODING,
];

/// A fully buffered upstream response
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl UpstreamResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }
}

/// Docker Engine API client
pub struct DockerClient {
    http: Client,
    base_url: String,
    max_retries: u32,
    timeout_secs: u64,
}

impl DockerClient {
    /// Create a new client from configuration
    pub fn new(config: &UpstreamConfig) -> UpstreamResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            // upstream redirects are relayed to the client, never followed
            .redirect(Policy::none())
            .user_agent(format!("dockgate/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(UpstreamError::Request)?;

        Ok(Self {
            http,
            base_url: config.base_url().to_string(),
            max_retries: config.max_retries,
            timeout_secs: config.timeout_secs,
        })
    }

    /// Build a URL for an API path (with query string)
    fn url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base_url, path_and_query)
    }

    /// Forward a request to the Docker daemon
    #[instrument(skip(self, headers, body), fields(method = %method, path = %path_and_query))]
    pub async fn forward(
        &self,
        method: Method,
        path_and_query: &str,
        headers: &HeaderMap,
        body: Bytes,
    ) -> UpstreamResult<UpstreamResponse> {
        let retries = if is_idempotent(&method) {
            self.max_retries
        } else {
            0
        };

        let request = self
            .http
            .request(method, self.url(path_and_query))
            .headers(forwarded_headers(headers))
            .body(body);

        let response = self.execute(request, retries).await?;
        self.buffer(response).await
    }

    /// Execute a request with retries
    async fn execute(&self, request: RequestBuilder, retries: u32) -> UpstreamResult<Response> {
        let mut last_error = None;

        for attempt in 0..=retries {
            if attempt > 0 {
                tokio::time::sleep(backoff_delay(attempt)).await;
                debug!("Retrying upstream request (attempt {})", attempt + 1);
            }

            let req = request.try_clone().ok_or_else(|| {
                UpstreamError::InvalidResponse("Cannot clone request".to_string())
            })?;

            match req.send().await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    warn!("Upstream request failed: {}", e);
                    let error = self.classify(e);
                    let retryable = is_retryable(&error);
                    last_error = Some(error);
                    if !retryable {
                        break;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| UpstreamError::InvalidResponse("Unknown error".to_string())))
    }

    /// Read the whole response body
    async fn buffer(&self, response: Response) -> UpstreamResult<UpstreamResponse> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| {
            UpstreamError::InvalidResponse(format!("Failed to read response body: {}", e))
        })?;

        debug!(status = status.as_u16(), bytes = body.len(), "Upstream responded");
        Ok(UpstreamResponse::new(status, headers, body))
    }

    fn classify(&self, error: reqwest::Error) -> UpstreamError {
        if error.is_timeout() {
            UpstreamError::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            UpstreamError::Request(error)
        }
    }
}

/// Largest backoff exponent; delays stop growing at 100ms * 2^6
const MAX_BACKOFF_EXPONENT: u32 = 6;

/// Exponential backoff before retry number `attempt` (1-based)
fn backoff_delay(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
    Duration::from_millis(100 * 2u64.pow(exponent))
}

/// Copy the headers of an inbound request that should reach the daemon
pub fn forwarded_headers(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = headers.clone();
    for name in NON_FORWARDED_HEADERS {
        forwarded.remove(&name);
    }
    forwarded
}

fn is_idempotent(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::PUT | Method::DELETE
    )
}

/// Check if an error is retryable
fn is_retryable(error: &UpstreamError) -> bool {
    match error {
        UpstreamError::Request(e) => e.is_connect(),
        UpstreamError::Timeout { .. } => true,
        UpstreamError::InvalidResponse(_) => false,
    }
}
