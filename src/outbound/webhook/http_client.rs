use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

use super::hmac_signer::SIGNATURE_HEADER;

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Error type for HTTP client operations
#[derive(Debug, Error)]
pub enum HttpClientError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Webhook endpoint returned {status}")]
    ResponseError { status: StatusCode, body: String },

    #[error("Failed to build HTTP client: {0}")]
    Build(String),
}

impl HttpClientError {
    fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            HttpClientError::Timeout(timeout)
        } else if err.is_builder() {
            HttpClientError::InvalidUrl(err.to_string())
        } else if err.is_connect() {
            HttpClientError::NetworkError(err.to_string())
        } else {
            HttpClientError::RequestFailed(err.to_string())
        }
    }

    /// HTTP status returned by the target, when it answered at all
    pub fn status_code(&self) -> Option<u16> {
        match self {
            HttpClientError::ResponseError { status, .. } => Some(status.as_u16()),
            _ => None,
        }
    }
}

/// Successful delivery details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub status_code: u16,

    pub response_time_ms: u64,

    pub body: String,
}

/// HTTP client wrapper for webhook delivery
#[derive(Debug, Clone)]
pub struct WebhookHttpClient {
    client: Client,
    timeout: Duration,
}

impl WebhookHttpClient {
    /// Create a new HTTP client with the default timeout (10 seconds)
    pub fn new() -> Result<Self, HttpClientError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a new HTTP client with custom timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpClientError> {
        Self::with_options(timeout, default_user_agent())
    }

    pub fn with_options(
        timeout: Duration,
        user_agent: impl Into<String>,
    ) -> Result<Self, HttpClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent.into())
            .build()
            .map_err(|e| HttpClientError::Build(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    /// Send one webhook POST.
    ///
    /// `body` is transmitted verbatim; `signature`, when present, must have
    /// been computed over these same bytes. Non-2xx responses come back as
    /// [`HttpClientError::ResponseError`]. Nothing is retried.
    pub async fn send(
        &self,
        url: &str,
        body: Bytes,
        signature: Option<&str>,
    ) -> Result<DeliveryReceipt, HttpClientError> {
        debug!(url = %url, signed = signature.is_some(), "Sending webhook");

        let start = Instant::now();

        let mut request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(signature) = signature {
            request = request.header(SIGNATURE_HEADER, signature);
        }

        let response = request.body(body).send().await.map_err(|e| {
            warn!(url = %url, error = %e, "Webhook request failed");
            HttpClientError::from_reqwest(e, self.timeout)
        })?;

        let response_time_ms = start.elapsed().as_millis() as u64;
        let status = response.status();

        debug!(
            url = %url,
            status = %status.as_u16(),
            response_time_ms = %response_time_ms,
            "Webhook response received"
        );

        let body = self.read_response_body(response).await?;

        if !status.is_success() {
            return Err(HttpClientError::ResponseError { status, body });
        }

        Ok(DeliveryReceipt {
            status_code: status.as_u16(),
            response_time_ms,
            body,
        })
    }

    /// Read response body with size limit
    async fn read_response_body(&self, response: Response) -> Result<String, HttpClientError> {
        const MAX_BODY_SIZE: usize = 1024 * 1024;

        let bytes = response.bytes().await.map_err(|e| {
            HttpClientError::RequestFailed(format!("Failed to read response body: {e}"))
        })?;

        if bytes.len() > MAX_BODY_SIZE {
            warn!(
                size = bytes.len(),
                max_size = MAX_BODY_SIZE,
                "Response body too large, truncating"
            );
        }

        Ok(String::from_utf8_lossy(&bytes[..bytes.len().min(MAX_BODY_SIZE)]).into_owned())
    }

    /// Get configured timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

pub fn default_user_agent() -> String {
    format!("pos-webhooks/{}", env!("CARGO_PKG_VERSION"))
}
