//! Typed client for the serverless generation proxy.
//!
//! The proxy fronts the actual model provider: it takes a capability-tagged
//! JSON payload and returns the provider's body, a 429 when the upstream is
//! throttling, or a non-success status with an `{"error": ...}` body. This
//! client owns one [`RetryPolicy`] whose predicate retries rate limiting
//! only; upstream failures, undecodable bodies, transport errors, and shape
//! violations all end the call sequence on the spot.
//!
//! ```rust,no_run
//! use repomuse::{AiClient, RetryConfig};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AiClient::builder("https://example.app/.netlify/functions/call-ai")
//!     .retry(RetryConfig::default())
//!     .build()?;
//! let readme = client.generate_text("Write a README for a CLI tool.").await?;
//! println!("{}", readme);
//! # Ok(())
//! # }
//! ```

mod error;
mod types;

pub use error::ApiError;
pub use types::{Capability, GeneratedImage, GenerateRequest, Generation};

use crate::retry::BuildError;
use crate::{CallError, CancelToken, RetryConfig, RetryPolicy};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use types::{ErrorBody, ImageResponse, TextResponse};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const FALLBACK_ERROR_MESSAGE: &str = "the generation endpoint gave no further detail";

/// Errors produced while constructing an [`AiClient`].
#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("invalid retry configuration: {0}")]
    Retry(#[from] BuildError),
    #[error("failed to construct HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Client for the generation proxy.
#[derive(Debug, Clone)]
pub struct AiClient {
    http: reqwest::Client,
    endpoint: String,
    policy: RetryPolicy<ApiError>,
}

impl AiClient {
    /// Start building a client for the given proxy endpoint.
    pub fn builder(endpoint: impl Into<String>) -> AiClientBuilder {
        AiClientBuilder {
            endpoint: endpoint.into(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryConfig::default(),
        }
    }

    /// Run one capability-generic request. The capability tag is resolved
    /// here, once; the retry core never re-inspects it.
    pub async fn generate(
        &self,
        request: &GenerateRequest,
    ) -> Result<Generation, CallError<ApiError>> {
        match request.capability {
            Capability::Text => {
                let text = self.policy.execute(|| self.fetch_text(request)).await?;
                Ok(Generation::Text(text))
            }
            Capability::Image => {
                let image = self.policy.execute(|| self.fetch_image(request)).await?;
                Ok(Generation::Image(image))
            }
        }
    }

    /// Like [`generate`](Self::generate), abortable through `cancel`.
    pub async fn generate_with_cancel(
        &self,
        request: &GenerateRequest,
        cancel: &CancelToken,
    ) -> Result<Generation, CallError<ApiError>> {
        match request.capability {
            Capability::Text => {
                let text =
                    self.policy.execute_with_cancel(|| self.fetch_text(request), cancel).await?;
                Ok(Generation::Text(text))
            }
            Capability::Image => {
                let image =
                    self.policy.execute_with_cancel(|| self.fetch_image(request), cancel).await?;
                Ok(Generation::Image(image))
            }
        }
    }

    /// Text generation from a prompt.
    pub async fn generate_text(&self, prompt: &str) -> Result<String, CallError<ApiError>> {
        let request = GenerateRequest::text(prompt);
        self.policy.execute(|| self.fetch_text(&request)).await
    }

    /// Image generation from a prompt.
    pub async fn generate_image(
        &self,
        prompt: &str,
    ) -> Result<GeneratedImage, CallError<ApiError>> {
        let request = GenerateRequest::image(prompt);
        self.policy.execute(|| self.fetch_image(&request)).await
    }

    async fn fetch_text(&self, request: &GenerateRequest) -> Result<String, ApiError> {
        let body: TextResponse = self.exchange(request).await?;
        body.into_text().ok_or(ApiError::InvalidShape("response carried no generated text"))
    }

    async fn fetch_image(&self, request: &GenerateRequest) -> Result<GeneratedImage, ApiError> {
        let body: ImageResponse = self.exchange(request).await?;
        body.into_base64()
            .map(GeneratedImage::new)
            .ok_or(ApiError::InvalidShape("response carried no image data"))
    }

    /// One attempt: POST the payload, map the status, decode the body.
    async fn exchange<Resp>(&self, request: &GenerateRequest) -> Result<Resp, ApiError>
    where
        Resp: DeserializeOwned,
    {
        tracing::debug!(kind = request.capability.wire_tag(), "calling generation endpoint");
        let response = self.http.post(&self.endpoint).json(&request.payload()).send().await?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "generation endpoint responded");

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let message = normalize_error_body(response.text().await.unwrap_or_default());
            return Err(ApiError::RateLimited { message });
        }
        if !status.is_success() {
            let message = normalize_error_body(response.text().await.unwrap_or_default());
            return Err(ApiError::Upstream { status: status.as_u16(), message });
        }

        let raw = response.text().await?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Builder for [`AiClient`].
#[derive(Debug, Clone)]
pub struct AiClientBuilder {
    endpoint: String,
    timeout: Duration,
    retry: RetryConfig,
}

impl AiClientBuilder {
    /// Timeout applied to each attempt individually. Default 30s.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Retry schedule for rate-limited attempts.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }

    pub fn build(self) -> Result<AiClient, ClientBuildError> {
        let policy = self
            .retry
            .policy_builder::<ApiError>()?
            .retry_if(ApiError::is_rate_limited)
            .build()?;
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("repomuse/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(AiClient { http, endpoint: self.endpoint, policy })
    }
}

/// Prefer the proxy's `{"error": ...}` message, fall back to the raw body,
/// and never return an empty string.
fn normalize_error_body(raw: String) -> String {
    if let Ok(body) = serde_json::from_str::<ErrorBody>(&raw) {
        return match body.error {
            Some(message) if !message.trim().is_empty() => message,
            _ => FALLBACK_ERROR_MESSAGE.to_string(),
        };
    }
    if raw.trim().is_empty() {
        FALLBACK_ERROR_MESSAGE.to_string()
    } else {
        raw
    }
}
