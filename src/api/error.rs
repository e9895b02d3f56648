//! Error taxonomy for the generation proxy client.

use thiserror::Error;

/// One attempt against the generation proxy, gone wrong.
///
/// Only [`RateLimited`](Self::RateLimited) is worth retrying; everything else
/// ends the call sequence at once.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP 429 from the proxy.
    #[error("generation endpoint is rate limiting requests: {message}")]
    RateLimited { message: String },

    /// Any other non-success status from the proxy.
    #[error("generation endpoint returned status {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Transport succeeded but the decoded body lacks the field the requested
    /// capability promises. A contract violation, not transient load.
    #[error("invalid response shape: {0}")]
    InvalidShape(&'static str),

    /// The body was not the JSON the proxy contract describes.
    #[error("undecodable response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Network-level failure: DNS, connect, timeout, or a broken body read.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// A generated image payload that was not valid base64.
    #[error("invalid base64 image payload: {0}")]
    ImageDecode(#[from] base64::DecodeError),
}

impl ApiError {
    /// The one condition the retry policy treats as transient.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Upstream status code, when one was observed.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimited { .. } => Some(429),
            Self::Upstream { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
