//! Wire types for the generation proxy.
//!
//! The proxy takes `{"prompt": ..., "type": "text" | "image"}` (plus an
//! optional inline base64 `"image"` for editing variants) and relays the
//! upstream provider's body back verbatim: text generations arrive under
//! `candidates[0].content.parts[0].text`, images under
//! `predictions[0].bytesBase64Encoded`.

use crate::api::ApiError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// What the caller wants generated.
///
/// Resolved to its wire tag exactly once, at the call boundary; nothing
/// downstream re-interprets strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Prompt in, markdown/code/plain text out.
    Text,
    /// Prompt in, base64-encoded PNG out.
    Image,
}

impl Capability {
    pub(crate) fn wire_tag(self) -> &'static str {
        match self {
            Capability::Text => "text",
            Capability::Image => "image",
        }
    }
}

/// One generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub capability: Capability,
    pub prompt: String,
    /// Inline base64 source image, for image-editing variants.
    pub image: Option<String>,
}

impl GenerateRequest {
    /// Text generation from a prompt.
    pub fn text(prompt: impl Into<String>) -> Self {
        Self { capability: Capability::Text, prompt: prompt.into(), image: None }
    }

    /// Image generation from a prompt.
    pub fn image(prompt: impl Into<String>) -> Self {
        Self { capability: Capability::Image, prompt: prompt.into(), image: None }
    }

    /// Image edit: a prompt applied to an inline base64 source image.
    pub fn image_edit(prompt: impl Into<String>, image_base64: impl Into<String>) -> Self {
        Self {
            capability: Capability::Image,
            prompt: prompt.into(),
            image: Some(image_base64.into()),
        }
    }

    pub(crate) fn payload(&self) -> GeneratePayload<'_> {
        GeneratePayload {
            prompt: &self.prompt,
            kind: self.capability.wire_tag(),
            image: self.image.as_deref(),
        }
    }
}

/// JSON body sent to the proxy.
#[derive(Debug, Serialize)]
pub(crate) struct GeneratePayload<'a> {
    pub prompt: &'a str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<&'a str>,
}

/// Failure body the proxy emits: `{"error": "..."}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
}

// Success shapes. Every field along the happy path is optional so that a
// structurally wrong body decodes into "missing" and surfaces as a shape
// violation instead of a JSON error.

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TextResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentPart {
    pub text: Option<String>,
}

impl TextResponse {
    /// `candidates[0].content.parts[0].text`, required non-empty.
    pub(crate) fn into_text(self) -> Option<String> {
        let part = self.candidates.into_iter().next()?.content?.parts.into_iter().next()?;
        match part.text {
            Some(text) if !text.trim().is_empty() => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ImageResponse {
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Prediction {
    #[serde(rename = "bytesBase64Encoded")]
    pub bytes_base64_encoded: Option<String>,
}

impl ImageResponse {
    /// `predictions[0].bytesBase64Encoded`, required non-empty.
    pub(crate) fn into_base64(self) -> Option<String> {
        match self.predictions.into_iter().next()?.bytes_base64_encoded {
            Some(bytes) if !bytes.trim().is_empty() => Some(bytes),
            _ => None,
        }
    }
}

/// A generated image, kept in the base64 form the proxy returned it in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    base64: String,
}

impl GeneratedImage {
    pub(crate) fn new(base64: String) -> Self {
        Self { base64 }
    }

    /// The raw base64 payload.
    pub fn as_base64(&self) -> &str {
        &self.base64
    }

    /// Decode the payload into PNG bytes.
    pub fn bytes(&self) -> Result<Vec<u8>, ApiError> {
        Ok(BASE64.decode(self.base64.as_bytes())?)
    }

    /// Render as a `data:` URL, ready for an `<img src>` handoff.
    pub fn data_url(&self) -> String {
        format!("data:image/png;base64,{}", self.base64)
    }
}

/// Outcome of a capability-generic [`generate`](crate::AiClient::generate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    Text(String),
    Image(GeneratedImage),
}

impl Generation {
    pub fn into_text(self) -> Option<String> {
        match self {
            Generation::Text(text) => Some(text),
            Generation::Image(_) => None,
        }
    }

    pub fn into_image(self) -> Option<GeneratedImage> {
        match self {
            Generation::Image(image) => Some(image),
            Generation::Text(_) => None,
        }
    }
}
