//! Capability port: the external generative image service.
//!
//! The service is modelled as a single "submit parts, get parts back" call.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::TryOnError;

/// Raw image bytes with their MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    /// Raw image bytes (base64 when serialized).
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    /// MIME type of the image (e.g., `"image/png"`).
    pub mime_type: String,
}

impl ImagePayload {
    /// Create a payload from bytes and a MIME type.
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self { data, mime_type: mime_type.into() }
    }

    /// Whether the payload carries no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// One unit of a multi-modal message: an image or a piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Part {
    /// Inline image data.
    Image(ImagePayload),
    /// Plain text.
    Text(String),
}

/// Kinds of content the service may answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    /// Image output.
    Image,
    /// Text output.
    Text,
}

/// A single submission to the capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityRequest {
    /// The resolved model identifier (e.g., `"gemini-2.5-flash-image-preview"`).
    pub model: String,
    /// Ordered input parts.
    pub parts: Vec<Part>,
    /// Modalities the reply is allowed to contain.
    pub modalities: Vec<Modality>,
}

/// One candidate answer from the capability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Ordered content parts. May be empty.
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Raw reply from the capability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityResponse {
    /// Candidate answers, in the order the service returned them.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// Boxed future type returned by [`Capability::submit`].
pub type SubmitFuture<'a> =
    Pin<Box<dyn Future<Output = Result<CapabilityResponse, TryOnError>> + Send + 'a>>;

/// The external generative image service.
pub trait Capability: Send + Sync {
    /// Submit one request and wait for the reply.
    fn submit(&self, request: &CapabilityRequest) -> SubmitFuture<'_>;
}

/// Serde helper for serializing `Vec<u8>` as base64 strings.
mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize bytes as base64 string.
    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(data);
        serializer.serialize_str(&encoded)
    }

    /// Deserialize base64 string to bytes.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}
