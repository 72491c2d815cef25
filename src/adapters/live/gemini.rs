//! Live adapter for the Gemini `generateContent` API.

use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::TryOnError;
use crate::ports::capability::{
    Candidate, Capability, CapabilityRequest, CapabilityResponse, ImagePayload, Part, SubmitFuture,
};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Calls the Google AI API.
pub struct GeminiCapability {
    client: Client,
    api_key: String,
}

impl GeminiCapability {
    /// Create a new Gemini capability with the given API key.
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self { client: Client::new(), api_key }
    }
}

impl Capability for GeminiCapability {
    fn submit(&self, request: &CapabilityRequest) -> SubmitFuture<'_> {
        let request = request.clone();
        Box::pin(async move {
            let url = format!("{GEMINI_API_BASE}/{}:generateContent", request.model);
            let body = encode_request(&request);

            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            let response_text = response.text().await?;
            debug!(status = status.as_u16(), bytes = response_text.len(), "gemini replied");

            if !status.is_success() {
                return Err(TryOnError::Api { status: status.as_u16(), message: response_text });
            }

            let parsed: GeminiResponse = serde_json::from_str(&response_text).map_err(|e| {
                TryOnError::Api { status: 200, message: format!("Failed to parse response: {e}") }
            })?;

            Ok(decode_response(parsed))
        })
    }
}

fn encode_request(request: &CapabilityRequest) -> GeminiRequest {
    let engine = &base64::engine::general_purpose::STANDARD;
    let parts = request
        .parts
        .iter()
        .map(|part| match part {
            Part::Image(image) => GeminiPart {
                inline_data: Some(GeminiInlineData {
                    mime_type: image.mime_type.clone(),
                    data: engine.encode(&image.data),
                }),
                ..GeminiPart::default()
            },
            Part::Text(text) => GeminiPart { text: Some(text.clone()), ..GeminiPart::default() },
        })
        .collect();

    GeminiRequest {
        contents: vec![GeminiContent { parts }],
        generation_config: GenerationConfig { response_modalities: request.modalities.clone() },
    }
}

/// Map wire parts onto [`Part`]s, dropping thoughts, empty parts and
/// undecodable image data.
fn decode_response(response: GeminiResponse) -> CapabilityResponse {
    let engine = &base64::engine::general_purpose::STANDARD;
    let candidates = response
        .candidates
        .into_iter()
        .map(|candidate| {
            let parts = candidate
                .content
                .map(|c| c.parts)
                .unwrap_or_default()
                .into_iter()
                .filter(|p| !p.thought.unwrap_or(false))
                .filter_map(|p| {
                    if let Some(inline) = p.inline_data.filter(|i| !i.data.is_empty()) {
                        match engine.decode(&inline.data) {
                            Ok(data) => Some(Part::Image(ImagePayload::new(data, inline.mime_type))),
                            Err(e) => {
                                warn!("skipping image part with invalid base64: {e}");
                                None
                            }
                        }
                    } else {
                        p.text.filter(|t| !t.is_empty()).map(Part::Text)
                    }
                })
                .collect();
            Candidate { parts }
        })
        .collect();
    CapabilityResponse { candidates }
}

// --- Gemini API wire types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<crate::ports::Modality>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<GeminiInlineData>,
    #[serde(skip_serializing)]
    thought: Option<bool>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}
