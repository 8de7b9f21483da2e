//! The external generative image collaborator.
//!
//! [`ImageGenerator`] is the seam: one request (composite + instruction) in,
//! one image out. [`GeminiClient`] is the production implementation over the
//! Gemini `generateContent` REST endpoint using a blocking HTTP client.
//!
//! The call runs to completion or failure exactly once. There is no client
//! timeout and no retry; a failure is surfaced to the caller as-is.

use crate::imaging::export::{png_data_url, strip_data_url_prefix};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("API Key is missing.")]
    MissingApiKey,
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("Failed to parse response: {0}")]
    ResponseParsing(String),
    #[error("No image generated.")]
    NoImage,
    #[error("Response did not contain image data.")]
    NoImageData,
}

/// One outpainting request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationRequest<'a> {
    /// Base64 image data. A `data:image/...;base64,` prefix is stripped before sending.
    pub image_base64: &'a str,
    pub mime_type: &'a str,
    pub instruction: &'a str,
}

/// Image returned by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub data_base64: String,
}

impl GeneratedImage {
    /// `data:image/png;base64,...`, the form results are displayed and saved in.
    pub fn to_data_url(&self) -> String {
        png_data_url(&self.data_base64)
    }
}

pub trait ImageGenerator {
    fn generate(
        &self,
        api_key: &str,
        request: &GenerationRequest<'_>,
    ) -> Result<GeneratedImage, GenerationError>;
}

// ──────────────────────────────────────────────
// Wire types
// ──────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: RequestInlineData<'a>,
    },
    Text {
        text: &'a str,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestInlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    inline_data: Option<ResponseInlineData>,
}

#[derive(Debug, Deserialize)]
struct ResponseInlineData {
    data: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

fn request_body<'a>(request: &GenerationRequest<'a>) -> GenerateContentRequest<'a> {
    GenerateContentRequest {
        contents: vec![RequestContent {
            parts: vec![
                RequestPart::Inline {
                    inline_data: RequestInlineData {
                        mime_type: request.mime_type,
                        data: strip_data_url_prefix(request.image_base64),
                    },
                },
                RequestPart::Text {
                    text: request.instruction,
                },
            ],
        }],
        generation_config: GenerationConfig {
            response_modalities: vec!["IMAGE"],
        },
    }
}

/// Pull the first inline image out of a `generateContent` response body.
///
/// An empty body or a JSON `null` counts as a response with no candidates.
pub fn extract_image(body: &str) -> Result<GeneratedImage, GenerationError> {
    if body.trim().is_empty() {
        return Err(GenerationError::NoImage);
    }
    let parsed: Option<GenerateContentResponse> = serde_json::from_str(body)
        .map_err(|e| GenerationError::ResponseParsing(e.to_string()))?;
    let Some(parsed) = parsed else {
        return Err(GenerationError::NoImage);
    };

    let parts = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .unwrap_or_default();
    if parts.is_empty() {
        return Err(GenerationError::NoImage);
    }

    parts
        .into_iter()
        .find_map(|p| p.inline_data)
        .map(|d| GeneratedImage {
            data_base64: d.data,
        })
        .ok_or(GenerationError::NoImageData)
}

/// Best human-readable message for a non-success response.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP {status}"))
}

// ──────────────────────────────────────────────
// GeminiClient
// ──────────────────────────────────────────────

/// Gemini HTTP client.
pub struct GeminiClient {
    endpoint: String,
    model: String,
    client: reqwest::blocking::Client,
}

impl GeminiClient {
    pub fn new(endpoint: &str, model: &str) -> Result<Self, GenerationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(None)
            .build()?;
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
        })
    }

    pub fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

impl ImageGenerator for GeminiClient {
    fn generate(
        &self,
        api_key: &str,
        request: &GenerationRequest<'_>,
    ) -> Result<GeneratedImage, GenerationError> {
        if api_key.is_empty() {
            return Err(GenerationError::MissingApiKey);
        }

        let _span = tracing::info_span!(
            "generate_content",
            model = %self.model,
            image_base64_len = request.image_base64.len(),
        )
        .entered();
        let start = std::time::Instant::now();

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&request_body(request))
            .send()?;

        let status = response.status();
        let body = response.text()?;
        tracing::info!(
            status = status.as_u16(),
            elapsed_ms = %start.elapsed().as_millis(),
            body_len = body.len(),
            "generation response received"
        );

        if !status.is_success() {
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        extract_image(&body)
    }
}
