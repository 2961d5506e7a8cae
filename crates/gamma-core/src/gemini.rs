//! Gemini `generateContent` REST transport.
//!
//! Request and response bodies are described by strict serde types; anything
//! that does not deserialize into [`GenerateContentResponse`] is a
//! [`TransportError::Malformed`], never inspected field by field.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{Credential, EngineSettings};
use crate::error::{GammaError, Result};
use crate::transport::{InferenceTransport, InvocationRequest, TransportError};

/// Maximum number of characters of an error body kept in failure details.
const ERROR_BODY_LIMIT: usize = 300;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [RequestContent<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

/// Response schema for `generateContent`.
#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate; empty when absent.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// [`InferenceTransport`] backed by the Gemini REST API.
pub struct GeminiTransport {
    http: reqwest::Client,
    base_url: String,
    api_version: String,
    credential: Credential,
}

impl GeminiTransport {
    /// Build a transport. The credential is mandatory; there is no fallback.
    pub fn new(base_url: &str, api_version: &str, credential: Credential) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("gamma-core/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GammaError::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_version: api_version.trim_matches('/').to_string(),
            credential,
        })
    }

    pub fn from_settings(settings: &EngineSettings) -> Result<Self> {
        Self::new(
            &settings.api_base,
            &settings.api_version,
            settings.credential.clone(),
        )
    }

    /// `{base}/{version}/models/{model}:generateContent`
    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/{}/models/{}:generateContent",
            self.base_url, self.api_version, model
        )
    }
}

fn classify_reqwest_error(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(timeout)
    } else {
        TransportError::Request(err.to_string())
    }
}

fn truncate_body(body: &str) -> String {
    if body.is_empty() {
        return "no error detail".to_string();
    }
    body.chars().take(ERROR_BODY_LIMIT).collect()
}

#[async_trait]
impl InferenceTransport for GeminiTransport {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        request: &InvocationRequest,
        timeout: Duration,
    ) -> std::result::Result<String, TransportError> {
        let url = self.endpoint(&request.model);
        let payload = GenerateContentRequest {
            contents: [RequestContent {
                parts: [RequestPart {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
            },
        };

        debug!(
            model = %request.model,
            temperature = request.temperature,
            prompt_bytes = request.prompt.len(),
            "sending generateContent request"
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", self.credential.expose())
            .timeout(timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(e, timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(e, timeout))?;

        if !status.is_success() {
            warn!(model = %request.model, status = status.as_u16(), "inference service rejected request");
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| TransportError::Malformed(e.to_string()))?;

        Ok(parsed.text())
    }
}
