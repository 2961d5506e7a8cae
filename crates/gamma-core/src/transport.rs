//! The remote inference transport seam.
//!
//! The invoker talks to the text-generation service only through
//! [`InferenceTransport`]. Production wiring uses
//! [`GeminiTransport`](crate::gemini::GeminiTransport); tests inject a stub that
//! captures requests and returns canned outcomes.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Ephemeral request value built for one stage invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationRequest {
    /// Target model identifier.
    pub model: String,
    /// Prompt text with placeholders already substituted.
    pub prompt: String,
    /// Sampling temperature, `0.618 * staging_factor`, never clamped.
    pub temperature: f64,
    /// Upper bound on generated tokens.
    pub max_output_tokens: u32,
}

/// Transport-level failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// The call did not complete within the caller's bound.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The service answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not match the expected schema.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Connection, TLS or request-building failure.
    #[error("request failed: {0}")]
    Request(String),
}

/// A synchronous-per-call text-generation backend.
///
/// `generate` returns the generated text of a well-formed response. A
/// well-formed response that carries no text yields an empty string; the
/// invoker classifies that as an empty response.
#[async_trait]
pub trait InferenceTransport: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Perform one call, bounded by `timeout`. No retries.
    async fn generate(
        &self,
        request: &InvocationRequest,
        timeout: Duration,
    ) -> std::result::Result<String, TransportError>;
}
