//! Stage invoker: one operator, one prompt, one bounded remote call.
//!
//! The invoker never retries and never raises. Every outcome, including
//! transport failures, comes back as an [`InvocationResult`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_TIMEOUT_SECS};
use crate::error::{GammaError, Result};
use crate::metrics::METRICS;
use crate::obs::{emit_stage_finished, emit_stage_invoked};
use crate::registry::{OperatorRegistry, OperatorSpec};
use crate::template::PromptTemplate;
use crate::transport::{InferenceTransport, InvocationRequest, TransportError};

/// Scale applied to an operator's staging factor to obtain its temperature.
pub const TEMPERATURE_SCALE: f64 = 0.618;

/// Sampling temperature for `spec`. Deliberately unclamped.
pub fn temperature_for(spec: &OperatorSpec) -> f64 {
    TEMPERATURE_SCALE * spec.staging_factor
}

/// Classification of a failed invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Timeout,
    TransportError,
    EmptyResponse,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::TransportError => "transport_error",
            ErrorKind::EmptyResponse => "empty_response",
        };
        write!(f, "{s}")
    }
}

/// Outcome of one stage invocation. Exactly one variant holds data.
///
/// Serialized with a `status` tag of `"success"` or `"error"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InvocationResult {
    Success {
        #[serde(rename = "response")]
        text: String,
    },
    #[serde(rename = "error")]
    Failure {
        #[serde(rename = "error_kind")]
        kind: ErrorKind,
        #[serde(rename = "error")]
        message: String,
    },
}

impl InvocationResult {
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        InvocationResult::Failure {
            kind,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, InvocationResult::Success { .. })
    }

    /// Generated text of a successful invocation.
    pub fn text(&self) -> Option<&str> {
        match self {
            InvocationResult::Success { text } => Some(text),
            InvocationResult::Failure { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            InvocationResult::Success { .. } => None,
            InvocationResult::Failure { kind, .. } => Some(*kind),
        }
    }

    /// Map a raw transport outcome to a classified result.
    pub fn classify(outcome: std::result::Result<String, TransportError>) -> Self {
        match outcome {
            Ok(text) if text.trim().is_empty() => InvocationResult::failure(
                ErrorKind::EmptyResponse,
                "response contained no generated text",
            ),
            Ok(text) => InvocationResult::Success { text },
            Err(err @ TransportError::Timeout(_)) => {
                InvocationResult::failure(ErrorKind::Timeout, err.to_string())
            }
            Err(err) => InvocationResult::failure(ErrorKind::TransportError, err.to_string()),
        }
    }
}

/// Fixed per-operator model routing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPolicy {
    /// Model used by every operator without a route.
    pub default: String,
    /// Operator name → model.
    #[serde(default)]
    pub routes: BTreeMap<String, String>,
}

impl ModelPolicy {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
            routes: BTreeMap::new(),
        }
    }

    pub fn with_route(mut self, operator: impl Into<String>, model: impl Into<String>) -> Self {
        self.routes.insert(operator.into(), model.into());
        self
    }

    pub fn model_for(&self, operator: &str) -> &str {
        self.routes
            .get(operator)
            .map(String::as_str)
            .unwrap_or(&self.default)
    }

    /// Distinct models in use, default first.
    pub fn model_names(&self) -> Vec<String> {
        let routed: BTreeSet<&str> = self.routes.values().map(String::as_str).collect();
        std::iter::once(self.default.clone())
            .chain(
                routed
                    .into_iter()
                    .filter(|m| *m != self.default)
                    .map(str::to_string),
            )
            .collect()
    }

    /// Every route must name a registered operator.
    pub fn validate(&self, registry: &OperatorRegistry) -> Result<()> {
        if self.default.trim().is_empty() {
            return Err(GammaError::Config("default model must not be empty".to_string()));
        }
        for operator in self.routes.keys() {
            registry.lookup(operator)?;
        }
        Ok(())
    }
}

/// Bounds applied to every invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvokerOptions {
    pub timeout: Duration,
    pub max_output_tokens: u32,
}

impl Default for InvokerOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

/// Builds requests and performs single, classified remote calls.
#[derive(Clone)]
pub struct StageInvoker {
    transport: Arc<dyn InferenceTransport>,
    models: ModelPolicy,
    options: InvokerOptions,
}

impl StageInvoker {
    pub fn new(
        transport: Arc<dyn InferenceTransport>,
        models: ModelPolicy,
        options: InvokerOptions,
    ) -> Self {
        Self {
            transport,
            models,
            options,
        }
    }

    pub fn models(&self) -> &ModelPolicy {
        &self.models
    }

    pub fn options(&self) -> InvokerOptions {
        self.options
    }

    /// Resolve the prompt and sampling parameters for one call.
    pub fn build_request(
        &self,
        spec: &OperatorSpec,
        template: &PromptTemplate,
        substitutions: &BTreeMap<String, String>,
    ) -> InvocationRequest {
        InvocationRequest {
            model: self.models.model_for(&spec.name).to_string(),
            prompt: template.render(substitutions),
            temperature: temperature_for(spec),
            max_output_tokens: self.options.max_output_tokens,
        }
    }

    /// Invoke `spec` once and classify the outcome.
    pub async fn invoke(
        &self,
        spec: &OperatorSpec,
        template: &PromptTemplate,
        substitutions: &BTreeMap<String, String>,
    ) -> InvocationResult {
        let request = self.build_request(spec, template, substitutions);
        emit_stage_invoked(
            &spec.name,
            &request.model,
            spec.staging_factor,
            request.temperature,
        );
        METRICS.inc_stages_invoked();

        let start = Instant::now();
        let outcome = self
            .transport
            .generate(&request, self.options.timeout)
            .await;
        let result = InvocationResult::classify(outcome);
        let duration_ms = start.elapsed().as_millis() as u64;

        match &result {
            InvocationResult::Success { .. } => METRICS.inc_stages_succeeded(),
            InvocationResult::Failure { .. } => METRICS.inc_stages_failed(),
        }
        emit_stage_finished(&spec.name, &result, duration_ms);

        result
    }
}
