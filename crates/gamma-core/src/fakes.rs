//! In-memory transport fake (testing only)
//!
//! [`StubTransport`] satisfies [`InferenceTransport`] without any network
//! access. Replies are scripted by prompt substring and every request is
//! captured for later inspection.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::transport::{InferenceTransport, InvocationRequest, TransportError};

/// A scripted reply.
#[derive(Debug, Clone, PartialEq)]
pub enum StubReply {
    /// Well-formed response with this text (may be empty).
    Text(String),
    /// The call times out.
    Timeout,
    /// Non-2xx status with a body.
    Status(u16, String),
    /// The body does not match the response schema.
    Malformed,
}

impl StubReply {
    pub fn text(text: impl Into<String>) -> Self {
        StubReply::Text(text.into())
    }

    fn into_outcome(self, timeout: Duration) -> Result<String, TransportError> {
        match self {
            StubReply::Text(text) => Ok(text),
            StubReply::Timeout => Err(TransportError::Timeout(timeout)),
            StubReply::Status(status, body) => Err(TransportError::Status { status, body }),
            StubReply::Malformed => Err(TransportError::Malformed(
                "expected value at line 1 column 1".to_string(),
            )),
        }
    }
}

/// Deterministic transport: first matching rule wins, else the default reply.
#[derive(Debug)]
pub struct StubTransport {
    rules: Vec<(String, StubReply)>,
    default: StubReply,
    requests: Mutex<Vec<InvocationRequest>>,
}

impl StubTransport {
    /// Every call gets `default`.
    pub fn new(default: StubReply) -> Self {
        Self {
            rules: Vec::new(),
            default,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every call succeeds with `text`.
    pub fn always(text: impl Into<String>) -> Self {
        Self::new(StubReply::Text(text.into()))
    }

    /// Prompts containing `needle` get `reply`.
    pub fn with_rule(mut self, needle: impl Into<String>, reply: StubReply) -> Self {
        self.rules.push((needle.into(), reply));
        self
    }

    /// Requests received so far, in call order.
    pub fn requests(&self) -> Vec<InvocationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl InferenceTransport for StubTransport {
    fn name(&self) -> &str {
        "stub"
    }

    async fn generate(
        &self,
        request: &InvocationRequest,
        timeout: Duration,
    ) -> Result<String, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = self
            .rules
            .iter()
            .find(|(needle, _)| request.prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| self.default.clone());
        reply.into_outcome(timeout)
    }
}
