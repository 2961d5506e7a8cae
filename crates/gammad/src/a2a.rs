//! A2A request and response envelopes.
//!
//! Requests are JSON objects discriminated by `type`; a missing `type` means
//! `task_create`.

use gamma_core::OperatorSpec;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ServerError;

pub const AGENT_CARD: &str = "agent_card";
pub const TASK_CREATE: &str = "task_create";

/// A parsed A2A request.
#[derive(Debug, Clone, PartialEq)]
pub enum A2aRequest {
    AgentCard,
    /// Run an assessment over `context`, which should be a section map.
    TaskCreate { context: Value },
}

impl A2aRequest {
    pub fn from_value(value: &Value) -> Result<Self, ServerError> {
        let body = value
            .as_object()
            .ok_or_else(|| ServerError::BadRequest("request body must be a JSON object".into()))?;

        let kind = match body.get("type") {
            None | Some(Value::Null) => TASK_CREATE,
            Some(Value::String(kind)) => kind.as_str(),
            Some(other) => return Err(ServerError::UnknownRequestType(other.to_string())),
        };

        match kind {
            AGENT_CARD => Ok(A2aRequest::AgentCard),
            TASK_CREATE => Ok(A2aRequest::TaskCreate {
                context: body
                    .get("context")
                    .cloned()
                    .unwrap_or_else(|| Value::Object(Map::new())),
            }),
            other => Err(ServerError::UnknownRequestType(other.to_string())),
        }
    }
}

/// One registered operator as advertised in the agent card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorCard {
    pub name: String,
    pub staging_factor: f64,
    pub weight: f64,
}

impl From<&OperatorSpec> for OperatorCard {
    fn from(spec: &OperatorSpec) -> Self {
        Self {
            name: spec.name.clone(),
            staging_factor: spec.staging_factor,
            weight: spec.weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Registry order.
    pub operators: Vec<OperatorCard>,
    pub operator_count: usize,
    pub stages: usize,
    pub models: Vec<String>,
}

/// Reply to `agent_card`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCard {
    pub name: String,
    pub architecture: String,
    pub version: String,
    pub capabilities: Capabilities,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: Value,
}

/// Reply to `task_create`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    pub result: Value,
    pub artifacts: Vec<Artifact>,
}

impl TaskResult {
    /// A completed task carrying `result` both inline and as a JSON artifact.
    pub fn completed(result: Value) -> Self {
        Self {
            kind: "task_result".to_string(),
            status: "completed".to_string(),
            artifacts: vec![Artifact {
                kind: "json".to_string(),
                content: result.clone(),
            }],
            result,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: "error".to_string(),
            message: message.into(),
        }
    }
}
