//! HTTP server module

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use gamma_core::{MetricsSnapshot, METRICS};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::a2a::{A2aRequest, AgentCard, Capabilities, OperatorCard, TaskResult};
use crate::error::ServerError;
use crate::state::AppState;

/// Create the HTTP router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/a2a", post(a2a))
        .route("/health", get(health))
        .with_state(state)
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub architecture: String,
    pub version: String,
    /// Number of configured operators
    pub operators: usize,
    pub uptime_seconds: i64,
    pub metrics: MetricsSnapshot,
}

/// Health check endpoint
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let labels = state.orchestrator.labels();
    Json(HealthResponse {
        status: "operational".to_string(),
        architecture: labels.architecture.clone(),
        version: labels.version.clone(),
        operators: state.orchestrator.registry().len(),
        uptime_seconds: state.uptime_seconds(),
        metrics: METRICS.snapshot(),
    })
}

fn agent_card(state: &AppState) -> AgentCard {
    let orchestrator = &state.orchestrator;
    let labels = orchestrator.labels();
    AgentCard {
        name: state.agent_name.clone(),
        architecture: labels.architecture.clone(),
        version: labels.version.clone(),
        capabilities: Capabilities {
            operators: orchestrator
                .registry()
                .all()
                .iter()
                .map(OperatorCard::from)
                .collect(),
            operator_count: orchestrator.registry().len(),
            stages: orchestrator.plan().len(),
            models: orchestrator.invoker().models().model_names(),
        },
    }
}

/// Main A2A endpoint
///
/// `agent_card` describes the agent; `task_create` (the default) assesses
/// the request's `context`. A malformed context yields an empty assessment,
/// not an error.
pub async fn a2a(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ServerError> {
    let Json(body) = payload.map_err(|rejection| ServerError::BadRequest(rejection.body_text()))?;
    let request = A2aRequest::from_value(&body)?;

    match request {
        A2aRequest::AgentCard => {
            info!(event = "a2a.request", kind = "agent_card");
            Ok(Json(agent_card(&state)).into_response())
        }
        A2aRequest::TaskCreate { context } => {
            info!(event = "a2a.request", kind = "task_create");
            let assessment = state.orchestrator.assess_value(&context).await;
            let result = serde_json::to_value(&assessment)?;
            Ok(Json(TaskResult::completed(result)).into_response())
        }
    }
}
