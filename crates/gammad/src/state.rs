//! Shared application state

use chrono::{DateTime, Utc};
use gamma_core::Orchestrator;

/// Default agent name reported by `agent_card`.
pub const DEFAULT_AGENT_NAME: &str = "gamma-agent";

/// State shared by every request handler.
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub agent_name: String,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator,
            agent_name: DEFAULT_AGENT_NAME.to_string(),
            started_at: Utc::now(),
        }
    }

    pub fn with_agent_name(mut self, name: impl Into<String>) -> Self {
        self.agent_name = name.into();
        self
    }

    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
