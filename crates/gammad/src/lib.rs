//! Gamma daemon
//!
//! Serves the assessment engine over HTTP:
//!
//! - `POST /a2a`: A2A JSON envelope (`agent_card`, `task_create`)
//! - `GET /health`: labels, operator count and engine counters

pub mod a2a;
pub mod error;
pub mod http;
pub mod state;

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;

pub use error::ServerError;
pub use http::{create_router, HealthResponse};
pub use state::AppState;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;

/// Listen address of the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Bind and serve until `shutdown` resolves.
pub async fn serve<F>(
    config: &ServerConfig,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = config.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ServerError::Bind {
            addr: addr.clone(),
            source: e,
        })?;

    tracing::info!("gammad listening on {}", addr);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))
}
