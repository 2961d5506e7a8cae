use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use gamma_core::engine::{DEFAULT_PROMPTS_DIR, DEFAULT_SEED_PATH};
use gamma_core::{Credential, Engine, EnginePaths, EngineSettings, CREDENTIAL_ENV, METRICS};
use gammad::state::DEFAULT_AGENT_NAME;
use gammad::{AppState, ServerConfig, DEFAULT_HOST, DEFAULT_PORT};

#[derive(Parser)]
#[command(name = "gammad")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Gamma assessment daemon (A2A over HTTP)", long_about = None)]
struct Args {
    /// Host address
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Port number
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Seed configuration file
    #[arg(long, env = "GAMMA_SEED", default_value = DEFAULT_SEED_PATH)]
    seed: PathBuf,

    /// Directory holding one prompt template per operator
    #[arg(long, env = "GAMMA_PROMPTS", default_value = DEFAULT_PROMPTS_DIR)]
    prompts: PathBuf,

    /// Inference service API key
    #[arg(long, env = CREDENTIAL_ENV, hide_env_values = true)]
    api_key: Option<String>,

    /// Name reported in the agent card
    #[arg(long, default_value = DEFAULT_AGENT_NAME)]
    agent_name: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    gamma_core::init_tracing(args.json, gamma_core::telemetry::level_for(args.verbose));

    let credential = Credential::new(args.api_key.unwrap_or_default())
        .with_context(|| format!("An API key is required: pass --api-key or set {CREDENTIAL_ENV}"))?;
    let settings = EngineSettings::from_lookup(credential, |key| std::env::var(key).ok())
        .context("Invalid engine settings in environment")?;

    let paths = EnginePaths {
        seed: args.seed,
        prompts: args.prompts,
    };
    let orchestrator = Engine::load(&paths, &settings).context("Failed to initialize engine")?;
    let state = Arc::new(AppState::new(orchestrator).with_agent_name(args.agent_name));

    let config = ServerConfig {
        host: args.host,
        port: args.port,
    };
    gammad::serve(&config, state, shutdown_signal()).await?;

    METRICS.flush();
    tracing::info!("gammad stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
