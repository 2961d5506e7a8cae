//! Gamma CLI
//!
//! The `gamma` command runs staged operator assessments from the shell.
//!
//! ## Commands
//!
//! - `assess`: Run every applicable stage over a JSON bundle
//! - `invoke`: Call a single operator with free text
//! - `operators`: List configured operators and their sampling parameters

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;

use gamma_core::engine::{DEFAULT_PROMPTS_DIR, DEFAULT_SEED_PATH};
use gamma_core::{
    temperature_for, AssessmentBundle, AssessmentResult, Credential, Engine, EnginePaths,
    EngineSettings, InvocationResult, Orchestrator, SeedConfig, CREDENTIAL_ENV, METRICS,
};

#[derive(Parser)]
#[command(name = "gamma")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Gamma staged operator assessment engine", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON log lines and print `invoke` outcomes as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Seed configuration file
    #[arg(long, global = true, env = "GAMMA_SEED", default_value = DEFAULT_SEED_PATH)]
    seed: PathBuf,

    /// Directory holding one prompt template per operator
    #[arg(long, global = true, env = "GAMMA_PROMPTS", default_value = DEFAULT_PROMPTS_DIR)]
    prompts: PathBuf,

    /// Inference service API key
    #[arg(long, global = true, env = CREDENTIAL_ENV, hide_env_values = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess a bundle of named text sections
    Assess {
        /// Path to the bundle (JSON object of section id -> text)
        #[arg(short, long)]
        bundle: PathBuf,

        /// Do not start new stages after this many seconds
        #[arg(long)]
        deadline_secs: Option<u64>,
    },

    /// Invoke one operator by name or 1-based index
    Invoke {
        /// Operator name or index
        operator: String,

        /// Text substituted for {input_text}
        #[arg(short, long)]
        text: String,
    },

    /// List configured operators
    Operators,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    gamma_core::init_tracing(cli.json, gamma_core::telemetry::level_for(cli.verbose));

    let paths = EnginePaths {
        seed: cli.seed,
        prompts: cli.prompts,
    };

    let outcome = match cli.command {
        Commands::Assess {
            bundle,
            deadline_secs,
        } => {
            let orchestrator = load_engine(&paths, cli.api_key)?;
            cmd_assess(&orchestrator, &bundle, deadline_secs).await
        }
        Commands::Invoke { operator, text } => {
            let orchestrator = load_engine(&paths, cli.api_key)?;
            cmd_invoke(&orchestrator, &operator, &text, cli.json).await
        }
        Commands::Operators => cmd_operators(&paths.seed),
    };

    METRICS.flush();
    outcome
}

/// Resolve settings from flags and environment, then build the engine.
fn load_engine(paths: &EnginePaths, api_key: Option<String>) -> Result<Orchestrator> {
    let settings = settings_from(api_key)?;
    Engine::load(paths, &settings).with_context(|| {
        format!(
            "Failed to initialize engine from {} and {}",
            paths.seed.display(),
            paths.prompts.display()
        )
    })
}

fn settings_from(api_key: Option<String>) -> Result<EngineSettings> {
    let credential = Credential::new(api_key.unwrap_or_default())
        .with_context(|| format!("An API key is required: pass --api-key or set {CREDENTIAL_ENV}"))?;
    EngineSettings::from_lookup(credential, |key| std::env::var(key).ok())
        .context("Invalid engine settings in environment")
}

/// Read a bundle file into an [`AssessmentBundle`].
fn read_bundle(path: &Path) -> Result<AssessmentBundle> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read bundle {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Bundle {} is not valid JSON", path.display()))?;
    AssessmentBundle::from_value(&value)
        .with_context(|| format!("Bundle {} is malformed", path.display()))
}

async fn run_assess(
    orchestrator: &Orchestrator,
    bundle_path: &Path,
    deadline_secs: Option<u64>,
) -> Result<AssessmentResult> {
    let bundle = read_bundle(bundle_path)?;
    let deadline =
        deadline_secs.map(|secs| tokio::time::Instant::now() + Duration::from_secs(secs));
    Ok(orchestrator.assess_until(&bundle, deadline).await)
}

/// Run an assessment and print the result JSON
async fn cmd_assess(
    orchestrator: &Orchestrator,
    bundle_path: &Path,
    deadline_secs: Option<u64>,
) -> Result<()> {
    let result = run_assess(orchestrator, bundle_path, deadline_secs).await?;

    info!(
        assessment_id = %result.metadata.assessment_id,
        succeeded = result.succeeded(),
        failed = result.failed(),
        "assessment complete"
    );
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Render an invocation outcome as plain text or tagged JSON.
fn invocation_output(result: &InvocationResult, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(result)?);
    }
    Ok(match result {
        InvocationResult::Success { text } => text.clone(),
        InvocationResult::Failure { kind, message } => format!("{kind}: {message}"),
    })
}

/// Invoke a single operator and print its outcome
///
/// A failed invocation is returned as an error so the process exits non-zero.
async fn cmd_invoke(
    orchestrator: &Orchestrator,
    operator: &str,
    text: &str,
    json: bool,
) -> Result<()> {
    let result = orchestrator
        .invoke_operator(operator, text)
        .await
        .with_context(|| format!("Cannot invoke operator '{operator}'"))?;

    match &result {
        InvocationResult::Success { .. } => {
            println!("{}", invocation_output(&result, json)?);
            Ok(())
        }
        InvocationResult::Failure { kind, message } => {
            if json {
                println!("{}", invocation_output(&result, json)?);
            }
            anyhow::bail!("Operator '{operator}' failed ({kind}): {message}")
        }
    }
}

#[derive(Debug)]
struct OperatorRow {
    index: usize,
    name: String,
    weight: f64,
    staging_factor: f64,
    temperature: f64,
    model: String,
}

fn operator_rows(seed: &SeedConfig) -> Result<Vec<OperatorRow>> {
    let registry = seed.registry().context("Invalid operator configuration")?;
    Ok((1..)
        .zip(registry.all())
        .map(|(index, spec)| OperatorRow {
            index,
            name: spec.name.clone(),
            weight: spec.weight,
            staging_factor: spec.staging_factor,
            temperature: temperature_for(spec),
            model: seed.models.model_for(&spec.name).to_string(),
        })
        .collect())
}

/// List configured operators
fn cmd_operators(seed_path: &Path) -> Result<()> {
    let seed = SeedConfig::load(seed_path)
        .with_context(|| format!("Failed to load seed {}", seed_path.display()))?;
    let rows = operator_rows(&seed)?;

    println!("{} v{}", seed.architecture, seed.version);
    println!();
    for row in &rows {
        println!(
            "  {:>2}. {:<28} weight={:.2}  factor={:.3}  temperature={:.3}  model={}",
            row.index, row.name, row.weight, row.staging_factor, row.temperature, row.model
        );
    }
    if rows.is_empty() {
        println!("  (no operators configured)");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use gamma_core::fakes::{StubReply, StubTransport};
    use gamma_core::{ErrorKind, InvokerOptions};

    const SEED: &str = r#"{
      "architecture": "Gamma Finance",
      "version": "1.2.0",
      "operators": {"modes": [
        {"n": 1, "name": "Risk Classification", "phi_factor": 0.5, "weight": 0.4},
        {"n": 2, "name": "Business Summary", "phi_factor": 1.0, "weight": 0.3}
      ]},
      "models": {"default": "flash", "routes": {"Business Summary": "pro"}},
      "stages": [
        {"key": "risk_classification", "operator": "Risk Classification", "section": "section_1A"},
        {"key": "business_summary", "operator": "Business Summary", "section": "section_1"}
      ]
    }"#;

    fn stub_engine(
        seed: SeedConfig,
        prompts: &Path,
        transport: StubTransport,
    ) -> Result<Orchestrator> {
        Ok(Engine::from_seed_dir(
            seed,
            prompts,
            Arc::new(transport),
            InvokerOptions::default(),
        )?)
    }

    fn fixture_with(dir: &Path, transport: StubTransport) -> Orchestrator {
        let prompts = dir.join("prompts");
        std::fs::create_dir_all(&prompts).unwrap();
        std::fs::write(prompts.join("risk_classification.txt"), "RISK {input_text}").unwrap();
        std::fs::write(prompts.join("business_summary.txt"), "SUMMARY {input_text}").unwrap();
        stub_engine(SeedConfig::from_json_str(SEED).unwrap(), &prompts, transport).unwrap()
    }

    fn fixture(dir: &Path, reply: &str) -> Orchestrator {
        fixture_with(dir, StubTransport::always(reply))
    }

    #[test]
    fn test_cli_parses_assess_with_globals() {
        let cli = Cli::try_parse_from([
            "gamma",
            "--seed",
            "custom/seed.json",
            "assess",
            "--bundle",
            "filing.json",
            "--deadline-secs",
            "30",
        ])
        .unwrap();

        assert_eq!(cli.seed, PathBuf::from("custom/seed.json"));
        match cli.command {
            Commands::Assess {
                bundle,
                deadline_secs,
            } => {
                assert_eq!(bundle, PathBuf::from("filing.json"));
                assert_eq!(deadline_secs, Some(30));
            }
            _ => panic!("expected assess"),
        }
    }

    #[test]
    fn test_settings_require_api_key() {
        assert!(settings_from(None).is_err());
        assert!(settings_from(Some("  ".to_string())).is_err());
    }

    #[tokio::test]
    async fn test_run_assess_reads_bundle_file() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = fixture(dir.path(), "analysis");
        let bundle = dir.path().join("bundle.json");
        std::fs::write(&bundle, r#"{"section_1A": "rates rise", "section_9": "ignored"}"#)
            .unwrap();

        let result = run_assess(&orchestrator, &bundle, None).await.unwrap();

        assert_eq!(result.results.len(), 1);
        assert!((result.score - 0.4).abs() < 1e-9);
        assert_eq!(result.metadata.architecture, "Gamma Finance");
    }

    #[tokio::test]
    async fn test_run_assess_with_zero_deadline_records_timeouts() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = fixture(dir.path(), "analysis");
        let bundle = dir.path().join("bundle.json");
        std::fs::write(&bundle, r#"{"section_1A": "a", "section_1": "b"}"#).unwrap();

        let result = run_assess(&orchestrator, &bundle, Some(0)).await.unwrap();

        assert_eq!(result.results.len(), 2);
        assert!(result
            .results
            .values()
            .all(|r| r.error_kind() == Some(ErrorKind::Timeout)));
        assert_eq!(result.score, 0.0);
    }

    #[tokio::test]
    async fn test_run_assess_rejects_non_object_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = fixture(dir.path(), "analysis");
        let bundle = dir.path().join("bundle.json");
        std::fs::write(&bundle, "[1, 2, 3]").unwrap();

        let err = run_assess(&orchestrator, &bundle, None).await.unwrap_err();
        assert!(err.to_string().contains("malformed"));
    }

    #[tokio::test]
    async fn test_cmd_invoke_unknown_operator_fails() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = fixture(dir.path(), "analysis");

        assert!(cmd_invoke(&orchestrator, "9", "text", false).await.is_err());
        assert!(cmd_invoke(&orchestrator, "2", "text", false).await.is_ok());
    }

    #[tokio::test]
    async fn test_cmd_invoke_failed_invocation_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = fixture_with(dir.path(), StubTransport::new(StubReply::Timeout));

        let err = cmd_invoke(&orchestrator, "1", "text", false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timeout"));
        assert!(cmd_invoke(&orchestrator, "1", "text", true).await.is_err());
    }

    #[test]
    fn test_invocation_output_is_text_or_json() {
        let ok = InvocationResult::Success {
            text: "fine".to_string(),
        };
        assert_eq!(invocation_output(&ok, false).unwrap(), "fine");

        let json: Value = serde_json::from_str(&invocation_output(&ok, true).unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({"status": "success", "response": "fine"}));

        let failed = InvocationResult::Failure {
            kind: ErrorKind::EmptyResponse,
            message: "no text".to_string(),
        };
        assert_eq!(
            invocation_output(&failed, false).unwrap(),
            "empty_response: no text"
        );
    }

    #[test]
    fn test_operator_rows_include_temperature_and_model() {
        let seed = SeedConfig::from_json_str(SEED).unwrap();
        let rows = operator_rows(&seed).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].index, 1);
        assert_eq!(rows[0].model, "flash");
        assert!((rows[0].temperature - 0.309).abs() < 1e-9);
        assert_eq!(rows[1].name, "Business Summary");
        assert_eq!(rows[1].model, "pro");
    }
}
