//! One-time engine initialization.
//!
//! Loads the seed and prompt templates exactly once and wires an immutable
//! [`Orchestrator`]. Binaries call [`Engine::load`]; tests build from an
//! in-memory [`SeedConfig`] with a stub transport via [`Engine::from_seed`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::config::{EngineSettings, SeedConfig};
use crate::error::Result;
use crate::gemini::GeminiTransport;
use crate::invoker::{InvokerOptions, StageInvoker};
use crate::orchestrator::Orchestrator;
use crate::plan::AssessmentPlan;
use crate::template::TemplateStore;
use crate::transport::InferenceTransport;

/// Default location of the seed file.
pub const DEFAULT_SEED_PATH: &str = ".gamma/seed.json";
/// Default prompt template directory.
pub const DEFAULT_PROMPTS_DIR: &str = "src/prompts";

/// Filesystem locations of the engine's configuration.
#[derive(Debug, Clone)]
pub struct EnginePaths {
    pub seed: PathBuf,
    pub prompts: PathBuf,
}

impl Default for EnginePaths {
    fn default() -> Self {
        Self {
            seed: PathBuf::from(DEFAULT_SEED_PATH),
            prompts: PathBuf::from(DEFAULT_PROMPTS_DIR),
        }
    }
}

/// Engine construction entry points.
pub struct Engine;

impl Engine {
    /// Load seed and templates from disk and wire the Gemini transport.
    pub fn load(paths: &EnginePaths, settings: &EngineSettings) -> Result<Orchestrator> {
        let seed = SeedConfig::load(&paths.seed)?;
        let transport: Arc<dyn InferenceTransport> =
            Arc::new(GeminiTransport::from_settings(settings)?);
        Self::from_seed_dir(seed, &paths.prompts, transport, settings.invoker_options())
    }

    /// Build from a parsed seed, reading templates from `prompts_dir`.
    pub fn from_seed_dir(
        seed: SeedConfig,
        prompts_dir: &Path,
        transport: Arc<dyn InferenceTransport>,
        options: InvokerOptions,
    ) -> Result<Orchestrator> {
        let registry = seed.registry()?;
        let templates = TemplateStore::load_dir(prompts_dir, &registry)?;
        Self::from_seed(seed, templates, transport, options)
    }

    /// Build from a parsed seed and an already-populated template store.
    pub fn from_seed(
        seed: SeedConfig,
        templates: TemplateStore,
        transport: Arc<dyn InferenceTransport>,
        options: InvokerOptions,
    ) -> Result<Orchestrator> {
        let registry = seed.registry()?;
        seed.models.validate(&registry)?;
        let plan = AssessmentPlan::new(seed.stages.clone(), &registry, &templates)?;

        info!(
            event = "engine.initialized",
            architecture = %seed.architecture,
            operators = registry.len(),
            stages = plan.len(),
            templates = templates.len(),
            transport = transport.name(),
        );

        let invoker = StageInvoker::new(transport, seed.models.clone(), options);
        Orchestrator::new(
            Arc::new(registry),
            Arc::new(templates),
            Arc::new(plan),
            invoker,
            seed.labels(),
        )
    }
}
