//! Gamma Core Library
//!
//! Staged operator orchestration: a registry of weighted operators, a stage
//! invoker that performs one bounded call per operator against a remote
//! text-generation service, and an orchestrator that runs the applicable
//! stages over an input bundle and aggregates a weighted score.
//!
//! The sole assessment entry point is [`Orchestrator::assess`]; build one with
//! [`Engine::load`].

pub mod bundle;
pub mod config;
pub mod engine;
pub mod error;
pub mod fakes;
pub mod gemini;
pub mod invoker;
pub mod metrics;
pub mod obs;
pub mod orchestrator;
pub mod plan;
pub mod registry;
pub mod telemetry;
pub mod template;
pub mod transport;

pub use bundle::AssessmentBundle;
pub use config::{ArchitectureLabels, Credential, EngineSettings, SeedConfig, CREDENTIAL_ENV};
pub use engine::{Engine, EnginePaths};
pub use error::{GammaError, Result};
pub use gemini::GeminiTransport;
pub use invoker::{
    temperature_for, ErrorKind, InvocationResult, InvokerOptions, ModelPolicy, StageInvoker,
    TEMPERATURE_SCALE,
};
pub use metrics::{MetricsSnapshot, METRICS};
pub use orchestrator::{AssessmentMetadata, AssessmentResult, Orchestrator, DEADLINE_MESSAGE};
pub use plan::{AssessmentPlan, StageDefinition, StageDependency};
pub use registry::{OperatorRegistry, OperatorSpec};
pub use telemetry::init_tracing;
pub use template::{PromptTemplate, TemplateStore};
pub use transport::{InferenceTransport, InvocationRequest, TransportError};

/// Gamma version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
