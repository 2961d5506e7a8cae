//! Error taxonomy for the orchestration engine.
//!
//! [`GammaError`] covers everything that can go wrong while *building* an
//! engine (configuration, templates, credentials) or addressing it directly.
//! Per-stage failures during an assessment are never raised; they are recorded
//! as [`InvocationResult::Failure`](crate::invoker::InvocationResult) data.

/// Gamma engine errors.
#[derive(Debug, thiserror::Error)]
pub enum GammaError {
    #[error("operator not found: {0}")]
    OperatorNotFound(String),

    #[error("operator index out of range: {index} (registry has {len} operators)")]
    OperatorIndexOutOfRange { index: usize, len: usize },

    #[error("duplicate operator: {0}")]
    DuplicateOperator(String),

    #[error("invalid operator {name}: {reason}")]
    InvalidOperator { name: String, reason: String },

    #[error("prompt template not found for operator: {0}")]
    TemplateNotFound(String),

    #[error("invalid stage plan: {0}")]
    InvalidPlan(String),

    #[error("missing credential: set {0}")]
    MissingCredential(String),

    #[error("malformed bundle: {0}")]
    MalformedBundle(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("http client error: {0}")]
    Http(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for Gamma engine operations.
pub type Result<T> = std::result::Result<T, GammaError>;
