//! Seed configuration and engine settings.
//!
//! The seed file (`.gamma/seed.json` by default) carries the operator list,
//! model routing, the stage plan and the architecture/version labels echoed
//! into every assessment. Engine settings (credential, endpoint, bounds) come
//! from the environment, with CLI flags layered on top by the binaries.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GammaError, Result};
use crate::invoker::{InvokerOptions, ModelPolicy};
use crate::plan::StageDefinition;
use crate::registry::{OperatorRegistry, OperatorSpec};

/// Environment variable holding the inference service credential.
pub const CREDENTIAL_ENV: &str = "GOOGLE_API_KEY";

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_API_VERSION: &str = "v1beta";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8192;

/// An API credential. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a credential; blank values are rejected.
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(GammaError::MissingCredential(CREDENTIAL_ENV.to_string()));
        }
        Ok(Self(value))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Connection and bound settings for the inference service.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub credential: Credential,
    pub api_base: String,
    pub api_version: String,
    pub timeout: Duration,
    pub max_output_tokens: u32,
}

impl EngineSettings {
    /// Settings with defaults for everything but the credential.
    pub fn new(credential: Credential) -> Self {
        Self {
            credential,
            api_base: DEFAULT_API_BASE.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }

    /// Read settings from the environment.
    ///
    /// `GOOGLE_API_KEY` is required. Optional: `GAMMA_API_BASE`,
    /// `GAMMA_API_VERSION`, `GAMMA_TIMEOUT_SECS`, `GAMMA_MAX_OUTPUT_TOKENS`.
    pub fn from_env() -> Result<Self> {
        let credential = std::env::var(CREDENTIAL_ENV)
            .map_err(|_| GammaError::MissingCredential(CREDENTIAL_ENV.to_string()))
            .and_then(Credential::new)?;
        Self::from_lookup(credential, |key| std::env::var(key).ok())
    }

    /// Apply optional overrides from `lookup` on top of the defaults.
    pub fn from_lookup<F>(credential: Credential, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::new(credential);
        if let Some(base) = lookup("GAMMA_API_BASE") {
            settings.api_base = base;
        }
        if let Some(version) = lookup("GAMMA_API_VERSION") {
            settings.api_version = version;
        }
        if let Some(raw) = lookup("GAMMA_TIMEOUT_SECS") {
            let secs: u64 = raw
                .parse()
                .map_err(|_| GammaError::Config(format!("GAMMA_TIMEOUT_SECS: {raw:?}")))?;
            settings.timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = lookup("GAMMA_MAX_OUTPUT_TOKENS") {
            settings.max_output_tokens = raw
                .parse()
                .map_err(|_| GammaError::Config(format!("GAMMA_MAX_OUTPUT_TOKENS: {raw:?}")))?;
        }
        Ok(settings)
    }

    pub fn invoker_options(&self) -> InvokerOptions {
        InvokerOptions {
            timeout: self.timeout,
            max_output_tokens: self.max_output_tokens,
        }
    }
}

/// Architecture and version labels copied verbatim into assessment metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureLabels {
    pub architecture: String,
    pub version: String,
}

/// One entry of `operators.modes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorMode {
    /// Optional 1-based position; must match the entry's place in the list.
    #[serde(default)]
    pub n: Option<usize>,
    pub name: String,
    pub phi_factor: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorModes {
    pub modes: Vec<OperatorMode>,
}

/// The seed file as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    pub architecture: String,
    #[serde(default = "default_version")]
    pub version: String,
    pub operators: OperatorModes,
    pub models: ModelPolicy,
    #[serde(default)]
    pub stages: Vec<StageDefinition>,
}

fn default_version() -> String {
    "0.0.0".to_string()
}

impl SeedConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Build the operator registry, checking any explicit `n` positions.
    pub fn registry(&self) -> Result<OperatorRegistry> {
        let mut specs = Vec::with_capacity(self.operators.modes.len());
        for (position, mode) in (1..).zip(&self.operators.modes) {
            if let Some(n) = mode.n {
                if n != position {
                    return Err(GammaError::Config(format!(
                        "operator {} declares n={} but is listed at position {}",
                        mode.name, n, position
                    )));
                }
            }
            specs.push(OperatorSpec::new(&mode.name, mode.weight, mode.phi_factor));
        }
        OperatorRegistry::new(specs)
    }

    pub fn labels(&self) -> ArchitectureLabels {
        ArchitectureLabels {
            architecture: self.architecture.clone(),
            version: self.version.clone(),
        }
    }

    /// Distinct model identifiers in use (default first).
    pub fn model_names(&self) -> Vec<String> {
        self.models.model_names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = r#"{
        "architecture": "Gamma Finance",
        "version": "1.0.0",
        "operators": {"modes": [
            {"n": 1, "name": "Risk Classification", "phi_factor": 0.618, "weight": 0.40},
            {"n": 2, "name": "Business Summary", "phi_factor": 0.382, "weight": 0.30}
        ]},
        "models": {"default": "gemini-1.5-flash", "routes": {"Business Summary": "gemini-1.5-pro"}},
        "stages": [
            {"key": "risk_classification", "operator": "Risk Classification", "section": "section_1A"}
        ]
    }"#;

    #[test]
    fn test_seed_parses_and_builds_registry() {
        let seed = SeedConfig::from_json_str(SEED).unwrap();
        let registry = seed.registry().unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.by_index(2).unwrap().staging_factor, 0.382);
        assert_eq!(seed.stages.len(), 1);
        assert_eq!(
            seed.labels(),
            ArchitectureLabels {
                architecture: "Gamma Finance".to_string(),
                version: "1.0.0".to_string(),
            }
        );
    }

    #[test]
    fn test_seed_position_mismatch_rejected() {
        let raw = SEED.replace(r#""n": 2"#, r#""n": 5"#);
        let seed = SeedConfig::from_json_str(&raw).unwrap();
        assert!(matches!(seed.registry(), Err(GammaError::Config(_))));
    }

    #[test]
    fn test_model_names_lists_default_first() {
        let seed = SeedConfig::from_json_str(SEED).unwrap();
        assert_eq!(
            seed.model_names(),
            vec!["gemini-1.5-flash".to_string(), "gemini-1.5-pro".to_string()]
        );
    }

    #[test]
    fn test_seed_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        std::fs::write(&path, SEED).unwrap();
        let seed = SeedConfig::load(&path).unwrap();
        assert_eq!(seed.architecture, "Gamma Finance");
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let credential = Credential::new("super-secret").unwrap();
        assert_eq!(format!("{credential:?}"), "Credential(***)");
        assert_eq!(credential.expose(), "super-secret");
    }

    #[test]
    fn test_blank_credential_rejected() {
        assert!(matches!(
            Credential::new("   "),
            Err(GammaError::MissingCredential(_))
        ));
    }

    #[test]
    fn test_settings_overrides_from_lookup() {
        let credential = Credential::new("k").unwrap();
        let settings = EngineSettings::from_lookup(credential, |key| match key {
            "GAMMA_API_VERSION" => Some("v1".to_string()),
            "GAMMA_TIMEOUT_SECS" => Some("30".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(settings.api_version, "v1");
        assert_eq!(settings.api_base, DEFAULT_API_BASE);
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.max_output_tokens, DEFAULT_MAX_OUTPUT_TOKENS);
    }

    #[test]
    fn test_settings_rejects_unparseable_timeout() {
        let credential = Credential::new("k").unwrap();
        let result = EngineSettings::from_lookup(credential, |key| {
            (key == "GAMMA_TIMEOUT_SECS").then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(GammaError::Config(_))));
    }
}
