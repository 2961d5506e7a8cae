//! Operator registry: the ordered, immutable set of configured operators.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{GammaError, Result};

/// Identity of one analysis stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorSpec {
    /// Unique within the registry.
    pub name: String,
    /// Contribution to the assessment score when the stage succeeds, in (0, 1].
    pub weight: f64,
    /// Tuning coefficient feeding the sampling temperature.
    pub staging_factor: f64,
}

impl OperatorSpec {
    pub fn new(name: impl Into<String>, weight: f64, staging_factor: f64) -> Self {
        Self {
            name: name.into(),
            weight,
            staging_factor,
        }
    }

    /// Normalized form used to address the operator's prompt template
    /// (lowercased, spaces replaced by underscores).
    pub fn template_key(&self) -> String {
        normalize_name(&self.name)
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(GammaError::InvalidOperator {
                name: self.name.clone(),
                reason: "name must not be empty".to_string(),
            });
        }
        if !(self.weight > 0.0 && self.weight <= 1.0) {
            return Err(GammaError::InvalidOperator {
                name: self.name.clone(),
                reason: format!("weight {} outside (0, 1]", self.weight),
            });
        }
        // Out-of-range temperatures are the service's call to reject, only
        // non-numbers are refused here.
        if !self.staging_factor.is_finite() {
            return Err(GammaError::InvalidOperator {
                name: self.name.clone(),
                reason: "staging factor must be finite".to_string(),
            });
        }
        Ok(())
    }
}

/// Lowercase and replace spaces with underscores.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Read-only, ordered collection of [`OperatorSpec`]s.
#[derive(Debug, Clone)]
pub struct OperatorRegistry {
    operators: Vec<OperatorSpec>,
}

impl OperatorRegistry {
    /// Build a registry, validating every spec and rejecting duplicate names.
    pub fn new(operators: Vec<OperatorSpec>) -> Result<Self> {
        let mut seen = HashSet::new();
        for op in &operators {
            op.validate()?;
            if !seen.insert(op.name.as_str()) {
                return Err(GammaError::DuplicateOperator(op.name.clone()));
            }
        }
        Ok(Self { operators })
    }

    /// Look up an operator by exact name.
    pub fn lookup(&self, name: &str) -> Result<&OperatorSpec> {
        self.operators
            .iter()
            .find(|op| op.name == name)
            .ok_or_else(|| GammaError::OperatorNotFound(name.to_string()))
    }

    /// 1-based positional lookup, in configuration order.
    pub fn by_index(&self, index: usize) -> Result<&OperatorSpec> {
        index
            .checked_sub(1)
            .and_then(|i| self.operators.get(i))
            .ok_or(GammaError::OperatorIndexOutOfRange {
                index,
                len: self.operators.len(),
            })
    }

    /// Resolve either a 1-based index (`"2"`) or an operator name.
    pub fn resolve(&self, selector: &str) -> Result<&OperatorSpec> {
        match selector.trim().parse::<usize>() {
            Ok(index) => self.by_index(index),
            Err(_) => self.lookup(selector),
        }
    }

    /// All operators in configuration order.
    pub fn all(&self) -> &[OperatorSpec] {
        &self.operators
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    /// SHA-256 hex digest of the canonical JSON of all operator specs.
    ///
    /// Two registries built from the same configuration have the same digest.
    pub fn digest(&self) -> Result<String> {
        use sha2::Digest as _;
        let bytes = serde_json::to_vec(&self.operators)?;
        Ok(hex::encode(sha2::Sha256::digest(&bytes)))
    }
}
