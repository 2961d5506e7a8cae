//! Prompt templates and the one-time template store.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{GammaError, Result};
use crate::registry::{OperatorRegistry, OperatorSpec};

/// Placeholder every stage receives with its primary section text.
pub const INPUT_PLACEHOLDER: &str = "input_text";

/// A prompt template with `{name}` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    body: String,
}

impl PromptTemplate {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Substitute every placeholder named in `substitutions`.
    ///
    /// Placeholders without a substitution are left verbatim, so one template
    /// can serve inputs of slightly different shapes. Substituted values are
    /// inserted as-is and never scanned for placeholders themselves.
    pub fn render(&self, substitutions: &BTreeMap<String, String>) -> String {
        let mut out = String::with_capacity(self.body.len());
        let mut rest = self.body.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                out.push_str(&rest[open..]);
                rest = "";
                break;
            };
            match substitutions.get(&after[..close]) {
                Some(value) => {
                    out.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }

        out.push_str(rest);
        out
    }
}

/// Immutable cache of prompt templates keyed by operator name.
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    templates: HashMap<String, PromptTemplate>,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template for `operator`, builder style.
    pub fn with_template(mut self, operator: impl Into<String>, body: impl Into<String>) -> Self {
        self.templates
            .insert(operator.into(), PromptTemplate::new(body));
        self
    }

    /// Load `<dir>/<normalized operator name>.txt` for every registered operator.
    ///
    /// Operators without a file are logged and left out; whether that is fatal
    /// is decided when the stage plan is validated.
    pub fn load_dir(dir: &Path, registry: &OperatorRegistry) -> Result<Self> {
        let mut templates = HashMap::new();
        for op in registry.all() {
            let path = dir.join(format!("{}.txt", op.template_key()));
            if !path.exists() {
                warn!(operator = %op.name, path = %path.display(), "prompt template missing");
                continue;
            }
            let body = std::fs::read_to_string(&path)?;
            debug!(operator = %op.name, bytes = body.len(), "loaded prompt template");
            templates.insert(op.name.clone(), PromptTemplate::new(body));
        }
        Ok(Self { templates })
    }

    /// Template for `operator`, or [`GammaError::TemplateNotFound`].
    pub fn get(&self, operator: &OperatorSpec) -> Result<&PromptTemplate> {
        self.templates
            .get(&operator.name)
            .ok_or_else(|| GammaError::TemplateNotFound(operator.name.clone()))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
