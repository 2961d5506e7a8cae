//! Stage plan: which operator runs on which section, in what order, and
//! which stages consume an earlier stage's output.
//!
//! A plan is resolved once against the registry and template store, so an
//! unknown operator or missing template fails at startup instead of during an
//! assessment.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{GammaError, Result};
use crate::registry::{OperatorRegistry, OperatorSpec};
use crate::template::{PromptTemplate, TemplateStore};

/// Literal substituted for a failed prerequisite's output.
pub const DEFAULT_EMPTY_PLACEHOLDER: &str = "[]";

fn default_empty() -> String {
    DEFAULT_EMPTY_PLACEHOLDER.to_string()
}

/// Dependency of a stage on an earlier stage's output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDependency {
    /// Key of the prerequisite stage.
    pub stage: String,
    /// Placeholder that receives the prerequisite's output text.
    pub placeholder: String,
    /// Substituted instead when the prerequisite failed.
    #[serde(default = "default_empty")]
    pub empty: String,
}

/// One configured stage, as written in the seed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDefinition {
    /// Key of this stage in the assessment result.
    pub key: String,
    /// Registry name of the operator to invoke.
    pub operator: String,
    /// Bundle section the stage requires; substituted as `{input_text}`.
    pub section: String,
    /// Extra placeholder that also receives the section text.
    #[serde(default)]
    pub section_placeholder: Option<String>,
    #[serde(default)]
    pub after: Option<StageDependency>,
}

impl StageDefinition {
    /// An independent stage reading `section`.
    pub fn independent(
        key: impl Into<String>,
        operator: impl Into<String>,
        section: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            operator: operator.into(),
            section: section.into(),
            section_placeholder: None,
            after: None,
        }
    }

    /// Make this stage consume `prerequisite`'s output through `placeholder`.
    pub fn after(mut self, prerequisite: impl Into<String>, placeholder: impl Into<String>) -> Self {
        self.after = Some(StageDependency {
            stage: prerequisite.into(),
            placeholder: placeholder.into(),
            empty: default_empty(),
        });
        self
    }

    pub fn with_section_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.section_placeholder = Some(placeholder.into());
        self
    }

    pub fn is_dependent(&self) -> bool {
        self.after.is_some()
    }
}

/// A stage resolved against the registry and template store.
#[derive(Debug, Clone)]
pub struct PlannedStage {
    pub definition: StageDefinition,
    pub operator: OperatorSpec,
    pub template: PromptTemplate,
}

impl PlannedStage {
    pub fn key(&self) -> &str {
        &self.definition.key
    }
}

/// Ordered, validated list of stages.
#[derive(Debug, Clone)]
pub struct AssessmentPlan {
    stages: Vec<PlannedStage>,
}

impl AssessmentPlan {
    /// Resolve `definitions` in order.
    ///
    /// Fails on an unknown operator, a missing template, a duplicate key, or a
    /// dependency on a stage that is not defined earlier in the list.
    pub fn new(
        definitions: Vec<StageDefinition>,
        registry: &OperatorRegistry,
        templates: &TemplateStore,
    ) -> Result<Self> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut stages = Vec::with_capacity(definitions.len());

        for definition in definitions {
            if definition.key.trim().is_empty() {
                return Err(GammaError::InvalidPlan("stage key must not be empty".to_string()));
            }
            if seen.contains(&definition.key) {
                return Err(GammaError::InvalidPlan(format!(
                    "duplicate stage key: {}",
                    definition.key
                )));
            }
            if let Some(dep) = &definition.after {
                if !seen.contains(&dep.stage) {
                    return Err(GammaError::InvalidPlan(format!(
                        "stage {} depends on {}, which is not defined before it",
                        definition.key, dep.stage
                    )));
                }
            }

            let operator = registry.lookup(&definition.operator)?.clone();
            let template = templates.get(&operator)?.clone();

            seen.insert(definition.key.clone());
            stages.push(PlannedStage {
                definition,
                operator,
                template,
            });
        }

        Ok(Self { stages })
    }

    pub fn stages(&self) -> &[PlannedStage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Sum of weights of every planned stage: the best achievable score.
    pub fn max_score(&self) -> f64 {
        self.stages.iter().map(|s| s.operator.weight).sum()
    }
}
