//! Assessment orchestrator.
//!
//! Runs the planned stages over a bundle strictly in order, threads the output
//! of a prerequisite stage into its dependents, and aggregates a weighted
//! score. A stage failure is recorded and never aborts the assessment.
//!
//! Stage selection per assessment:
//!
//! - independent stage: runs iff its section is present;
//! - dependent stage: runs iff its prerequisite was attempted in this
//!   assessment and its own section is present. A failed prerequisite is
//!   replaced by the dependency's `empty` literal.
//!
//! Skipped stages are left out of the result entirely.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant as StdInstant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Instant;
use tracing::{warn, Instrument};
use uuid::Uuid;

use crate::bundle::AssessmentBundle;
use crate::config::ArchitectureLabels;
use crate::error::Result;
use crate::invoker::{ErrorKind, InvocationResult, StageInvoker};
use crate::metrics::METRICS;
use crate::obs::{
    assessment_span, emit_assessment_finished, emit_assessment_started, emit_deadline_elapsed,
    emit_stage_skipped,
};
use crate::plan::{AssessmentPlan, PlannedStage};
use crate::registry::OperatorRegistry;
use crate::template::{TemplateStore, INPUT_PLACEHOLDER};

/// Failure message recorded for stages not started because the deadline passed.
pub const DEADLINE_MESSAGE: &str = "assessment deadline elapsed before stage started";

/// Cosmetic metadata attached to every assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentMetadata {
    pub architecture: String,
    pub version: String,
    pub operators_executed: usize,
    pub assessment_id: Uuid,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// Digest of the operator registry the assessment ran against.
    pub config_digest: String,
}

/// Outcome of one assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentResult {
    /// Stage key → outcome, for every attempted stage.
    pub results: BTreeMap<String, InvocationResult>,
    /// Sum of weights of successful stages.
    #[serde(rename = "overall_score")]
    pub score: f64,
    #[serde(flatten)]
    pub metadata: AssessmentMetadata,
}

impl AssessmentResult {
    /// Compare `results` and `score`, ignoring metadata.
    pub fn same_outcome(&self, other: &AssessmentResult) -> bool {
        self.results == other.results && self.score == other.score
    }

    pub fn succeeded(&self) -> usize {
        self.results.values().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}

/// The engine's public entry point.
///
/// Holds only immutable, shared state; clone it freely across tasks.
#[derive(Clone)]
pub struct Orchestrator {
    registry: Arc<OperatorRegistry>,
    templates: Arc<TemplateStore>,
    plan: Arc<AssessmentPlan>,
    invoker: StageInvoker,
    labels: ArchitectureLabels,
    config_digest: String,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<OperatorRegistry>,
        templates: Arc<TemplateStore>,
        plan: Arc<AssessmentPlan>,
        invoker: StageInvoker,
        labels: ArchitectureLabels,
    ) -> Result<Self> {
        let config_digest = registry.digest()?;
        Ok(Self {
            registry,
            templates,
            plan,
            invoker,
            labels,
            config_digest,
        })
    }

    pub fn registry(&self) -> &OperatorRegistry {
        &self.registry
    }

    pub fn plan(&self) -> &AssessmentPlan {
        &self.plan
    }

    pub fn invoker(&self) -> &StageInvoker {
        &self.invoker
    }

    pub fn labels(&self) -> &ArchitectureLabels {
        &self.labels
    }

    /// Run every applicable stage over `bundle`.
    pub async fn assess(&self, bundle: &AssessmentBundle) -> AssessmentResult {
        self.assess_until(bundle, None).await
    }

    /// Like [`assess`](Self::assess), honoring `deadline` between stages.
    ///
    /// An in-flight call is not interrupted; stages that would start after
    /// the deadline are recorded as [`ErrorKind::Timeout`] without being
    /// invoked.
    pub async fn assess_until(
        &self,
        bundle: &AssessmentBundle,
        deadline: Option<Instant>,
    ) -> AssessmentResult {
        let assessment_id = Uuid::new_v4();
        let span = assessment_span(&assessment_id.to_string());
        self.run_stages(assessment_id, bundle, deadline)
            .instrument(span)
            .await
    }

    async fn run_stages(
        &self,
        assessment_id: Uuid,
        bundle: &AssessmentBundle,
        deadline: Option<Instant>,
    ) -> AssessmentResult {
        let start = StdInstant::now();
        emit_assessment_started(self.plan.len(), &bundle.present_sections());

        let mut results: BTreeMap<String, InvocationResult> = BTreeMap::new();

        for stage in self.plan.stages() {
            let Some(substitutions) = self.substitutions_for(stage, bundle, &results) else {
                continue;
            };

            let outcome = if deadline.is_some_and(|d| Instant::now() >= d) {
                emit_deadline_elapsed(stage.key());
                InvocationResult::failure(ErrorKind::Timeout, DEADLINE_MESSAGE)
            } else {
                self.invoker
                    .invoke(&stage.operator, &stage.template, &substitutions)
                    .await
            };
            results.insert(stage.key().to_string(), outcome);
        }

        let score = self.score(&results);
        let duration_ms = start.elapsed().as_millis() as u64;
        emit_assessment_finished(results.len(), score, duration_ms);
        METRICS.inc_assessments();

        self.finish(assessment_id, results, score, duration_ms)
    }

    /// Invoke a single operator outside any plan.
    ///
    /// `selector` is a 1-based index or an operator name; `input` fills
    /// `{input_text}`. Unknown operators and missing templates are errors,
    /// call failures are data.
    pub async fn invoke_operator(&self, selector: &str, input: &str) -> Result<InvocationResult> {
        let spec = self.registry.resolve(selector)?;
        let template = self.templates.get(spec)?;
        let substitutions =
            BTreeMap::from([(INPUT_PLACEHOLDER.to_string(), input.to_string())]);
        Ok(self.invoker.invoke(spec, template, &substitutions).await)
    }

    /// Assess an untyped bundle.
    ///
    /// A malformed value yields an empty result with score 0.
    pub async fn assess_value(&self, value: &Value) -> AssessmentResult {
        match AssessmentBundle::from_value(value) {
            Ok(bundle) => self.assess(&bundle).await,
            Err(err) => {
                warn!(event = "assessment.malformed_bundle", error = %err);
                self.finish(Uuid::new_v4(), BTreeMap::new(), 0.0, 0)
            }
        }
    }

    /// Substitutions for `stage`, or `None` when the stage must be skipped.
    fn substitutions_for(
        &self,
        stage: &PlannedStage,
        bundle: &AssessmentBundle,
        results: &BTreeMap<String, InvocationResult>,
    ) -> Option<BTreeMap<String, String>> {
        let def = &stage.definition;

        let mut substitutions = BTreeMap::new();
        if let Some(dep) = &def.after {
            let Some(prior) = results.get(&dep.stage) else {
                emit_stage_skipped(&def.key, "prerequisite not attempted");
                METRICS.inc_stages_skipped();
                return None;
            };
            let prior_text = prior.text().unwrap_or(dep.empty.as_str());
            substitutions.insert(dep.placeholder.clone(), prior_text.to_string());
        }

        let Some(text) = bundle.section(&def.section) else {
            emit_stage_skipped(&def.key, "section absent");
            METRICS.inc_stages_skipped();
            return None;
        };
        substitutions.insert(INPUT_PLACEHOLDER.to_string(), text.to_string());
        if let Some(placeholder) = &def.section_placeholder {
            substitutions.insert(placeholder.clone(), text.to_string());
        }

        Some(substitutions)
    }

    fn score(&self, results: &BTreeMap<String, InvocationResult>) -> f64 {
        self.plan
            .stages()
            .iter()
            .filter(|stage| results.get(stage.key()).is_some_and(InvocationResult::is_success))
            .map(|stage| stage.operator.weight)
            .sum()
    }

    fn finish(
        &self,
        assessment_id: Uuid,
        results: BTreeMap<String, InvocationResult>,
        score: f64,
        duration_ms: u64,
    ) -> AssessmentResult {
        AssessmentResult {
            metadata: AssessmentMetadata {
                architecture: self.labels.architecture.clone(),
                version: self.labels.version.clone(),
                operators_executed: results.len(),
                assessment_id,
                completed_at: Utc::now(),
                duration_ms,
                config_digest: self.config_digest.clone(),
            },
            results,
            score,
        }
    }
}
