//! Structured observability hooks for the assessment lifecycle.
//!
//! This module provides:
//! - An assessment-scoped tracing span via [`assessment_span`]
//! - Emission functions for key lifecycle events: assessment start/finish,
//!   stage invoked/finished/skipped, deadline expiry
//!
//! Events are emitted at `info!` level (failures at `warn!`); filter with
//! `RUST_LOG`. For JSON output, start the binaries with `--json`.

use tracing::{info, warn};

use crate::invoker::InvocationResult;

/// Span tagged with the assessment id; every stage event nests inside it.
///
/// Attach it with [`tracing::Instrument`] so the future stays `Send`.
pub fn assessment_span(assessment_id: &str) -> tracing::Span {
    tracing::info_span!("gamma.assessment", assessment_id = %assessment_id)
}

/// Emit event: assessment started with the number of planned stages.
pub fn emit_assessment_started(planned_stages: usize, sections: &[&str]) {
    info!(
        event = "assessment.started",
        planned_stages = planned_stages,
        sections = ?sections,
    );
}

/// Emit event: assessment finished.
pub fn emit_assessment_finished(stages_executed: usize, score: f64, duration_ms: u64) {
    info!(
        event = "assessment.finished",
        stages_executed = stages_executed,
        score = score,
        duration_ms = duration_ms,
    );
}

/// Emit event: an operator is about to be called.
pub fn emit_stage_invoked(operator: &str, model: &str, staging_factor: f64, temperature: f64) {
    info!(
        event = "stage.invoked",
        operator = %operator,
        model = %model,
        staging_factor = staging_factor,
        temperature = temperature,
    );
}

/// Emit event: an operator call completed (successfully or not).
pub fn emit_stage_finished(operator: &str, result: &InvocationResult, duration_ms: u64) {
    match result {
        InvocationResult::Success { text } => info!(
            event = "stage.finished",
            operator = %operator,
            success = true,
            response_bytes = text.len(),
            duration_ms = duration_ms,
        ),
        InvocationResult::Failure { kind, message } => warn!(
            event = "stage.finished",
            operator = %operator,
            success = false,
            error_kind = %kind,
            error = %message,
            duration_ms = duration_ms,
        ),
    }
}

/// Emit event: a stage was not attempted.
pub fn emit_stage_skipped(stage: &str, reason: &str) {
    info!(event = "stage.skipped", stage = %stage, reason = %reason);
}

/// Emit event: the caller's deadline passed before `stage` could start.
pub fn emit_deadline_elapsed(stage: &str) {
    warn!(event = "assessment.deadline_elapsed", stage = %stage);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assessment_span_create() {
        let span = assessment_span("test-assessment-id");
        let _entered = span.enter();
    }
}
