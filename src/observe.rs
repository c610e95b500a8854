//! Observability hooks for the revision core.
//!
//! The evaluator, planner, pool, selector and controller never log. They
//! report to a [`RevisionObserver`], which the binary wires to `tracing`.

use tracing::{debug, info, warn};

use crate::error::CollaboratorError;
use crate::models::{
    EditPlan, EvaluationResult, GenerationSetting, RevisionSession, StageKind, StageOutcome,
};

/// Receives progress events from a revision. All methods default to no-ops.
pub trait RevisionObserver: Send + Sync {
    fn session_started(&self, _request_id: &str, _text_len: usize) {}

    fn original_evaluated(&self, _request_id: &str, _evaluation: &EvaluationResult) {}

    fn original_analysis_failed(&self, _request_id: &str, _error: &CollaboratorError) {}

    fn stage_skipped(&self, _request_id: &str, _stage: StageKind) {}

    fn planned(&self, _request_id: &str, _stage: StageKind, _plan: &EditPlan) {}

    /// The planner fell back to its default edit count
    fn planner_degraded(&self, _request_id: &str, _stage: StageKind, _plan: &EditPlan) {}

    fn generation_failed(
        &self,
        _request_id: &str,
        _stage: StageKind,
        _setting: GenerationSetting,
        _error: &CollaboratorError,
    ) {
    }

    fn validation_failed(
        &self,
        _request_id: &str,
        _stage: StageKind,
        _setting: GenerationSetting,
        _error: &CollaboratorError,
    ) {
    }

    /// No concurrent task succeeded; the batch is being retried sequentially
    fn sequential_fallback(&self, _request_id: &str, _stage: StageKind, _phase: &'static str) {}

    fn tie_break_defaulted(&self, _request_id: &str, _stage: StageKind, _reason: &str) {}

    fn stage_finished(&self, _request_id: &str, _outcome: &StageOutcome) {}

    fn session_finished(&self, _session: &RevisionSession) {}
}

/// Observer that discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RevisionObserver for NoopObserver {}

/// Observer that forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RevisionObserver for TracingObserver {
    fn session_started(&self, request_id: &str, text_len: usize) {
        info!(request_id, text_len, "revision started");
    }

    fn original_evaluated(&self, request_id: &str, evaluation: &EvaluationResult) {
        info!(
            request_id,
            structural_pass = evaluation.structural_pass,
            lexical_pass = evaluation.lexical_pass,
            "original evaluated"
        );
        debug!(request_id, "\n{}", evaluation.summary());
    }

    fn original_analysis_failed(&self, request_id: &str, error: &CollaboratorError) {
        warn!(request_id, error = %error, "analysis of original text failed");
    }

    fn stage_skipped(&self, request_id: &str, stage: StageKind) {
        info!(request_id, %stage, "stage skipped");
    }

    fn planned(&self, request_id: &str, stage: StageKind, plan: &EditPlan) {
        info!(
            request_id,
            %stage,
            metric = %plan.metric,
            direction = ?plan.direction,
            edit_count = plan.edit_count,
            "edit plan"
        );
    }

    fn planner_degraded(&self, request_id: &str, stage: StageKind, plan: &EditPlan) {
        warn!(
            request_id,
            %stage,
            metric = %plan.metric,
            edit_count = plan.edit_count,
            "supporting counts unusable, using default edit count"
        );
    }

    fn generation_failed(
        &self,
        request_id: &str,
        stage: StageKind,
        setting: GenerationSetting,
        error: &CollaboratorError,
    ) {
        warn!(
            request_id,
            %stage,
            temperature = setting.temperature,
            error = %error,
            "generation failed"
        );
    }

    fn validation_failed(
        &self,
        request_id: &str,
        stage: StageKind,
        setting: GenerationSetting,
        error: &CollaboratorError,
    ) {
        warn!(
            request_id,
            %stage,
            temperature = setting.temperature,
            error = %error,
            "validation failed"
        );
    }

    fn sequential_fallback(&self, request_id: &str, stage: StageKind, phase: &'static str) {
        warn!(request_id, %stage, phase, "no concurrent task succeeded, retrying sequentially");
    }

    fn tie_break_defaulted(&self, request_id: &str, stage: StageKind, reason: &str) {
        warn!(request_id, %stage, reason, "tie-break unusable, taking first passing candidate");
    }

    fn stage_finished(&self, request_id: &str, outcome: &StageOutcome) {
        info!(
            request_id,
            stage = %outcome.stage,
            status = ?outcome.status,
            candidates = outcome.candidates.len(),
            passed = outcome.passed_count(),
            elapsed_ms = outcome.elapsed_ms,
            "stage finished"
        );
    }

    fn session_finished(&self, session: &RevisionSession) {
        info!(
            request_id = %session.request_id,
            overall_success = session.overall_success,
            candidates_generated = session.candidates_generated(),
            elapsed_ms = session.elapsed_ms,
            "revision finished"
        );
    }
}
