use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ValidationInputError;
use crate::models::{
    EvaluationResult, MetricVector, RevisionSession, StageKind, StageOutcome, StageStatus,
};

/// Where a revision ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionStatus {
    /// Every metric in band
    Final,
    /// The structural stage produced nothing usable
    StructuralFail,
    /// The lexical stage did not reach its band
    LexicalFail,
    /// The request never reached a stage
    Error,
}

/// Body returned for one revision, standalone or as a batch item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviseResponse {
    pub request_id: String,
    pub status: RevisionStatus,
    pub overall_success: bool,
    /// Set when `final_text` differs from the submitted text
    pub revised: bool,
    /// Best available text: the final text, else the last passing stage text, else the original
    pub final_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structural_pass: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lexical_pass: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_result: Option<String>,
    pub original_metrics: Option<MetricVector>,
    pub final_metrics: Option<MetricVector>,
    pub stage_audit: Vec<StageOutcome>,
    pub candidates_generated: usize,
    pub candidates_passed: usize,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ReviseResponse {
    pub fn from_session(session: RevisionSession) -> Self {
        let status = status_of(&session);
        let final_text = session.best_effort_text().to_string();
        let revised = final_text != session.original_text;

        // Report against the final text when there is one, else the original
        let evaluation = session.final_evaluation.or(session.original_evaluation);
        let final_metrics = session.final_metrics.or(if revised {
            None
        } else {
            session.original_metrics
        });

        Self {
            candidates_generated: session.candidates_generated(),
            candidates_passed: session.candidates_passed(),
            request_id: session.request_id,
            status,
            overall_success: session.overall_success,
            revised,
            final_text,
            structural_pass: evaluation.map(|e| e.structural_pass),
            lexical_pass: evaluation.map(|e| e.lexical_pass),
            detailed_result: evaluation.as_ref().map(EvaluationResult::summary),
            original_metrics: session.original_metrics,
            final_metrics,
            stage_audit: session.stages,
            elapsed_ms: session.elapsed_ms,
            error_message: session.error_message,
        }
    }

    /// Response for a batch item whose input was rejected before revision
    pub fn rejected(request_id: String, text: String, error: &ValidationInputError) -> Self {
        Self {
            request_id,
            status: RevisionStatus::Error,
            overall_success: false,
            revised: false,
            final_text: text,
            structural_pass: None,
            lexical_pass: None,
            detailed_result: None,
            original_metrics: None,
            final_metrics: None,
            stage_audit: vec![],
            candidates_generated: 0,
            candidates_passed: 0,
            elapsed_ms: 0,
            error_message: Some(error.to_string()),
        }
    }

    /// Write to a JSON file
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        serde_json::to_writer_pretty(file, self).context("Failed to write JSON")?;
        Ok(())
    }
}

fn status_of(session: &RevisionSession) -> RevisionStatus {
    if session.overall_success {
        return RevisionStatus::Final;
    }
    if session.original_evaluation.is_none() {
        return RevisionStatus::Error;
    }
    match session.stage(StageKind::Structural) {
        Some(stage) if stage.status == StageStatus::Failed => RevisionStatus::StructuralFail,
        _ => RevisionStatus::LexicalFail,
    }
}

/// Body of `POST /batch-revise`, results in item order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReviseResponse {
    pub results: Vec<ReviseResponse>,
}

/// Body of `POST /analyze`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub metrics: MetricVector,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<EvaluationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_result: Option<String>,
}

impl AnalyzeResponse {
    pub fn new(metrics: MetricVector, evaluation: Option<EvaluationResult>) -> Self {
        Self {
            metrics,
            detailed_result: evaluation.as_ref().map(EvaluationResult::summary),
            evaluation,
        }
    }
}

/// Error body for rejected requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
