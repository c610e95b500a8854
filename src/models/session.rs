use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EvaluationResult, MetricVector, StageOutcome};

/// Request-scoped record of one revision, returned to the caller and never persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionSession {
    pub request_id: String,
    pub started_at: DateTime<Utc>,
    pub original_text: String,
    pub original_metrics: Option<MetricVector>,
    pub original_evaluation: Option<EvaluationResult>,
    pub stages: Vec<StageOutcome>,
    /// Revised text; `None` when no stage produced usable output
    pub final_text: Option<String>,
    pub final_metrics: Option<MetricVector>,
    pub final_evaluation: Option<EvaluationResult>,
    pub overall_success: bool,
    pub error_message: Option<String>,
    pub elapsed_ms: u64,
}

impl RevisionSession {
    pub fn new(request_id: impl Into<String>, original_text: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            started_at: Utc::now(),
            original_text: original_text.into(),
            original_metrics: None,
            original_evaluation: None,
            stages: vec![],
            final_text: None,
            final_metrics: None,
            final_evaluation: None,
            overall_success: false,
            error_message: None,
            elapsed_ms: 0,
        }
    }

    /// Final text when present, otherwise the last known-good stage text, otherwise the original
    pub fn best_effort_text(&self) -> &str {
        if let Some(text) = &self.final_text {
            return text;
        }
        self.stages
            .iter()
            .rev()
            .filter_map(|s| s.selected_candidate())
            .find(|c| c.passed)
            .map(|c| c.text.as_str())
            .unwrap_or(&self.original_text)
    }

    pub fn candidates_generated(&self) -> usize {
        self.stages.iter().map(|s| s.candidates.len()).sum()
    }

    pub fn candidates_passed(&self) -> usize {
        self.stages.iter().map(|s| s.passed_count()).sum()
    }

    pub fn stage(&self, kind: super::StageKind) -> Option<&StageOutcome> {
        self.stages.iter().find(|s| s.stage == kind)
    }
}
