use std::fmt;

use serde::{Deserialize, Serialize};

use super::{EditPlan, EvaluationResult, MetricVector};

/// The two revision stages and the metrics each one owns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Sentence length and clause ratio
    Structural,
    /// Lexical ratio
    Lexical,
}

impl StageKind {
    /// Whether an evaluation passes the metrics this stage owns
    pub fn passes(&self, evaluation: &EvaluationResult) -> bool {
        match self {
            StageKind::Structural => evaluation.structural_pass,
            StageKind::Lexical => evaluation.lexical_pass,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Structural => f.write_str("structural"),
            StageKind::Lexical => f.write_str("lexical"),
        }
    }
}

/// Parameter a generation task runs with
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationSetting {
    pub temperature: f64,
}

/// One generated rewrite, tagged with the setting that produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub text: String,
    pub setting: GenerationSetting,
    pub metrics: Option<MetricVector>,
    pub evaluation: Option<EvaluationResult>,
    /// Pass flag for the owning stage's metrics only
    pub passed: bool,
}

impl Candidate {
    /// A generated but not yet validated candidate
    pub fn generated(text: String, setting: GenerationSetting) -> Self {
        Self {
            text,
            setting,
            metrics: None,
            evaluation: None,
            passed: false,
        }
    }

    /// Attach validation results, scoping `passed` to `stage`
    pub fn validated(
        mut self,
        stage: StageKind,
        metrics: MetricVector,
        evaluation: EvaluationResult,
    ) -> Self {
        self.passed = stage.passes(&evaluation);
        self.metrics = Some(metrics);
        self.evaluation = Some(evaluation);
        self
    }
}

/// How a stage winner was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum SelectionMode {
    /// The only passing candidate
    Single,
    /// Chosen by the tie-breaker (1-based choice as returned)
    TieBreak { choice: usize },
    /// Tie-break reply was unusable; first passing candidate taken
    TieBreakDefaulted,
    /// No candidate passed; the nearest one is kept as a best-effort fallback
    BestEffort,
}

/// Winner of a stage, addressed by index into the stage's candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub index: usize,
    #[serde(flatten)]
    pub mode: SelectionMode,
}

impl Selection {
    pub fn is_fallback(&self) -> bool {
        self.mode == SelectionMode::BestEffort
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Skipped,
    Succeeded,
    Failed,
}

/// Audit record for one stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageOutcome {
    pub stage: StageKind,
    pub status: StageStatus,
    pub plan: Option<EditPlan>,
    pub candidates: Vec<Candidate>,
    pub selected: Option<Selection>,
    /// Generation tasks launched
    pub attempted: usize,
    pub generation_failures: usize,
    pub validation_failures: usize,
    pub sequential_fallback: bool,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StageOutcome {
    /// Record a stage that was not needed
    pub fn skipped(stage: StageKind) -> Self {
        Self {
            stage,
            status: StageStatus::Skipped,
            plan: None,
            candidates: vec![],
            selected: None,
            attempted: 0,
            generation_failures: 0,
            validation_failures: 0,
            sequential_fallback: false,
            elapsed_ms: 0,
            error: None,
        }
    }

    pub fn selected_candidate(&self) -> Option<&Candidate> {
        self.selected.and_then(|s| self.candidates.get(s.index))
    }

    pub fn succeeded(&self) -> bool {
        self.status == StageStatus::Succeeded
    }

    pub fn passed_count(&self) -> usize {
        self.candidates.iter().filter(|c| c.passed).count()
    }
}
