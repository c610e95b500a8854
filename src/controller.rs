use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::analyzer::Analyzer;
use crate::config::RevisionConfig;
use crate::error::{CollaboratorError, ValidationInputError};
use crate::llm::{Generator, TieBreaker};
use crate::models::{
    Bands, Metric, MetricVector, RevisionSession, StageKind, StageOutcome, ToleranceSpec,
};
use crate::observe::RevisionObserver;
use crate::scoring::{evaluate_bands, structural_problem, MagnitudePlanner};
use crate::stages::{CandidatePool, StageContext, StageRequest, StageRunner, StageSelector};

/// Remote capabilities the controller drives
#[derive(Clone)]
pub struct Collaborators {
    pub analyzer: Arc<dyn Analyzer>,
    pub generator: Arc<dyn Generator>,
    pub tie_breaker: Arc<dyn TieBreaker>,
}

/// Text a stage starts from, with its already-known metrics
#[derive(Debug, Clone)]
struct Seed {
    text: String,
    metrics: MetricVector,
}

#[derive(Debug)]
enum State {
    AnalyzeOriginal,
    StructuralFix { metric: Metric, seed: Seed },
    LexicalFix { seed: Seed },
    DonePass { seed: Seed },
    Done,
}

/// Drives one passage through at most one structural and one lexical stage
pub struct RevisionController {
    analyzer: Arc<dyn Analyzer>,
    runner: StageRunner,
    config: RevisionConfig,
    observer: Arc<dyn RevisionObserver>,
}

impl RevisionController {
    pub fn new(
        config: RevisionConfig,
        collaborators: Collaborators,
        observer: Arc<dyn RevisionObserver>,
    ) -> Result<Self, ValidationInputError> {
        config.validate()?;

        let timeout = config.call_timeout();
        let runner = StageRunner::new(
            CandidatePool::new(collaborators.generator, collaborators.analyzer.clone(), timeout),
            StageSelector::new(collaborators.tie_breaker, timeout),
            MagnitudePlanner::new(config.default_edit_count),
            config.generation_settings.clone(),
            config.candidates_per_setting,
        );

        Ok(Self {
            analyzer: collaborators.analyzer,
            runner,
            config,
            observer,
        })
    }

    pub fn config(&self) -> &RevisionConfig {
        &self.config
    }

    /// Analyze a text, bounded by the configured call timeout
    pub async fn analyze(&self, text: &str) -> Result<MetricVector, CollaboratorError> {
        let timeout = self.config.call_timeout();
        tokio::time::timeout(timeout, self.analyzer.analyze(text))
            .await
            .unwrap_or_else(|_| Err(CollaboratorError::Timeout(timeout)))
    }

    /// Revise `text` toward the bands of `tolerance`.
    ///
    /// Only malformed input is an error. Every collaborator or stage failure
    /// is recorded in the returned session with `overall_success = false`.
    pub async fn revise(
        &self,
        request_id: Option<String>,
        text: &str,
        tolerance: &ToleranceSpec,
    ) -> Result<RevisionSession, ValidationInputError> {
        if text.trim().is_empty() {
            return Err(ValidationInputError::EmptyText);
        }
        let bands = tolerance.bands()?;

        let start = Instant::now();
        let request_id = request_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let ctx = StageContext::new(request_id.clone(), self.observer.clone());
        let mut session = RevisionSession::new(request_id, text);

        self.observer.session_started(&ctx.request_id, text.len());

        let mut state = State::AnalyzeOriginal;
        loop {
            state = match state {
                State::AnalyzeOriginal => self.analyze_original(&mut session, &bands, &ctx).await,
                State::StructuralFix { metric, seed } => {
                    self.structural_fix(&mut session, metric, seed, &bands, &ctx).await
                }
                State::LexicalFix { seed } => {
                    self.lexical_fix(&mut session, seed, &bands, &ctx).await
                }
                State::DonePass { seed } => {
                    session.final_evaluation = Some(evaluate_bands(&seed.metrics, &bands));
                    session.final_metrics = Some(seed.metrics);
                    session.final_text = Some(seed.text);
                    session.overall_success = true;
                    State::Done
                }
                State::Done => break,
            };
        }

        session.elapsed_ms = start.elapsed().as_millis() as u64;
        self.observer.session_finished(&session);
        Ok(session)
    }

    async fn analyze_original(
        &self,
        session: &mut RevisionSession,
        bands: &Bands,
        ctx: &StageContext,
    ) -> State {
        let metrics = match self.analyze(&session.original_text).await {
            Ok(metrics) => metrics,
            Err(e) => {
                self.observer.original_analysis_failed(&ctx.request_id, &e);
                session.error_message = Some(format!("analysis of original text failed: {e}"));
                return State::Done;
            }
        };

        let evaluation = evaluate_bands(&metrics, bands);
        session.original_metrics = Some(metrics);
        session.original_evaluation = Some(evaluation);
        self.observer.original_evaluated(&ctx.request_id, &evaluation);

        let seed = Seed {
            text: session.original_text.clone(),
            metrics,
        };

        match structural_problem(&evaluation) {
            Some(metric) => State::StructuralFix { metric, seed },
            None if evaluation.lexical_pass => State::DonePass { seed },
            None => {
                session.stages.push(StageOutcome::skipped(StageKind::Structural));
                self.observer.stage_skipped(&ctx.request_id, StageKind::Structural);
                State::LexicalFix { seed }
            }
        }
    }

    async fn structural_fix(
        &self,
        session: &mut RevisionSession,
        metric: Metric,
        seed: Seed,
        bands: &Bands,
        ctx: &StageContext,
    ) -> State {
        let request = StageRequest {
            stage: StageKind::Structural,
            metric,
            seed_text: &seed.text,
            seed_metrics: &seed.metrics,
            bands,
        };

        let outcome = match self.runner.run(request, ctx).await {
            Ok(outcome) => outcome,
            Err(failure) => {
                session.error_message = Some(failure.error.to_string());
                session.stages.push(failure.outcome);
                return State::Done;
            }
        };

        let winner = outcome
            .selected_candidate()
            .and_then(|c| Some((c.text.clone(), c.metrics?, c.evaluation?)));
        session.stages.push(outcome);

        let Some((text, metrics, evaluation)) = winner else {
            session.error_message =
                Some("structural stage selected no validated candidate".to_string());
            return State::Done;
        };

        // Lexical pass comes from the validation metrics; no second analysis
        if evaluation.lexical_pass {
            session.final_text = Some(text);
            session.final_metrics = Some(metrics);
            session.final_evaluation = Some(evaluation);
            session.overall_success = true;
            State::Done
        } else {
            State::LexicalFix {
                seed: Seed { text, metrics },
            }
        }
    }

    async fn lexical_fix(
        &self,
        session: &mut RevisionSession,
        seed: Seed,
        bands: &Bands,
        ctx: &StageContext,
    ) -> State {
        let request = StageRequest {
            stage: StageKind::Lexical,
            metric: Metric::LexicalRatio,
            seed_text: &seed.text,
            seed_metrics: &seed.metrics,
            bands,
        };

        let (outcome, passed) = match self.runner.run(request, ctx).await {
            Ok(outcome) => (outcome, true),
            Err(failure) => {
                session.error_message = Some(failure.error.to_string());
                (failure.outcome, false)
            }
        };

        let chosen = outcome
            .selected_candidate()
            .and_then(|c| Some((c.text.clone(), c.metrics?, c.evaluation?)));
        session.stages.push(outcome);

        match chosen {
            Some((text, metrics, evaluation)) => {
                session.final_text = Some(text);
                session.final_metrics = Some(metrics);
                session.final_evaluation = Some(evaluation);
                session.overall_success = passed && evaluation.lexical_pass;
            }
            None => {
                session.final_evaluation = Some(evaluate_bands(&seed.metrics, bands));
                session.final_metrics = Some(seed.metrics);
                session.final_text = Some(seed.text);
                session.overall_success = false;
            }
        }

        State::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{ReviseResponse, RevisionStatus};
    use crate::models::{Margins, SelectionMode, StageStatus, SupportingCounts, TargetMetrics};
    use crate::observe::NoopObserver;
    use crate::testing::{FailingGenerator, ScriptedAnalyzer, ScriptedGenerator, ScriptedTieBreaker};

    const ORIGINAL: &str = "The original passage, which is long.";

    fn tolerance() -> ToleranceSpec {
        ToleranceSpec::new(
            TargetMetrics {
                structural_len: 10.0,
                clause_ratio: 0.5,
                lexical_ratio: 0.5,
            },
            Margins::default(),
        )
        .unwrap()
    }

    fn counts() -> SupportingCounts {
        SupportingCounts {
            sentence_count: Some(5),
            token_count: Some(100),
            clause_sentence_count: Some(2),
            nvjd_total: Some(40),
            nvjd_simple_count: Some(36),
        }
    }

    fn controller(
        analyzer: Arc<ScriptedAnalyzer>,
        generator: Arc<dyn Generator>,
        tie_breaker: Arc<ScriptedTieBreaker>,
    ) -> RevisionController {
        RevisionController::new(
            RevisionConfig::default(),
            Collaborators {
                analyzer,
                generator,
                tie_breaker,
            },
            Arc::new(NoopObserver),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_already_in_band_returns_original() {
        let analyzer =
            Arc::new(ScriptedAnalyzer::new().with(ORIGINAL, MetricVector::new(10.0, 0.5, 0.5)));
        let generator = Arc::new(FailingGenerator::default());
        let controller = controller(
            analyzer,
            generator.clone(),
            Arc::new(ScriptedTieBreaker::failing()),
        );

        let session = controller.revise(None, ORIGINAL, &tolerance()).await.unwrap();

        assert!(session.overall_success);
        assert_eq!(session.final_text.as_deref(), Some(ORIGINAL));
        assert_eq!(session.candidates_generated(), 0);
        assert_eq!(generator.calls(), 0);
        assert!(!session.request_id.is_empty());
    }

    #[tokio::test]
    async fn test_structural_fix_that_also_passes_lexical_stops() {
        let analyzer = Arc::new(
            ScriptedAnalyzer::new()
                .with(ORIGINAL, MetricVector::new(20.0, 0.5, 0.5).with_counts(counts()))
                .with("Short. Clear.", MetricVector::new(10.0, 0.5, 0.5)),
        );
        let generator = Arc::new(ScriptedGenerator::always("Short. Clear."));
        let tie_breaker = Arc::new(ScriptedTieBreaker::replying("2"));
        let controller = controller(analyzer.clone(), generator.clone(), tie_breaker.clone());

        let session = controller
            .revise(Some("req-b".to_string()), ORIGINAL, &tolerance())
            .await
            .unwrap();

        assert!(session.overall_success);
        assert_eq!(session.request_id, "req-b");
        assert_eq!(session.final_text.as_deref(), Some("Short. Clear."));
        assert_eq!(session.stages.len(), 1);
        assert_eq!(session.stages[0].stage, StageKind::Structural);
        assert_eq!(session.candidates_generated(), 4);
        assert_eq!(session.candidates_passed(), 4);
        assert_eq!(tie_breaker.calls(), 1);
        // original + four validations, nothing re-analyzed afterwards
        assert_eq!(analyzer.calls(), 5);

        let mut temperatures = generator.temperatures();
        temperatures.sort_by(f64::total_cmp);
        assert_eq!(temperatures, vec![0.2, 0.2, 0.3, 0.3]);
    }

    #[tokio::test]
    async fn test_structural_result_seeds_lexical_stage() {
        let analyzer = Arc::new(
            ScriptedAnalyzer::new()
                .with(ORIGINAL, MetricVector::new(20.0, 0.5, 0.9).with_counts(counts()))
                .with("Short hard words.", MetricVector::new(10.0, 0.5, 0.9).with_counts(counts()))
                .with("Short easy words.", MetricVector::new(10.0, 0.5, 0.5)),
        );
        let generator = Arc::new(
            ScriptedGenerator::new()
                .when(Metric::StructuralLen.label(), "Short hard words.")
                .when(Metric::LexicalRatio.label(), "Short easy words."),
        );
        let controller = controller(
            analyzer,
            generator.clone(),
            Arc::new(ScriptedTieBreaker::replying("1")),
        );

        let session = controller.revise(None, ORIGINAL, &tolerance()).await.unwrap();

        assert!(session.overall_success);
        assert_eq!(session.stages.len(), 2);
        assert_eq!(session.stages[0].status, StageStatus::Succeeded);
        assert_eq!(session.stages[1].stage, StageKind::Lexical);
        assert_eq!(session.final_text.as_deref(), Some("Short easy words."));

        let lexical_prompts: Vec<String> = generator
            .prompts()
            .into_iter()
            .filter(|p| p.contains(Metric::LexicalRatio.label()))
            .collect();
        assert_eq!(lexical_prompts.len(), 4);
        assert!(lexical_prompts.iter().all(|p| p.contains("Short hard words.")));
    }

    #[tokio::test]
    async fn test_lexical_exhausted_after_structural_keeps_structural_text() {
        let analyzer = Arc::new(
            ScriptedAnalyzer::new()
                .with(ORIGINAL, MetricVector::new(20.0, 0.5, 0.9).with_counts(counts()))
                .with("Short hard words.", MetricVector::new(10.0, 0.5, 0.9).with_counts(counts())),
        );
        // No rule for lexical prompts, so every lexical call fails
        let generator = Arc::new(
            ScriptedGenerator::new().when(Metric::StructuralLen.label(), "Short hard words."),
        );
        let controller = controller(
            analyzer,
            generator.clone(),
            Arc::new(ScriptedTieBreaker::replying("1")),
        );

        let session = controller.revise(None, ORIGINAL, &tolerance()).await.unwrap();

        assert!(!session.overall_success);
        assert_eq!(session.stages.len(), 2);
        assert_eq!(session.stages[0].status, StageStatus::Succeeded);
        assert_eq!(session.stages[1].status, StageStatus::Failed);
        assert_eq!(session.final_text.as_deref(), Some("Short hard words."));
        assert!(session.error_message.as_deref().unwrap().contains("no usable candidates"));
        // four structural calls, then four lexical plus the sequential retry
        assert_eq!(generator.calls(), 12);

        let response = ReviseResponse::from_session(session);
        assert_eq!(response.status, RevisionStatus::LexicalFail);
        assert!(response.revised);
    }

    #[tokio::test]
    async fn test_lexical_miss_after_structural_returns_best_effort() {
        let analyzer = Arc::new(
            ScriptedAnalyzer::new()
                .with(ORIGINAL, MetricVector::new(20.0, 0.5, 0.9).with_counts(counts()))
                .with("Short hard words.", MetricVector::new(10.0, 0.5, 0.9).with_counts(counts()))
                .with("Short, still hard.", MetricVector::new(10.0, 0.5, 0.7)),
        );
        let generator = Arc::new(
            ScriptedGenerator::new()
                .when(Metric::StructuralLen.label(), "Short hard words.")
                .when(Metric::LexicalRatio.label(), "Short, still hard."),
        );
        let controller = controller(
            analyzer,
            generator,
            Arc::new(ScriptedTieBreaker::replying("1")),
        );

        let session = controller.revise(None, ORIGINAL, &tolerance()).await.unwrap();

        assert!(!session.overall_success);
        assert_eq!(session.stages[0].status, StageStatus::Succeeded);
        assert_eq!(
            session.stages[1].selected.map(|s| s.mode),
            Some(SelectionMode::BestEffort)
        );
        assert_eq!(session.final_text.as_deref(), Some("Short, still hard."));

        let response = ReviseResponse::from_session(session);
        assert_eq!(response.status, RevisionStatus::LexicalFail);
        assert_eq!(response.final_text, "Short, still hard.");
        assert_eq!(response.lexical_pass, Some(false));
        assert_eq!(response.structural_pass, Some(true));
    }

    #[tokio::test]
    async fn test_structural_generation_exhausted() {
        let analyzer =
            Arc::new(ScriptedAnalyzer::new().with(ORIGINAL, MetricVector::new(20.0, 0.5, 0.5)));
        let generator = Arc::new(FailingGenerator::default());
        let controller = controller(
            analyzer,
            generator.clone(),
            Arc::new(ScriptedTieBreaker::failing()),
        );

        let session = controller.revise(None, ORIGINAL, &tolerance()).await.unwrap();

        assert!(!session.overall_success);
        assert!(session.final_text.is_none());
        assert_eq!(session.best_effort_text(), ORIGINAL);
        assert!(session.error_message.as_deref().unwrap().contains("no usable candidates"));
        assert_eq!(session.stages[0].status, StageStatus::Failed);
        // four concurrent attempts plus the sequential retry
        assert_eq!(generator.calls(), 8);
    }

    #[tokio::test]
    async fn test_lexical_only_failure_skips_structural() {
        let analyzer = Arc::new(
            ScriptedAnalyzer::new()
                .with(ORIGINAL, MetricVector::new(10.0, 0.5, 0.9).with_counts(counts()))
                .with("Still hard.", MetricVector::new(10.0, 0.5, 0.7)),
        );
        let generator = Arc::new(ScriptedGenerator::always("Still hard."));
        let controller = controller(analyzer, generator, Arc::new(ScriptedTieBreaker::failing()));

        let session = controller.revise(None, ORIGINAL, &tolerance()).await.unwrap();

        assert_eq!(session.stages[0].status, StageStatus::Skipped);
        assert_eq!(session.stages[1].stage, StageKind::Lexical);
        assert_eq!(
            session.stages[1].selected.map(|s| s.mode),
            Some(SelectionMode::BestEffort)
        );
        assert!(!session.overall_success);
        assert_eq!(session.final_text.as_deref(), Some("Still hard."));
        assert!(session.error_message.is_some());
    }

    #[tokio::test]
    async fn test_lexical_exhausted_keeps_seed_text() {
        let analyzer =
            Arc::new(ScriptedAnalyzer::new().with(ORIGINAL, MetricVector::new(10.0, 0.5, 0.9)));
        let controller = controller(
            analyzer,
            Arc::new(FailingGenerator::default()),
            Arc::new(ScriptedTieBreaker::failing()),
        );

        let session = controller.revise(None, ORIGINAL, &tolerance()).await.unwrap();

        assert!(!session.overall_success);
        assert_eq!(session.final_text.as_deref(), Some(ORIGINAL));
        // counts were missing, so the planner degraded instead of failing
        assert!(session.stages[1].plan.unwrap().degraded);
    }

    #[tokio::test]
    async fn test_original_analysis_failure_is_reported() {
        let controller = controller(
            Arc::new(ScriptedAnalyzer::new()),
            Arc::new(FailingGenerator::default()),
            Arc::new(ScriptedTieBreaker::failing()),
        );

        let session = controller.revise(None, ORIGINAL, &tolerance()).await.unwrap();

        assert!(!session.overall_success);
        assert!(session.stages.is_empty());
        assert!(session.error_message.unwrap().starts_with("analysis of original text failed"));
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let controller = controller(
            Arc::new(ScriptedAnalyzer::new()),
            Arc::new(FailingGenerator::default()),
            Arc::new(ScriptedTieBreaker::failing()),
        );

        let err = controller.revise(None, "   ", &tolerance()).await.unwrap_err();
        assert_eq!(err, ValidationInputError::EmptyText);
    }
}
