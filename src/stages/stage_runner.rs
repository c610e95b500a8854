use std::time::Instant;

use crate::error::StageError;
use crate::llm::EditInstructions;
use crate::models::{
    Bands, GenerationSetting, Metric, MetricVector, StageKind, StageOutcome, StageStatus,
};
use crate::scoring::MagnitudePlanner;

use super::{select_best_effort, CandidatePool, StageContext, StageSelector};

/// Input to one generate, validate, select cycle
#[derive(Debug, Clone, Copy)]
pub struct StageRequest<'a> {
    pub stage: StageKind,
    /// Failing metric the plan targets
    pub metric: Metric,
    pub seed_text: &'a str,
    pub seed_metrics: &'a MetricVector,
    pub bands: &'a Bands,
}

/// A stage that ended without a passing selection, with its audit record
#[derive(Debug)]
pub struct StageFailure {
    pub outcome: StageOutcome,
    pub error: StageError,
}

/// Runs one stage: plan, then pool, then select
pub struct StageRunner {
    pool: CandidatePool,
    selector: StageSelector,
    planner: MagnitudePlanner,
    settings: Vec<GenerationSetting>,
    per_setting: usize,
}

impl StageRunner {
    pub fn new(
        pool: CandidatePool,
        selector: StageSelector,
        planner: MagnitudePlanner,
        settings: Vec<GenerationSetting>,
        per_setting: usize,
    ) -> Self {
        Self {
            pool,
            selector,
            planner,
            settings,
            per_setting,
        }
    }

    /// Run the stage described by `request`.
    ///
    /// An empty pool is [`StageError::GenerationExhausted`]. No passing
    /// candidate is [`StageError::NoPassingCandidate`]; for the lexical stage
    /// the failure still carries the nearest candidate as a best-effort selection.
    pub async fn run(
        &self,
        request: StageRequest<'_>,
        ctx: &StageContext,
    ) -> Result<StageOutcome, StageFailure> {
        let start = Instant::now();
        let stage = request.stage;
        let metric = request.metric;

        let band = request.bands.get(metric);
        let current = request.seed_metrics.value(metric);
        let plan = self
            .planner
            .plan_for_band(metric, current, band, &request.seed_metrics.counts);

        ctx.observer.planned(&ctx.request_id, stage, &plan);
        if plan.degraded {
            ctx.observer.planner_degraded(&ctx.request_id, stage, &plan);
        }

        let instructions = EditInstructions::new(stage, plan, current, band);
        let pool = self
            .pool
            .run(
                request.seed_text,
                &instructions,
                request.bands,
                &self.settings,
                self.per_setting,
                ctx,
            )
            .await;

        let mut outcome = StageOutcome {
            stage,
            status: StageStatus::Failed,
            plan: Some(plan),
            candidates: vec![],
            selected: None,
            attempted: pool.attempted,
            generation_failures: pool.generation_failures,
            validation_failures: pool.validation_failures,
            sequential_fallback: pool.sequential_fallback,
            elapsed_ms: 0,
            error: None,
        };

        let result = if pool.candidates.is_empty() {
            Err(StageError::GenerationExhausted {
                stage,
                attempted: pool.attempted,
            })
        } else {
            outcome.selected = self.selector.select(stage, &pool.candidates, ctx).await;
            if outcome.selected.is_some() {
                Ok(())
            } else {
                if stage == StageKind::Lexical {
                    outcome.selected = select_best_effort(&pool.candidates, metric);
                }
                Err(StageError::NoPassingCandidate { stage })
            }
        };

        outcome.candidates = pool.candidates;
        outcome.elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(()) => {
                outcome.status = StageStatus::Succeeded;
                ctx.observer.stage_finished(&ctx.request_id, &outcome);
                Ok(outcome)
            }
            Err(error) => {
                outcome.error = Some(error.to_string());
                ctx.observer.stage_finished(&ctx.request_id, &outcome);
                Err(StageFailure { outcome, error })
            }
        }
    }
}
