use std::sync::Arc;
use std::time::Duration;

use crate::analyzer::Analyzer;
use crate::error::CollaboratorError;
use crate::llm::{build_revision_prompt, EditInstructions, Generator};
use crate::models::{Bands, Candidate, GenerationSetting};
use crate::scoring::evaluate_bands;

use super::{fan_out, StageContext};

/// Generated and validated candidates for one stage
#[derive(Debug, Default)]
pub struct PoolRun {
    /// Candidates that survived validation, in generation-task order
    pub candidates: Vec<Candidate>,
    /// Generation tasks launched
    pub attempted: usize,
    pub generation_failures: usize,
    pub validation_failures: usize,
    pub sequential_fallback: bool,
}

/// Generates and validates a batch of candidates concurrently
pub struct CandidatePool {
    generator: Arc<dyn Generator>,
    analyzer: Arc<dyn Analyzer>,
    call_timeout: Duration,
}

impl CandidatePool {
    pub fn new(
        generator: Arc<dyn Generator>,
        analyzer: Arc<dyn Analyzer>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            generator,
            analyzer,
            call_timeout,
        }
    }

    /// Generate `settings.len() * per_setting` candidates from `seed_text`, then
    /// validate each against `bands`.
    ///
    /// Individual failures shrink the pool; an empty result is left to the
    /// owning stage to treat as exhausted.
    pub async fn run(
        &self,
        seed_text: &str,
        instructions: &EditInstructions,
        bands: &Bands,
        settings: &[GenerationSetting],
        per_setting: usize,
        ctx: &StageContext,
    ) -> PoolRun {
        let stage = instructions.stage;
        let prompt: Arc<str> = build_revision_prompt(seed_text, instructions).into();

        let jobs: Vec<GenerationSetting> = settings
            .iter()
            .flat_map(|setting| std::iter::repeat_n(*setting, per_setting))
            .collect();
        let attempted = jobs.len();

        let generator = self.generator.clone();
        let generated = fan_out(jobs.clone(), self.call_timeout, move |setting: GenerationSetting| {
            let generator = generator.clone();
            let prompt = prompt.clone();
            async move {
                let text = generator.generate(&prompt, setting.temperature).await?;
                if text.trim().is_empty() {
                    return Err(CollaboratorError::Malformed(
                        "generator returned empty text".to_string(),
                    ));
                }
                Ok(Candidate::generated(text, setting))
            }
        })
        .await;

        if generated.sequential_fallback {
            ctx.observer.sequential_fallback(&ctx.request_id, stage, "generation");
        }

        let mut fresh = Vec::with_capacity(attempted);
        let mut generation_failures = 0;
        for (setting, result) in jobs.iter().zip(generated.results) {
            match result {
                Ok(candidate) => fresh.push(candidate),
                Err(e) => {
                    generation_failures += 1;
                    ctx.observer.generation_failed(&ctx.request_id, stage, *setting, &e);
                }
            }
        }

        if fresh.is_empty() {
            return PoolRun {
                attempted,
                generation_failures,
                sequential_fallback: generated.sequential_fallback,
                ..Default::default()
            };
        }

        let analyzer = self.analyzer.clone();
        let bands = *bands;
        let validated = fan_out(fresh.clone(), self.call_timeout, move |candidate: Candidate| {
            let analyzer = analyzer.clone();
            async move {
                let metrics = analyzer.analyze(&candidate.text).await?;
                let evaluation = evaluate_bands(&metrics, &bands);
                Ok(candidate.validated(stage, metrics, evaluation))
            }
        })
        .await;

        if validated.sequential_fallback {
            ctx.observer.sequential_fallback(&ctx.request_id, stage, "validation");
        }

        let mut candidates = Vec::with_capacity(fresh.len());
        let mut validation_failures = 0;
        for (candidate, result) in fresh.iter().zip(validated.results) {
            match result {
                Ok(candidate) => candidates.push(candidate),
                Err(e) => {
                    validation_failures += 1;
                    ctx.observer.validation_failed(&ctx.request_id, stage, candidate.setting, &e);
                }
            }
        }

        PoolRun {
            candidates,
            attempted,
            generation_failures,
            validation_failures,
            sequential_fallback: generated.sequential_fallback || validated.sequential_fallback,
        }
    }
}
