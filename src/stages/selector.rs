use std::sync::Arc;
use std::time::Duration;

use crate::error::CollaboratorError;
use crate::llm::TieBreaker;
use crate::models::{Candidate, Metric, Selection, SelectionMode, StageKind};

use super::StageContext;

/// Chooses a stage winner among validated candidates
pub struct StageSelector {
    tie_breaker: Arc<dyn TieBreaker>,
    call_timeout: Duration,
}

impl StageSelector {
    pub fn new(tie_breaker: Arc<dyn TieBreaker>, call_timeout: Duration) -> Self {
        Self {
            tie_breaker,
            call_timeout,
        }
    }

    /// Only passing candidates are eligible. None eligible gives `None`; a
    /// single one is returned without a tie-break call; several go to the
    /// tie-breaker, and an unusable reply falls back to the first eligible.
    pub async fn select(
        &self,
        stage: StageKind,
        candidates: &[Candidate],
        ctx: &StageContext,
    ) -> Option<Selection> {
        let eligible: Vec<usize> = candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| c.passed)
            .map(|(i, _)| i)
            .collect();

        match eligible.as_slice() {
            [] => None,
            [only] => Some(Selection {
                index: *only,
                mode: SelectionMode::Single,
            }),
            [first, ..] => {
                let texts: Vec<String> =
                    eligible.iter().map(|&i| candidates[i].text.clone()).collect();

                let reply = tokio::time::timeout(self.call_timeout, self.tie_breaker.choose(&texts))
                    .await
                    .unwrap_or_else(|_| Err(CollaboratorError::Timeout(self.call_timeout)));

                let failure = match reply {
                    Ok(reply) => match parse_choice(&reply, eligible.len()) {
                        Some(choice) => {
                            return Some(Selection {
                                index: eligible[choice - 1],
                                mode: SelectionMode::TieBreak { choice },
                            });
                        }
                        None => format!("unusable reply {reply:?}"),
                    },
                    Err(e) => e.to_string(),
                };

                ctx.observer.tie_break_defaulted(&ctx.request_id, stage, &failure);
                Some(Selection {
                    index: *first,
                    mode: SelectionMode::TieBreakDefaulted,
                })
            }
        }
    }
}

/// Pick the validated candidate closest to the band of `metric`, marked as a best-effort fallback
pub fn select_best_effort(candidates: &[Candidate], metric: Metric) -> Option<Selection> {
    candidates
        .iter()
        .enumerate()
        .filter_map(|(i, c)| {
            let check = c.evaluation.as_ref()?.check(metric);
            Some((i, check.band.distance(check.observed)))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| Selection {
            index,
            mode: SelectionMode::BestEffort,
        })
}

/// First integer in `reply`, if it is a valid 1-based index for `count` candidates
pub fn parse_choice(reply: &str, count: usize) -> Option<usize> {
    let digits: String = reply
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();

    digits
        .parse::<usize>()
        .ok()
        .filter(|choice| (1..=count).contains(choice))
}
