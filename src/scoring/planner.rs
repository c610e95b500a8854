use crate::models::{Band, Direction, EditPlan, Metric, SupportingCounts};

/// Edit count used when counts are unusable
pub const DEFAULT_EDIT_COUNT: u32 = 3;

/// Turns a failing metric into a signed edit count.
///
/// Counts always round toward the correction direction so the plan never
/// undershoots. Missing or zero counts degrade to `default_edit_count`
/// rather than erroring; the returned plan carries `degraded = true`.
#[derive(Debug, Clone, Copy)]
pub struct MagnitudePlanner {
    pub default_edit_count: u32,
}

impl Default for MagnitudePlanner {
    fn default() -> Self {
        Self {
            default_edit_count: DEFAULT_EDIT_COUNT,
        }
    }
}

impl MagnitudePlanner {
    pub fn new(default_edit_count: u32) -> Self {
        Self {
            default_edit_count: default_edit_count.max(1),
        }
    }

    /// Plan the correction for `metric`, currently at `current_value`, with target
    /// band `[target_min, target_max]`
    pub fn plan(
        &self,
        metric: Metric,
        current_value: f64,
        target_min: f64,
        target_max: f64,
        counts: &SupportingCounts,
    ) -> EditPlan {
        let direction = if current_value < target_min {
            Direction::Increase
        } else {
            Direction::Decrease
        };

        let raw = match metric {
            Metric::StructuralLen => length_edits(direction, target_min, target_max, counts),
            Metric::ClauseRatio => clause_edits(direction, target_min, target_max, counts),
            Metric::LexicalRatio => lexical_edits(direction, target_min, target_max, counts),
        };

        match raw.filter(|v| v.is_finite()) {
            Some(value) => EditPlan {
                metric,
                direction,
                edit_count: clamp_count(value),
                degraded: false,
            },
            None => EditPlan {
                metric,
                direction,
                edit_count: self.default_edit_count.max(1),
                degraded: true,
            },
        }
    }

    /// Plan against a band
    pub fn plan_for_band(
        &self,
        metric: Metric,
        current_value: f64,
        band: Band,
        counts: &SupportingCounts,
    ) -> EditPlan {
        self.plan(metric, current_value, band.min, band.max, counts)
    }
}

/// Sentences to merge (increase) or split (decrease)
fn length_edits(
    direction: Direction,
    target_min: f64,
    target_max: f64,
    counts: &SupportingCounts,
) -> Option<f64> {
    let sentences = nonzero(counts.sentence_count)?;
    let tokens = nonzero(counts.token_count)?;

    match direction {
        Direction::Decrease => {
            positive(target_max).map(|max| (tokens / max - sentences).ceil())
        }
        Direction::Increase => {
            positive(target_min).map(|min| (sentences - tokens / min).floor())
        }
    }
}

/// Sentences to gain or lose an embedded clause
fn clause_edits(
    direction: Direction,
    target_min: f64,
    target_max: f64,
    counts: &SupportingCounts,
) -> Option<f64> {
    let sentences = nonzero(counts.sentence_count)?;
    let clauses = f64::from(counts.clause_sentence_count?);

    Some(match direction {
        Direction::Decrease => ((clauses - target_max * sentences) / (1.0 + target_max)).ceil(),
        Direction::Increase => ((target_min * sentences - clauses) / (1.0 + target_min)).ceil(),
    })
}

/// Content words to swap toward or away from the simplest tier
fn lexical_edits(
    direction: Direction,
    target_min: f64,
    target_max: f64,
    counts: &SupportingCounts,
) -> Option<f64> {
    let total = nonzero(counts.nvjd_total)?;
    let simple = f64::from(counts.nvjd_simple_count?);
    let bound = match direction {
        Direction::Increase => target_min,
        Direction::Decrease => target_max,
    };

    Some((bound * total - simple).abs().ceil())
}

fn nonzero(count: Option<u32>) -> Option<f64> {
    count.filter(|&c| c > 0).map(f64::from)
}

fn positive(value: f64) -> Option<f64> {
    (value > 0.0).then_some(value)
}

fn clamp_count(value: f64) -> u32 {
    if value < 1.0 {
        1
    } else if value >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        value as u32
    }
}
