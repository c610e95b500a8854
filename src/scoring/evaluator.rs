use crate::error::ValidationInputError;
use crate::models::{
    Band, Bands, EvaluationResult, Metric, MetricCheck, MetricVector, ToleranceSpec,
};

/// Evaluate metrics against the bands implied by a tolerance spec.
///
/// Pure: no I/O, same inputs always give the same result. Negative or
/// non-finite margins are rejected.
pub fn evaluate(
    metrics: &MetricVector,
    tolerance: &ToleranceSpec,
) -> Result<EvaluationResult, ValidationInputError> {
    let bands = tolerance.bands()?;
    Ok(evaluate_bands(metrics, &bands))
}

/// Evaluate metrics against raw `(min, max)` pairs, in
/// structural_len, clause_ratio, lexical_ratio order.
///
/// Agrees exactly with [`evaluate`] for equivalent bands since both share
/// [`evaluate_bands`].
pub fn evaluate_bounds(
    metrics: &MetricVector,
    bounds: [(f64, f64); 3],
) -> Result<EvaluationResult, ValidationInputError> {
    let band = |metric: Metric, (min, max): (f64, f64)| {
        Band::from_bounds(min, max).ok_or(ValidationInputError::InvertedBand {
            metric: metric.label(),
        })
    };

    let bands = Bands {
        structural_len: band(Metric::StructuralLen, bounds[0])?,
        clause_ratio: band(Metric::ClauseRatio, bounds[1])?,
        lexical_ratio: band(Metric::LexicalRatio, bounds[2])?,
    };
    Ok(evaluate_bands(metrics, &bands))
}

/// Evaluate metrics against precomputed bands
pub fn evaluate_bands(metrics: &MetricVector, bands: &Bands) -> EvaluationResult {
    let check = |metric: Metric| {
        let band = bands.get(metric);
        let observed = metrics.value(metric);
        MetricCheck {
            band,
            observed,
            passed: band.contains(observed),
        }
    };

    let structural_len = check(Metric::StructuralLen);
    let clause_ratio = check(Metric::ClauseRatio);
    let lexical_ratio = check(Metric::LexicalRatio);

    EvaluationResult {
        structural_pass: structural_len.passed && clause_ratio.passed,
        lexical_pass: lexical_ratio.passed,
        structural_len,
        clause_ratio,
        lexical_ratio,
    }
}

/// Pick the structural metric to correct; clause ratio takes priority over length
pub fn structural_problem(evaluation: &EvaluationResult) -> Option<Metric> {
    if !evaluation.clause_ratio.passed {
        Some(Metric::ClauseRatio)
    } else if !evaluation.structural_len.passed {
        Some(Metric::StructuralLen)
    } else {
        None
    }
}
