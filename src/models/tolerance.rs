use serde::{Deserialize, Serialize};

use super::Metric;
use crate::error::ValidationInputError;

/// Target values for the three headline metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetMetrics {
    #[serde(alias = "AVG_SENTENCE_LENGTH")]
    pub structural_len: f64,
    #[serde(alias = "All_Embedded_Clauses_Ratio")]
    pub clause_ratio: f64,
    #[serde(alias = "CEFR_NVJD_A1A2_lemma_ratio")]
    pub lexical_ratio: f64,
}

/// Tolerance margins: absolute for sentence length, relative for the ratios
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    /// Absolute margin in tokens per sentence
    pub structural_len_abs: f64,
    /// Margin as a fraction of the clause ratio target
    pub clause_ratio_rel: f64,
    /// Margin as a fraction of the lexical ratio target
    pub lexical_ratio_rel: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            structural_len_abs: 1.97,
            clause_ratio_rel: 0.202,
            lexical_ratio_rel: 0.104,
        }
    }
}

impl Margins {
    /// Reject a negative or non-finite margin
    pub fn validate(&self) -> Result<(), ValidationInputError> {
        check_margin(Metric::StructuralLen, self.structural_len_abs)?;
        check_margin(Metric::ClauseRatio, self.clause_ratio_rel)?;
        check_margin(Metric::LexicalRatio, self.lexical_ratio_rel)
    }
}

/// Caller-supplied targets plus margins for one request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceSpec {
    pub targets: TargetMetrics,
    pub margins: Margins,
}

impl ToleranceSpec {
    /// Build a spec, rejecting anything that could yield an inverted band
    pub fn new(targets: TargetMetrics, margins: Margins) -> Result<Self, ValidationInputError> {
        let spec = Self { targets, margins };
        spec.bands()?;
        Ok(spec)
    }

    /// Compute the inclusive band for every metric
    pub fn bands(&self) -> Result<Bands, ValidationInputError> {
        let t = &self.targets;
        let m = &self.margins;

        Ok(Bands {
            structural_len: Band::absolute(
                Metric::StructuralLen,
                t.structural_len,
                m.structural_len_abs,
            )?,
            clause_ratio: Band::relative(Metric::ClauseRatio, t.clause_ratio, m.clause_ratio_rel)?,
            lexical_ratio: Band::relative(
                Metric::LexicalRatio,
                t.lexical_ratio,
                m.lexical_ratio_rel,
            )?,
        })
    }
}

/// Inclusive interval `[min, max]` within which a metric passes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    /// Build a band from raw bounds; `min` must not exceed `max`
    pub fn from_bounds(min: f64, max: f64) -> Option<Self> {
        (min.is_finite() && max.is_finite() && min <= max).then_some(Self { min, max })
    }

    fn absolute(metric: Metric, target: f64, margin: f64) -> Result<Self, ValidationInputError> {
        check_target(metric, target)?;
        check_margin(metric, margin)?;
        Ok(Self {
            min: target - margin,
            max: target + margin,
        })
    }

    fn relative(metric: Metric, target: f64, ratio: f64) -> Result<Self, ValidationInputError> {
        check_target(metric, target)?;
        check_margin(metric, ratio)?;
        let margin = target * ratio;
        Ok(Self {
            min: target - margin,
            max: target + margin,
        })
    }

    /// Closed-interval membership
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    /// Distance from `value` to the nearest edge, zero inside the band
    pub fn distance(&self, value: f64) -> f64 {
        if value < self.min {
            self.min - value
        } else if value > self.max {
            value - self.max
        } else {
            0.0
        }
    }
}

/// One band per headline metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bands {
    pub structural_len: Band,
    pub clause_ratio: Band,
    pub lexical_ratio: Band,
}

impl Bands {
    pub fn get(&self, metric: Metric) -> Band {
        match metric {
            Metric::StructuralLen => self.structural_len,
            Metric::ClauseRatio => self.clause_ratio,
            Metric::LexicalRatio => self.lexical_ratio,
        }
    }
}

fn check_target(metric: Metric, target: f64) -> Result<(), ValidationInputError> {
    if !target.is_finite() {
        return Err(ValidationInputError::NonFinite { field: metric.label() });
    }
    if target < 0.0 {
        return Err(ValidationInputError::NegativeTarget {
            metric: metric.label(),
            value: target,
        });
    }
    Ok(())
}

fn check_margin(metric: Metric, margin: f64) -> Result<(), ValidationInputError> {
    if !margin.is_finite() {
        return Err(ValidationInputError::NonFinite { field: metric.label() });
    }
    if margin < 0.0 {
        return Err(ValidationInputError::NegativeMargin {
            metric: metric.label(),
            value: margin,
        });
    }
    Ok(())
}
