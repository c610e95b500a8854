use serde::{Deserialize, Serialize};

use super::{Band, Metric};

/// Band and observed value for one metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricCheck {
    pub band: Band,
    pub observed: f64,
    pub passed: bool,
}

/// Outcome of comparing a metric vector against its bands. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Sentence length and clause ratio both in band
    pub structural_pass: bool,
    /// Lexical ratio in band
    pub lexical_pass: bool,
    pub structural_len: MetricCheck,
    pub clause_ratio: MetricCheck,
    pub lexical_ratio: MetricCheck,
}

impl EvaluationResult {
    pub fn check(&self, metric: Metric) -> &MetricCheck {
        match metric {
            Metric::StructuralLen => &self.structural_len,
            Metric::ClauseRatio => &self.clause_ratio,
            Metric::LexicalRatio => &self.lexical_ratio,
        }
    }

    pub fn all_pass(&self) -> bool {
        self.structural_pass && self.lexical_pass
    }

    /// One line per metric: `NAME: value vs [min ~ max] → Pass|Fail`
    pub fn summary(&self) -> String {
        Metric::ALL
            .iter()
            .map(|metric| {
                let check = self.check(*metric);
                format!(
                    "{}: {:.3} vs [{:.3} ~ {:.3}] → {}",
                    metric.label(),
                    check.observed,
                    check.band.min,
                    check.band.max,
                    if check.passed { "Pass" } else { "Fail" }
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
