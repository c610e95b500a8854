use std::fmt;

use serde::{Deserialize, Serialize};

/// The three headline readability metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Average sentence length in tokens
    StructuralLen,
    /// Share of sentences carrying an embedded clause
    ClauseRatio,
    /// Share of content lemmas at the simplest vocabulary tier
    LexicalRatio,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::StructuralLen, Metric::ClauseRatio, Metric::LexicalRatio];

    /// Name used in reports and prompts
    pub fn label(&self) -> &'static str {
        match self {
            Metric::StructuralLen => "AVG_SENTENCE_LENGTH",
            Metric::ClauseRatio => "All_Embedded_Clauses_Ratio",
            Metric::LexicalRatio => "CEFR_NVJD_A1A2_lemma_ratio",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Supporting counts reported by the analyzer alongside the headline metrics.
///
/// Every count is optional: the analyzer may omit any of them, and the planner
/// degrades instead of failing when one it needs is absent or zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SupportingCounts {
    pub sentence_count: Option<u32>,
    pub token_count: Option<u32>,
    pub clause_sentence_count: Option<u32>,
    /// Eligible (non proper noun) content lemmas
    pub nvjd_total: Option<u32>,
    /// Eligible content lemmas at the simplest tier
    pub nvjd_simple_count: Option<u32>,
}

/// Metrics for one text, produced once by the analyzer and never mutated
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricVector {
    pub structural_len: f64,
    pub clause_ratio: f64,
    pub lexical_ratio: f64,
    #[serde(default)]
    pub counts: SupportingCounts,
}

impl MetricVector {
    pub fn new(structural_len: f64, clause_ratio: f64, lexical_ratio: f64) -> Self {
        Self {
            structural_len,
            clause_ratio,
            lexical_ratio,
            counts: SupportingCounts::default(),
        }
    }

    pub fn with_counts(mut self, counts: SupportingCounts) -> Self {
        self.counts = counts;
        self
    }

    /// Observed value of a headline metric
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::StructuralLen => self.structural_len,
            Metric::ClauseRatio => self.clause_ratio,
            Metric::LexicalRatio => self.lexical_ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_by_metric() {
        let metrics = MetricVector::new(12.5, 0.3, 0.6);
        assert_eq!(metrics.value(Metric::StructuralLen), 12.5);
        assert_eq!(metrics.value(Metric::ClauseRatio), 0.3);
        assert_eq!(metrics.value(Metric::LexicalRatio), 0.6);
    }

    #[test]
    fn test_metric_serializes_snake_case() {
        let json = serde_json::to_string(&Metric::ClauseRatio).unwrap();
        assert_eq!(json, "\"clause_ratio\"");
    }
}
