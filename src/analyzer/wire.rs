use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;
use crate::models::{MetricVector, SupportingCounts};

/// Request body sent to the analyzer
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzerRequest<'a> {
    pub text: &'a str,
    pub auto_sentence_split: bool,
    pub include_syntax_analysis: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerResponse {
    pub data: AnalyzeData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeData {
    pub text_statistics: TextStatistics,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextStatistics {
    #[serde(default)]
    pub table_01_basic_overview: BasicOverview,
    #[serde(default)]
    pub table_02_detailed_tokens: DetailedTokens,
    #[serde(default)]
    pub table_09_pos_distribution: PosDistribution,
    #[serde(default)]
    pub table_10_syntax_analysis: SyntaxAnalysis,
    #[serde(default)]
    pub table_11_lemma_metrics: LemmaMetrics,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BasicOverview {
    pub avg_sentence_length: Option<f64>,
    pub sentence_count: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetailedTokens {
    pub lexical_tokens: Option<u32>,
    pub content_lemmas: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PosDistribution {
    pub propn_lemma_count: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyntaxAnalysis {
    pub adverbial_clause_sentences: Option<u32>,
    pub coordinate_clause_sentences: Option<u32>,
    pub nominal_clause_sentences: Option<u32>,
    pub relative_clause_sentences: Option<u32>,
    pub all_embedded_clauses_ratio: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[allow(non_snake_case)]
pub struct LemmaMetrics {
    pub cefr_a1_NVJD_lemma_ratio: Option<f64>,
    pub cefr_a2_NVJD_lemma_ratio: Option<f64>,
    pub cefr_a1_NVJD_lemma_count: Option<u32>,
    pub cefr_a2_NVJD_lemma_count: Option<u32>,
}

impl SyntaxAnalysis {
    /// Sentences carrying any kind of embedded or coordinate clause
    fn clause_sentences(&self) -> Option<u32> {
        let parts = [
            self.adverbial_clause_sentences,
            self.coordinate_clause_sentences,
            self.nominal_clause_sentences,
            self.relative_clause_sentences,
        ];
        if parts.iter().all(Option::is_none) {
            return None;
        }
        Some(parts.iter().flatten().sum())
    }
}

impl AnalyzerResponse {
    /// Decode the nested analyzer tables into a metric vector
    pub fn into_metrics(self) -> Result<MetricVector, CollaboratorError> {
        let stats = self.data.text_statistics;
        let overview = &stats.table_01_basic_overview;
        let syntax = &stats.table_10_syntax_analysis;
        let lemmas = &stats.table_11_lemma_metrics;

        let structural_len = overview
            .avg_sentence_length
            .ok_or_else(|| missing("avg_sentence_length"))?;

        let sentence_count = overview.sentence_count;
        let clause_sentence_count = syntax.clause_sentences();

        let clause_ratio = match syntax.all_embedded_clauses_ratio {
            Some(ratio) => ratio,
            None => match (clause_sentence_count, sentence_count) {
                (Some(clauses), Some(sentences)) if sentences > 0 => {
                    f64::from(clauses) / f64::from(sentences)
                }
                _ => return Err(missing("clause sentence counts")),
            },
        };

        let lexical_ratio = match (
            lemmas.cefr_a1_NVJD_lemma_ratio,
            lemmas.cefr_a2_NVJD_lemma_ratio,
        ) {
            (Some(a1), Some(a2)) => a1 + a2,
            _ => return Err(missing("cefr_a1/a2_NVJD_lemma_ratio")),
        };

        let propn = stats.table_09_pos_distribution.propn_lemma_count.unwrap_or(0);
        let nvjd_total = stats
            .table_02_detailed_tokens
            .content_lemmas
            .map(|c| c.saturating_sub(propn));

        let nvjd_simple_count = match (
            lemmas.cefr_a1_NVJD_lemma_count,
            lemmas.cefr_a2_NVJD_lemma_count,
        ) {
            (Some(a1), Some(a2)) => Some(a1 + a2),
            _ => nvjd_total.map(|total| (lexical_ratio * f64::from(total)).round() as u32),
        };

        for (name, value) in [
            ("avg_sentence_length", structural_len),
            ("clause ratio", clause_ratio),
            ("lexical ratio", lexical_ratio),
        ] {
            if !value.is_finite() {
                return Err(CollaboratorError::Malformed(format!("{name} is not finite")));
            }
        }

        let counts = SupportingCounts {
            sentence_count,
            token_count: stats.table_02_detailed_tokens.lexical_tokens,
            clause_sentence_count,
            nvjd_total,
            nvjd_simple_count,
        };
        Ok(MetricVector::new(structural_len, clause_ratio, lexical_ratio).with_counts(counts))
    }
}

fn missing(field: &str) -> CollaboratorError {
    CollaboratorError::Malformed(format!("analyzer response is missing {field}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> serde_json::Value {
        serde_json::json!({
            "data": {
                "text_statistics": {
                    "table_01_basic_overview": {"avg_sentence_length": 10.0, "sentence_count": 10},
                    "table_02_detailed_tokens": {"lexical_tokens": 100, "content_lemmas": 80},
                    "table_09_pos_distribution": {"propn_lemma_count": 5},
                    "table_10_syntax_analysis": {
                        "adverbial_clause_sentences": 2,
                        "coordinate_clause_sentences": 1,
                        "nominal_clause_sentences": 0,
                        "relative_clause_sentences": 0
                    },
                    "table_11_lemma_metrics": {
                        "cefr_a1_NVJD_lemma_ratio": 0.3,
                        "cefr_a2_NVJD_lemma_ratio": 0.3
                    }
                }
            }
        })
    }

    #[test]
    fn test_decode_tables() {
        let response: AnalyzerResponse = serde_json::from_value(sample()).unwrap();
        let metrics = response.into_metrics().unwrap();

        assert_eq!(metrics.structural_len, 10.0);
        assert!((metrics.clause_ratio - 0.3).abs() < 1e-9);
        assert!((metrics.lexical_ratio - 0.6).abs() < 1e-9);
        assert_eq!(metrics.counts.sentence_count, Some(10));
        assert_eq!(metrics.counts.token_count, Some(100));
        assert_eq!(metrics.counts.clause_sentence_count, Some(3));
        assert_eq!(metrics.counts.nvjd_total, Some(75));
        assert_eq!(metrics.counts.nvjd_simple_count, Some(45));
    }

    #[test]
    fn test_reported_clause_ratio_wins() {
        let mut json = sample();
        json["data"]["text_statistics"]["table_10_syntax_analysis"]["all_embedded_clauses_ratio"] =
            serde_json::json!(0.42);
        let response: AnalyzerResponse = serde_json::from_value(json).unwrap();
        assert_eq!(response.into_metrics().unwrap().clause_ratio, 0.42);
    }

    #[test]
    fn test_missing_lexical_ratio_is_malformed() {
        let mut json = sample();
        json["data"]["text_statistics"]["table_11_lemma_metrics"] = serde_json::json!({});
        let response: AnalyzerResponse = serde_json::from_value(json).unwrap();
        assert!(matches!(response.into_metrics(), Err(CollaboratorError::Malformed(_))));
    }

    #[test]
    fn test_missing_counts_decode_as_absent() {
        let mut json = sample();
        json["data"]["text_statistics"]["table_02_detailed_tokens"] = serde_json::json!({});
        let response: AnalyzerResponse = serde_json::from_value(json).unwrap();
        let metrics = response.into_metrics().unwrap();
        assert_eq!(metrics.counts.token_count, None);
        assert_eq!(metrics.counts.nvjd_total, None);
        assert_eq!(metrics.counts.nvjd_simple_count, None);
    }
}
