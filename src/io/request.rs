use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ValidationInputError;
use crate::models::{Margins, TargetMetrics, ToleranceSpec};

/// Per-request margin overrides; unset fields take the configured defaults
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MarginOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structural_len_abs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clause_ratio_rel: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lexical_ratio_rel: Option<f64>,
}

impl MarginOverrides {
    pub fn apply(&self, defaults: Margins) -> Margins {
        Margins {
            structural_len_abs: self.structural_len_abs.unwrap_or(defaults.structural_len_abs),
            clause_ratio_rel: self.clause_ratio_rel.unwrap_or(defaults.clause_ratio_rel),
            lexical_ratio_rel: self.lexical_ratio_rel.unwrap_or(defaults.lexical_ratio_rel),
        }
    }
}

/// Body of `POST /revise`, and one item of a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviseRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub text: String,
    pub target_metrics: TargetMetrics,
    #[serde(default)]
    pub tolerance: MarginOverrides,
}

impl ReviseRequest {
    /// Read a request from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request file: {:?}", path))?;
        serde_json::from_str(&content).context("Failed to parse request JSON")
    }

    pub fn tolerance(&self, defaults: Margins) -> Result<ToleranceSpec, ValidationInputError> {
        ToleranceSpec::new(self.target_metrics, self.tolerance.apply(defaults))
    }
}

/// Body of `POST /batch-revise`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReviseRequest {
    pub items: Vec<ReviseRequest>,
    /// Items revised at once for this request; capped by the server-wide bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent: Option<usize>,
}

/// Body of `POST /analyze`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_metrics: Option<TargetMetrics>,
    #[serde(default)]
    pub tolerance: MarginOverrides,
}

impl AnalyzeRequest {
    /// Tolerance to evaluate against, when targets were supplied
    pub fn tolerance(
        &self,
        defaults: Margins,
    ) -> Result<Option<ToleranceSpec>, ValidationInputError> {
        self.target_metrics
            .map(|targets| ToleranceSpec::new(targets, self.tolerance.apply(defaults)))
            .transpose()
    }
}
