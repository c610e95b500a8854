use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analyzer::AnalyzerConfig;
use crate::error::ValidationInputError;
use crate::models::{GenerationSetting, Margins};
use crate::scoring::DEFAULT_EDIT_COUNT;

/// Settings threaded through the controller; nothing here is global
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RevisionConfig {
    /// One generation setting per temperature
    pub generation_settings: Vec<GenerationSetting>,
    /// Candidates generated for each setting
    pub candidates_per_setting: usize,
    /// Margins used when a request does not supply its own
    pub default_margins: Margins,
    /// Bound on every Analyzer, Generator and TieBreaker call
    pub call_timeout_secs: u64,
    /// Edit count used when the planner cannot compute one
    pub default_edit_count: u32,
    /// Temperature for tie-break calls
    pub tie_break_temperature: f64,
    /// Upper bound on items revised at once across all batch requests
    pub max_batch_concurrency: usize,
    pub analyzer: AnalyzerConfig,
}

impl Default for RevisionConfig {
    fn default() -> Self {
        Self {
            generation_settings: vec![
                GenerationSetting { temperature: 0.2 },
                GenerationSetting { temperature: 0.3 },
            ],
            candidates_per_setting: 2,
            default_margins: Margins::default(),
            call_timeout_secs: 60,
            default_edit_count: DEFAULT_EDIT_COUNT,
            tie_break_temperature: 0.1,
            max_batch_concurrency: 10,
            analyzer: AnalyzerConfig::default(),
        }
    }
}

impl RevisionConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: RevisionConfig =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationInputError> {
        if self.generation_settings.is_empty() {
            return Err(ValidationInputError::NoGenerationSettings);
        }
        if self.candidates_per_setting == 0 {
            return Err(ValidationInputError::ZeroCandidates);
        }
        if self.max_batch_concurrency == 0 {
            return Err(ValidationInputError::ZeroConcurrency);
        }
        if self.call_timeout_secs == 0 {
            return Err(ValidationInputError::ZeroTimeout);
        }
        for setting in &self.generation_settings {
            if !setting.temperature.is_finite() {
                return Err(ValidationInputError::NonFinite { field: "temperature" });
            }
        }
        if !self.tie_break_temperature.is_finite() {
            return Err(ValidationInputError::NonFinite {
                field: "tie_break_temperature",
            });
        }
        self.default_margins.validate()
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Generation tasks launched per stage
    pub fn tasks_per_stage(&self) -> usize {
        self.generation_settings.len() * self.candidates_per_setting
    }
}
