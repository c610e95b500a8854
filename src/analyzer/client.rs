use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{Analyzer, AnalyzerRequest, AnalyzerResponse};
use crate::error::CollaboratorError;
use crate::models::MetricVector;

/// Configuration for the remote analyzer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Endpoint accepting `POST {text, auto_sentence_split, include_syntax_analysis}`
    pub url: String,
    /// Request full syntax analysis (needed for clause counts)
    pub include_syntax: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8080/api/enhanced_analyze".to_string(),
            include_syntax: true,
        }
    }
}

/// HTTP client for the remote analyzer
pub struct HttpAnalyzer {
    client: Client,
    config: AnalyzerConfig,
}

impl HttpAnalyzer {
    pub fn new(config: AnalyzerConfig, timeout: Duration) -> Result<Self, CollaboratorError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Analyzer for HttpAnalyzer {
    async fn analyze(&self, text: &str) -> Result<MetricVector, CollaboratorError> {
        let request = AnalyzerRequest {
            text,
            auto_sentence_split: true,
            include_syntax_analysis: self.config.include_syntax,
        };

        let response = self.client.post(&self.config.url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Status { status, body });
        }

        let body: AnalyzerResponse = response
            .json()
            .await
            .map_err(|e| CollaboratorError::Malformed(e.to_string()))?;

        body.into_metrics()
    }
}
