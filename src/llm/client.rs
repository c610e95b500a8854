use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{build_selection_prompt, Generator, TieBreaker, SYSTEM_PROMPT};
use crate::error::CollaboratorError;

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";

/// Configuration for the Anthropic API client
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key (from ANTHROPIC_API_KEY env var)
    pub api_key: String,
    /// Model to use (REVISOR_MODEL env var overrides the default)
    pub model: String,
    /// Maximum tokens in response
    pub max_tokens: u32,
    /// Temperature for tie-break calls (low = consistent choices)
    pub tie_break_temperature: f64,
}

impl AnthropicConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .context("ANTHROPIC_API_KEY environment variable not set")?;
        let model = std::env::var("REVISOR_MODEL")
            .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string());

        Ok(Self::new(api_key, model))
    }

    /// Create with custom settings
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            max_tokens: 4096,
            tie_break_temperature: 0.1,
        }
    }
}

/// Anthropic API client, serving as both Generator and TieBreaker
pub struct AnthropicClient {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicClient {
    pub fn new(config: AnthropicConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Send a message to Claude and get the text of the reply
    pub async fn send_message(
        &self,
        system: &str,
        user: &str,
        temperature: f64,
    ) -> Result<String, CollaboratorError> {
        let request = AnthropicRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: Some(temperature),
            system: Some(system.to_string()),
            messages: vec![Message {
                role: "user".to_string(),
                content: user.to_string(),
            }],
        };

        let response = self
            .client
            .post(MESSAGES_URL)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Status { status, body });
        }

        let response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| CollaboratorError::Malformed(e.to_string()))?;

        // Extract text from the first content block
        response
            .content
            .into_iter()
            .find(|c| c.content_type == "text")
            .map(|c| c.text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| CollaboratorError::Malformed("no text content in response".to_string()))
    }
}

#[async_trait]
impl Generator for AnthropicClient {
    async fn generate(&self, prompt: &str, temperature: f64) -> Result<String, CollaboratorError> {
        self.send_message(SYSTEM_PROMPT, prompt, temperature).await
    }
}

#[async_trait]
impl TieBreaker for AnthropicClient {
    async fn choose(&self, candidate_texts: &[String]) -> Result<String, CollaboratorError> {
        let prompt = build_selection_prompt(candidate_texts);
        self.send_message(
            "You select the best candidate and answer with its number only.",
            &prompt,
            self.config.tie_break_temperature,
        )
        .await
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = AnthropicConfig::new("key".to_string(), "model".to_string());
        assert_eq!(config.max_tokens, 4096);
        assert_eq!(config.tie_break_temperature, 0.1);
    }

    #[test]
    fn test_parse_response_text_block() {
        let json = r#"{"content": [{"type": "text", "text": "  2 \n"}]}"#;
        let response: AnthropicResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.content[0].content_type, "text");
        assert_eq!(response.content[0].text.trim(), "2");
    }
}
