pub mod client;
pub mod prompts;

pub use client::*;
pub use prompts::*;

use async_trait::async_trait;

use crate::error::CollaboratorError;

/// Produces one rewrite of a prompt at a given temperature
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str, temperature: f64) -> Result<String, CollaboratorError>;
}

/// Chooses among several passing candidates.
///
/// Returns the raw reply; the selector parses the 1-based index out of it.
#[async_trait]
pub trait TieBreaker: Send + Sync {
    async fn choose(&self, candidate_texts: &[String]) -> Result<String, CollaboratorError>;
}
