pub mod client;
pub mod wire;

pub use client::*;
pub use wire::*;

use async_trait::async_trait;

use crate::error::CollaboratorError;
use crate::models::MetricVector;

/// Remote readability analyzer.
///
/// Must be idempotent per input and fail distinguishably: a response that
/// lacks a headline metric is an error, never a zero.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<MetricVector, CollaboratorError>;
}
