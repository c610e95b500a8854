pub mod analyzer;
pub mod config;
pub mod controller;
pub mod error;
pub mod io;
pub mod llm;
pub mod models;
pub mod observe;
pub mod scoring;
pub mod server;
pub mod stages;

#[cfg(test)]
mod testing;

pub use analyzer::{Analyzer, AnalyzerConfig, HttpAnalyzer};
pub use config::RevisionConfig;
pub use controller::{Collaborators, RevisionController};
pub use error::{CollaboratorError, StageError, ValidationInputError};
pub use io::{AnalyzeResponse, BatchReviseRequest, ReviseRequest, ReviseResponse};
pub use llm::{AnthropicClient, AnthropicConfig, Generator, TieBreaker};
pub use models::{
    EvaluationResult, Margins, MetricVector, RevisionSession, TargetMetrics, ToleranceSpec,
};
pub use observe::{NoopObserver, RevisionObserver, TracingObserver};
pub use scoring::{evaluate, evaluate_bounds, MagnitudePlanner};
pub use server::AppState;
