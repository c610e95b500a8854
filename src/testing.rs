//! Scripted collaborators for unit tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::analyzer::Analyzer;
use crate::error::CollaboratorError;
use crate::llm::{Generator, TieBreaker};
use crate::models::MetricVector;

/// Analyzer answering from a fixed text-to-metrics table
#[derive(Default)]
pub struct ScriptedAnalyzer {
    table: HashMap<String, MetricVector>,
    calls: AtomicUsize,
}

impl ScriptedAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, text: &str, metrics: MetricVector) -> Self {
        self.table.insert(text.to_string(), metrics);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Analyzer for ScriptedAnalyzer {
    async fn analyze(&self, text: &str) -> Result<MetricVector, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.table
            .get(text)
            .copied()
            .ok_or_else(|| {
                CollaboratorError::Malformed(format!("no metrics scripted for {text:?}"))
            })
    }
}

/// Generator answering by the first rule whose needle appears in the prompt
#[derive(Default)]
pub struct ScriptedGenerator {
    rules: Vec<(String, String)>,
    fallback: Option<String>,
    calls: AtomicUsize,
    temperatures: Mutex<Vec<f64>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn always(text: &str) -> Self {
        Self {
            fallback: Some(text.to_string()),
            ..Self::default()
        }
    }

    pub fn when(mut self, needle: &str, text: &str) -> Self {
        self.rules.push((needle.to_string(), text.to_string()));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn temperatures(&self) -> Vec<f64> {
        self.temperatures.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, prompt: &str, temperature: f64) -> Result<String, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.temperatures.lock().unwrap().push(temperature);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, text)| text.clone())
            .or_else(|| self.fallback.clone())
            .ok_or_else(|| CollaboratorError::Transport("no scripted reply".to_string()))
    }
}

/// Generator whose every call fails
#[derive(Default)]
pub struct FailingGenerator {
    calls: AtomicUsize,
}

impl FailingGenerator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Generator for FailingGenerator {
    async fn generate(
        &self,
        _prompt: &str,
        _temperature: f64,
    ) -> Result<String, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CollaboratorError::Transport("generator unavailable".to_string()))
    }
}

/// Generator that records the peak number of calls in flight at once
pub struct InFlightGenerator {
    text: String,
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlightGenerator {
    pub fn new(text: &str, delay: Duration) -> Self {
        Self {
            text: text.to_string(),
            delay,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Generator for InFlightGenerator {
    async fn generate(
        &self,
        _prompt: &str,
        _temperature: f64,
    ) -> Result<String, CollaboratorError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }
}

/// Tie-breaker returning a fixed reply, or failing when none is set
#[derive(Default)]
pub struct ScriptedTieBreaker {
    reply: Option<String>,
    calls: AtomicUsize,
}

impl ScriptedTieBreaker {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TieBreaker for ScriptedTieBreaker {
    async fn choose(&self, _candidate_texts: &[String]) -> Result<String, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply
            .clone()
            .ok_or_else(|| CollaboratorError::Transport("tie-breaker unavailable".to_string()))
    }
}
