pub mod candidate_pool;
pub mod fan_out;
pub mod selector;
pub mod stage_runner;

pub use candidate_pool::*;
pub use fan_out::*;
pub use selector::*;
pub use stage_runner::*;

use std::sync::Arc;

use crate::observe::RevisionObserver;

/// Per-request handle passed down through a stage
#[derive(Clone)]
pub struct StageContext {
    pub request_id: String,
    pub observer: Arc<dyn RevisionObserver>,
}

impl StageContext {
    pub fn new(request_id: impl Into<String>, observer: Arc<dyn RevisionObserver>) -> Self {
        Self {
            request_id: request_id.into(),
            observer,
        }
    }

    #[cfg(test)]
    pub fn noop(request_id: &str) -> Self {
        Self::new(request_id, Arc::new(crate::observe::NoopObserver))
    }
}
