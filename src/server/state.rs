//! Shared state for request handlers.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::controller::RevisionController;

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<RevisionController>,
    /// Process-wide bound on batch items revised at once, across all requests
    pub batch_slots: Arc<Semaphore>,
}

impl AppState {
    pub fn new(controller: RevisionController) -> Self {
        let permits = controller.config().max_batch_concurrency;
        Self {
            controller: Arc::new(controller),
            batch_slots: Arc::new(Semaphore::new(permits)),
        }
    }
}
