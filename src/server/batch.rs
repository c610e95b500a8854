use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::controller::RevisionController;
use crate::error::ValidationInputError;
use crate::io::{BatchReviseRequest, ReviseRequest, ReviseResponse};

use super::AppState;

/// Revise a single request
pub async fn revise_one(
    controller: &RevisionController,
    request: ReviseRequest,
) -> Result<ReviseResponse, ValidationInputError> {
    let tolerance = request.tolerance(controller.config().default_margins)?;
    let session = controller
        .revise(request.request_id, &request.text, &tolerance)
        .await?;
    Ok(ReviseResponse::from_session(session))
}

/// Revise every item, at most `max_concurrent` at once for this request and
/// never more than the process-wide slots allow.
///
/// Results come back in item order. A rejected item gets an error result;
/// it does not fail the batch.
pub async fn revise_batch(
    state: &AppState,
    request: BatchReviseRequest,
) -> Result<Vec<ReviseResponse>, ValidationInputError> {
    let max_concurrent = request
        .max_concurrent
        .unwrap_or(state.controller.config().max_batch_concurrency);
    if max_concurrent == 0 {
        return Err(ValidationInputError::ZeroConcurrency);
    }

    let local_slots = Arc::new(Semaphore::new(max_concurrent));
    let items = request.items.into_iter().map(|item| {
        let local_slots = local_slots.clone();
        let global_slots = state.batch_slots.clone();
        let controller = state.controller.clone();
        async move {
            // Neither semaphore is ever closed
            let _local = local_slots.acquire_owned().await.ok();
            let _global = global_slots.acquire_owned().await.ok();

            let request_id = item
                .request_id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            let text = item.text.clone();
            let item = ReviseRequest {
                request_id: Some(request_id.clone()),
                ..item
            };

            match revise_one(&controller, item).await {
                Ok(response) => response,
                Err(e) => ReviseResponse::rejected(request_id, text, &e),
            }
        }
    });

    Ok(join_all(items).await)
}
