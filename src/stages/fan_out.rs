use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use crate::error::CollaboratorError;

/// Slot-addressed results of a fan-out, in the same order as the jobs
#[derive(Debug)]
pub struct FanOut<T> {
    pub results: Vec<Result<T, CollaboratorError>>,
    /// Set when no concurrent task succeeded and the batch was re-run one job at a time
    pub sequential_fallback: bool,
}

impl<T> FanOut<T> {
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| r.is_err()).count()
    }
}

/// Run every job concurrently, each bounded by `timeout`.
///
/// Each task writes only its own slot, so no locking is needed and the
/// job-to-result mapping survives any completion order. A panicked or
/// cancelled task fills its slot with [`CollaboratorError::Aborted`]. When
/// not a single slot succeeds the whole batch is retried once, sequentially.
/// Dropping the returned future aborts whatever task is still running.
pub async fn fan_out<J, T, F, Fut>(jobs: Vec<J>, timeout: Duration, run: F) -> FanOut<T>
where
    J: Clone + Send + 'static,
    T: Send + 'static,
    F: Fn(J) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, CollaboratorError>> + Send + 'static,
{
    let run = Arc::new(run);
    let mut slots: Vec<Option<Result<T, CollaboratorError>>> = jobs.iter().map(|_| None).collect();
    let mut join_set = JoinSet::new();

    for (slot, job) in jobs.iter().cloned().enumerate() {
        let run = run.clone();
        join_set.spawn(async move { (slot, bounded(timeout, run(job)).await) });
    }

    while let Some(joined) = join_set.join_next().await {
        if let Ok((slot, result)) = joined {
            slots[slot] = Some(result);
        }
    }

    let results: Vec<_> = slots
        .into_iter()
        .map(|slot| slot.unwrap_or_else(|| Err(aborted())))
        .collect();

    if jobs.is_empty() || results.iter().any(|r| r.is_ok()) {
        return FanOut {
            results,
            sequential_fallback: false,
        };
    }

    // One-task sets, so a dropped caller aborts the in-flight job here too
    let mut results = Vec::with_capacity(jobs.len());
    for job in jobs {
        let mut task = JoinSet::new();
        task.spawn(bounded(timeout, run(job)));
        let result = match task.join_next().await {
            Some(Ok(result)) => result,
            _ => Err(aborted()),
        };
        results.push(result);
    }

    FanOut {
        results,
        sequential_fallback: true,
    }
}

async fn bounded<T, Fut>(timeout: Duration, call: Fut) -> Result<T, CollaboratorError>
where
    Fut: Future<Output = Result<T, CollaboratorError>>,
{
    tokio::time::timeout(timeout, call)
        .await
        .unwrap_or_else(|_| Err(CollaboratorError::Timeout(timeout)))
}

fn aborted() -> CollaboratorError {
    CollaboratorError::Aborted("task panicked or was cancelled".to_string())
}
