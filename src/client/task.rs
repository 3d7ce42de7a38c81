//! Polling loop for server-side asynchronous tasks
//!
//! The server owns every state transition; the client only observes them by
//! polling at a fixed interval. Connectivity retries happen inside a single
//! poll (see [`super::retry`]), so each call to the poll function counts as
//! one attempt against the budget no matter how many transport retries it
//! needed.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::models::{TaskSnapshot, TaskStatus, TaskUpdate};
use crate::config::PollingConfig;
use crate::error::{ApiError, ApiResult};

/// Attempt budget and cadence for [`poll_until_done`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            interval: Duration::from_millis(1000),
        }
    }
}

impl From<&PollingConfig> for PollOptions {
    fn from(config: &PollingConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            interval: Duration::from_millis(config.interval_ms),
        }
    }
}

/// Poll a task until it completes, fails, runs out of attempts, or is cancelled.
///
/// `poll` is called once per attempt. `on_update` runs after every attempt
/// that produced a snapshot, in attempt order. A transient poll failure uses
/// up its attempt and the loop carries on, except on the final attempt where
/// it is returned.
pub async fn poll_until_done<R, P, Fut, U>(
    task_id: &str,
    options: PollOptions,
    cancel: &CancellationToken,
    mut poll: P,
    mut on_update: U,
) -> ApiResult<R>
where
    P: FnMut() -> Fut,
    Fut: Future<Output = ApiResult<TaskSnapshot<R>>>,
    U: FnMut(&TaskUpdate),
{
    let max_attempts = options.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        if cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        let outcome = tokio::select! {
            _ = cancel.cancelled() => return Err(ApiError::Cancelled),
            outcome = poll() => outcome,
        };

        match outcome {
            Ok(snapshot) => {
                on_update(&TaskUpdate {
                    attempt,
                    status: snapshot.status,
                    progress: snapshot.progress,
                });

                match snapshot.status {
                    TaskStatus::Completed => {
                        return snapshot.result.ok_or_else(|| {
                            ApiError::InvalidResponse(format!(
                                "Task {} completed without a result",
                                task_id
                            ))
                        });
                    }
                    TaskStatus::Failed => {
                        return Err(ApiError::TaskFailed {
                            task_id: task_id.to_string(),
                            message: snapshot
                                .error
                                .unwrap_or_else(|| "Task failed without details".to_string()),
                        });
                    }
                    TaskStatus::Processing => {
                        log::debug!(
                            "Task {} still processing (attempt {}/{}, progress {:?})",
                            task_id,
                            attempt,
                            max_attempts,
                            snapshot.progress
                        );
                    }
                }
            }
            Err(e) if e.is_transient() && attempt < max_attempts => {
                log::warn!(
                    "Poll for task {} failed (attempt {}/{}): {}",
                    task_id,
                    attempt,
                    max_attempts,
                    e
                );
            }
            Err(e) => return Err(e),
        }

        if attempt < max_attempts {
            tokio::select! {
                _ = cancel.cancelled() => return Err(ApiError::Cancelled),
                _ = tokio::time::sleep(options.interval) => {}
            }
        }
    }

    Err(ApiError::TaskTimeout {
        task_id: task_id.to_string(),
        attempts: max_attempts,
    })
}
