// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Asynchronous control-plane tasks and waiting for them to finish
//!
//! An accepted mutation is not a completed one. The control plane hands back a
//! task handle and applies the change in the background; callers poll the
//! task until it reaches a terminal state before releasing the parent lock.
//!
//! ```text
//! Running ──┬──► Success
//!           ├──► Failed { detail }
//!           └──► Canceled { detail }
//! ```

use crate::error::{CoordinationError, RemoteError, Result};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

/// Remote task state
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskStatus {
    Running,
    Success,
    Failed { detail: String },
    Canceled { detail: Option<String> },
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Running => "running",
            TaskStatus::Success => "success",
            TaskStatus::Failed { .. } => "failed",
            TaskStatus::Canceled { .. } => "canceled",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of an accepted mutation, with the status it was accepted in
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskHandle {
    pub id: String,
    /// Human-readable description of the operation, for logs
    pub operation: String,
    pub status: TaskStatus,
}

impl TaskHandle {
    pub fn new(id: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            operation: operation.into(),
            status: TaskStatus::Running,
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }
}

impl std::fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.id, self.operation)
    }
}

/// Source of task status, usually the control-plane adapter
#[async_trait]
pub trait TaskPoller: Send + Sync {
    async fn poll_status(
        &self,
        task: &TaskHandle,
    ) -> std::result::Result<TaskStatus, RemoteError>;
}

/// Summary of a task that completed successfully
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskReport {
    pub task_id: String,
    /// Status refreshes issued; zero when the handle was already terminal
    pub polls: u32,
    pub waited: Duration,
}

/// A task being waited on; dropped once its terminal state is seen
#[derive(Debug)]
struct PendingTask {
    handle: TaskHandle,
    status: TaskStatus,
    polls: u32,
}

impl PendingTask {
    fn new(handle: &TaskHandle) -> Self {
        Self {
            status: handle.status.clone(),
            handle: handle.clone(),
            polls: 0,
        }
    }

    async fn refresh<P: TaskPoller + ?Sized>(&mut self, poller: &P) -> Result<()> {
        let status = poller
            .poll_status(&self.handle)
            .await
            .map_err(|e| CoordinationError::Poll {
                task_id: self.handle.id.clone(),
                message: e.to_string(),
            })?;
        self.polls += 1;
        if status != self.status {
            tracing::debug!(
                task_id = %self.handle.id,
                from = %self.status,
                to = %status,
                "task status changed"
            );
        }
        self.status = status;
        Ok(())
    }

    /// Final result, or `None` while the task is still running
    fn outcome(&self, waited: Duration) -> Option<Result<TaskReport>> {
        let task_id = self.handle.id.clone();
        let outcome = match &self.status {
            TaskStatus::Running => return None,
            TaskStatus::Success => Ok(TaskReport {
                task_id,
                polls: self.polls,
                waited,
            }),
            TaskStatus::Failed { detail } => Err(CoordinationError::TaskFailed {
                task_id,
                detail: detail.clone(),
            }),
            TaskStatus::Canceled { detail } => Err(CoordinationError::TaskCanceled {
                task_id,
                detail: detail.clone(),
            }),
        };
        Some(outcome)
    }
}

/// Polls accepted tasks to a terminal state within a policy's budget
#[derive(Clone, Copy, Debug, Default)]
pub struct TaskWaiter {
    policy: RetryPolicy,
}

impl TaskWaiter {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Wait for `handle` to finish.
    ///
    /// A handle that is already terminal resolves without polling. Otherwise
    /// the status is refreshed every `poll_interval` until it turns terminal
    /// or `overall_timeout` elapses. The last sleep is cut short to end at the
    /// budget and no poll follows it. On timeout the task may still be running
    /// remotely and [`CoordinationError::TaskTimeout`] is returned.
    pub async fn wait<P: TaskPoller + ?Sized>(
        &self,
        poller: &P,
        handle: &TaskHandle,
    ) -> Result<TaskReport> {
        let start = Instant::now();
        let mut pending = PendingTask::new(handle);

        loop {
            if let Some(outcome) = pending.outcome(start.elapsed()) {
                match &outcome {
                    Ok(report) => tracing::debug!(
                        task_id = %report.task_id,
                        polls = report.polls,
                        waited_ms = report.waited.as_millis() as u64,
                        "task succeeded"
                    ),
                    Err(e) => {
                        tracing::warn!(task_id = %handle.id, error = %e, "task did not succeed")
                    }
                }
                return outcome;
            }

            if pending.polls > 0 {
                let remaining = self
                    .policy
                    .overall_timeout
                    .saturating_sub(start.elapsed());
                if remaining.is_zero() {
                    return Err(timed_out(handle, pending.polls, start));
                }
                tokio::time::sleep(self.policy.poll_interval.min(remaining)).await;
                // No poll once the budget is spent
                if start.elapsed() >= self.policy.overall_timeout {
                    return Err(timed_out(handle, pending.polls, start));
                }
            }

            pending.refresh(poller).await?;
        }
    }
}

fn timed_out(handle: &TaskHandle, polls: u32, start: Instant) -> CoordinationError {
    let waited = start.elapsed();
    tracing::warn!(
        task_id = %handle.id,
        polls,
        waited_ms = waited.as_millis() as u64,
        "gave up waiting for task"
    );
    CoordinationError::TaskTimeout {
        task_id: handle.id.clone(),
        waited,
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
