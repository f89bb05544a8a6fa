// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for coordinated control-plane mutations
//!
//! [`RemoteError`] is what a single control-plane call reports. It is an
//! explicit two-way split so the retry loop only ever has to `match` on it.
//! [`CoordinationError`] is what callers of this crate receive.

use crate::coordination::LockKey;
use std::time::Duration;
use thiserror::Error;

/// Outcome of a single failed call against the control plane
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The parent object is mid-mutation by another caller
    #[error("busy: {0}")]
    Busy(String),
    /// Validation, permission, not-found and everything else that will not
    /// change by asking again
    #[error("{0}")]
    Terminal(String),
}

impl RemoteError {
    pub fn busy(message: impl Into<String>) -> Self {
        Self::Busy(message.into())
    }

    pub fn terminal(message: impl Into<String>) -> Self {
        Self::Terminal(message.into())
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy(_))
    }
}

/// Errors surfaced to resource-operation collaborators
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinationError {
    #[error("parent still busy after {attempts} attempts over {elapsed:?}: {last}")]
    RetryTimeout {
        attempts: u32,
        elapsed: Duration,
        #[source]
        last: RemoteError,
    },

    #[error("{0}")]
    Terminal(String),

    #[error("task {task_id} failed: {detail}")]
    TaskFailed { task_id: String, detail: String },

    #[error("task {task_id} was canceled{}", detail_suffix(.detail))]
    TaskCanceled {
        task_id: String,
        detail: Option<String>,
    },

    #[error("gave up waiting for task {task_id} after {waited:?}; its outcome is unknown")]
    TaskTimeout { task_id: String, waited: Duration },

    #[error("could not refresh status of task {task_id}: {message}")]
    Poll { task_id: String, message: String },

    #[error("cannot determine the owner of {object}: {reason}")]
    UnresolvedOwner { object: String, reason: String },

    #[error("timed out after {waited:?} waiting for lock {key}")]
    LockTimeout { key: LockKey, waited: Duration },
}

impl CoordinationError {
    /// Stable label for log fields and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RetryTimeout { .. } => "retry_timeout",
            Self::Terminal(_) => "terminal",
            Self::TaskFailed { .. } => "task_failed",
            Self::TaskCanceled { .. } => "task_canceled",
            Self::TaskTimeout { .. } => "task_timeout",
            Self::Poll { .. } => "poll",
            Self::UnresolvedOwner { .. } => "unresolved_owner",
            Self::LockTimeout { .. } => "lock_timeout",
        }
    }

    /// Whether the remote parent may still be changing after this error.
    ///
    /// Callers must treat the parent's state as unknown rather than failed.
    pub fn leaves_state_unknown(&self) -> bool {
        matches!(self, Self::TaskTimeout { .. } | Self::Poll { .. })
    }

    /// Whether the control plane never accepted the mutation
    pub fn never_submitted(&self) -> bool {
        matches!(
            self,
            Self::RetryTimeout { .. }
                | Self::Terminal(_)
                | Self::UnresolvedOwner { .. }
                | Self::LockTimeout { .. }
        )
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!(": {detail}"),
        None => String::new(),
    }
}

/// Result type alias for coordination operations
pub type Result<T> = std::result::Result<T, CoordinationError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
