// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-interval retry of mutating calls that hit a busy parent

use crate::error::{CoordinationError, RemoteError, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Poll cadence and overall budget for a retried or polled operation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Delay between attempts
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Give up once this much time has elapsed
    #[serde(with = "humantime_serde")]
    pub overall_timeout: Duration,
}

impl RetryPolicy {
    pub fn new(poll_interval: Duration, overall_timeout: Duration) -> Self {
        Self {
            poll_interval,
            overall_timeout,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_overall_timeout(mut self, timeout: Duration) -> Self {
        self.overall_timeout = timeout;
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            overall_timeout: Duration::from_secs(300),
        }
    }
}

/// Runs one mutating call, absorbing busy responses within a policy's budget
#[derive(Clone, Copy, Debug, Default)]
pub struct RetryingInvoker {
    policy: RetryPolicy,
}

impl RetryingInvoker {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Call `attempt` until it succeeds, fails terminally, or stays busy past
    /// the overall timeout.
    ///
    /// Busy responses sleep `poll_interval` before the next attempt, or only
    /// the time left when less remains; no attempt starts after the budget
    /// is spent. Terminal
    /// errors return at once without sleeping. A persistent busy parent yields
    /// [`CoordinationError::RetryTimeout`] carrying the last busy error.
    pub async fn invoke<T, F, Fut>(&self, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, RemoteError>>,
    {
        let start = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            match attempt().await {
                Ok(value) => {
                    if attempts > 1 {
                        tracing::debug!(attempts, "accepted after busy retries");
                    }
                    return Ok(value);
                }
                Err(RemoteError::Terminal(message)) => {
                    tracing::debug!(attempts, error = %message, "terminal error, not retrying");
                    return Err(CoordinationError::Terminal(message));
                }
                Err(busy @ RemoteError::Busy(_)) => {
                    let remaining = self
                        .policy
                        .overall_timeout
                        .saturating_sub(start.elapsed());
                    if remaining.is_zero() {
                        return Err(self.timed_out(attempts, start, busy));
                    }
                    let delay = self.policy.poll_interval.min(remaining);
                    tracing::debug!(
                        attempts,
                        retry_in_ms = delay.as_millis() as u64,
                        error = %busy,
                        "parent busy, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    // No attempt once the budget is spent
                    if start.elapsed() >= self.policy.overall_timeout {
                        return Err(self.timed_out(attempts, start, busy));
                    }
                }
            }
        }
    }

    fn timed_out(&self, attempts: u32, start: Instant, last: RemoteError) -> CoordinationError {
        let elapsed = start.elapsed();
        tracing::warn!(
            attempts,
            elapsed_ms = elapsed.as_millis() as u64,
            error = %last,
            "parent still busy, giving up"
        );
        CoordinationError::RetryTimeout {
            attempts,
            elapsed,
            last,
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
