// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RAII guards for registry locks

use super::registry::LockKey;
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;
use tokio::time::Instant;

/// Exclusive hold on one registry key.
///
/// Released exactly once: either by [`release`](Self::release), which consumes
/// the guard, or on drop (early return, `?`, panic unwind, cancelled future).
#[derive(Debug)]
pub struct ScopedLock {
    key: LockKey,
    /// `None` once released
    guard: Option<OwnedMutexGuard<()>>,
    acquired_at: Instant,
}

impl ScopedLock {
    pub(super) fn new(key: LockKey, guard: OwnedMutexGuard<()>) -> Self {
        Self {
            key,
            guard: Some(guard),
            acquired_at: Instant::now(),
        }
    }

    pub fn key(&self) -> &LockKey {
        &self.key
    }

    /// How long the lock has been held
    pub fn held_for(&self) -> Duration {
        self.acquired_at.elapsed()
    }

    /// Release the lock before the guard goes out of scope
    pub fn release(mut self) {
        self.unlock();
    }

    fn unlock(&mut self) {
        if let Some(guard) = self.guard.take() {
            drop(guard);
            tracing::debug!(
                key = %self.key,
                held_ms = self.held_for().as_millis() as u64,
                "lock released"
            );
        }
    }
}

impl Drop for ScopedLock {
    fn drop(&mut self) {
        self.unlock();
    }
}

/// Several registry keys held together, acquired in ascending key order.
///
/// Released in reverse acquisition order.
#[derive(Debug, Default)]
pub struct ScopedLocks {
    locks: Vec<ScopedLock>,
}

impl ScopedLocks {
    pub(super) fn with_capacity(capacity: usize) -> Self {
        Self {
            locks: Vec::with_capacity(capacity),
        }
    }

    pub(super) fn push(&mut self, lock: ScopedLock) {
        self.locks.push(lock);
    }

    /// Keys held, in acquisition order
    pub fn keys(&self) -> Vec<&LockKey> {
        self.locks.iter().map(ScopedLock::key).collect()
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    pub fn release(mut self) {
        self.unlock_all();
    }

    fn unlock_all(&mut self) {
        while let Some(lock) = self.locks.pop() {
            lock.release();
        }
    }
}

impl Drop for ScopedLocks {
    fn drop(&mut self) {
        self.unlock_all();
    }
}

#[cfg(test)]
#[path = "scoped_tests.rs"]
mod tests;
