// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Keyed lock registry
//!
//! One exclusive lock per parent key, created on first use. The registry's own
//! map is guarded by a short-held sync mutex that is only taken to look up or
//! insert an entry, never while waiting on the entry itself.

use super::scoped::{ScopedLock, ScopedLocks};
use crate::error::{CoordinationError, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::Instant;

/// Budget for every key after the first in a multi-key acquisition when the
/// caller did not supply one
pub const DEFAULT_NESTED_LOCK_TIMEOUT: Duration = Duration::from_secs(300);

/// Stable identifier of a gateway or resource group
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LockKey(String);

impl LockKey {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LockKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LockKey {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for LockKey {
    fn from(id: String) -> Self {
        Self(id)
    }
}

type Entry = Arc<AsyncMutex<()>>;

/// Process-wide store of per-key exclusive locks
///
/// Starts empty and needs no teardown. Share it behind an `Arc` and inject it
/// wherever mutations are coordinated.
#[derive(Debug, Default)]
pub struct LockRegistry {
    entries: Mutex<HashMap<LockKey, Entry>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entry(&self, key: &LockKey) -> Entry {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = entries.get(key) {
            return Arc::clone(entry);
        }
        tracing::debug!(%key, "creating lock entry");
        let entry = Arc::new(AsyncMutex::new(()));
        entries.insert(key.clone(), Arc::clone(&entry));
        entry
    }

    /// Wait until the lock for `key` is held by the caller
    pub async fn acquire(&self, key: impl Into<LockKey>) -> ScopedLock {
        let key = key.into();
        let entry = self.entry(&key);
        let start = Instant::now();
        let guard = entry.lock_owned().await;
        tracing::debug!(
            %key,
            waited_ms = start.elapsed().as_millis() as u64,
            "lock acquired"
        );
        ScopedLock::new(key, guard)
    }

    /// Like [`acquire`](Self::acquire), but give up once `timeout` elapses
    pub async fn acquire_with_deadline(
        &self,
        key: impl Into<LockKey>,
        timeout: Duration,
    ) -> Result<ScopedLock> {
        let key = key.into();
        let entry = self.entry(&key);
        let start = Instant::now();
        match tokio::time::timeout(timeout, entry.lock_owned()).await {
            Ok(guard) => {
                tracing::debug!(
                    %key,
                    waited_ms = start.elapsed().as_millis() as u64,
                    "lock acquired"
                );
                Ok(ScopedLock::new(key, guard))
            }
            Err(_) => {
                tracing::warn!(%key, timeout_ms = timeout.as_millis() as u64, "lock timeout");
                Err(CoordinationError::LockTimeout {
                    key,
                    waited: start.elapsed(),
                })
            }
        }
    }

    /// Acquire several keys in ascending key order.
    ///
    /// Duplicates are collapsed. With `timeout` set, the whole acquisition
    /// shares one deadline. Without it the first key is awaited indefinitely
    /// and the rest share [`DEFAULT_NESTED_LOCK_TIMEOUT`]. On timeout every key
    /// already held is released before the error is returned.
    pub async fn acquire_all<I>(&self, keys: I, timeout: Option<Duration>) -> Result<ScopedLocks>
    where
        I: IntoIterator,
        I::Item: Into<LockKey>,
    {
        let mut keys: Vec<LockKey> = keys.into_iter().map(Into::into).collect();
        keys.sort();
        keys.dedup();

        let mut deadline = timeout.map(|t| Instant::now() + t);
        let mut held = ScopedLocks::with_capacity(keys.len());

        for key in keys {
            let lock = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    self.acquire_with_deadline(key, remaining).await?
                }
                None => {
                    let lock = self.acquire(key).await;
                    deadline = Some(Instant::now() + DEFAULT_NESTED_LOCK_TIMEOUT);
                    lock
                }
            };
            held.push(lock);
        }

        Ok(held)
    }

    /// Number of keys ever seen and not pruned
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether some caller currently holds `key`
    pub fn is_locked(&self, key: &LockKey) -> bool {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .get(key)
            .map(|entry| entry.try_lock().is_err())
            .unwrap_or(false)
    }

    /// Drop entries that nobody holds or waits on.
    ///
    /// Holders and waiters keep a reference to their entry, so an entry
    /// referenced only by the map is idle. Returns the number removed.
    pub fn prune_idle(&self) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| Arc::strong_count(entry) > 1);
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = entries.len(), "pruned idle lock entries");
        }
        removed
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
