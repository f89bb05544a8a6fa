// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gwlock-core: serialized mutation of shared network parents
//!
//! This crate provides:
//! - A keyed lock registry with RAII guards
//! - Pure ownership resolution from managed objects to parent lock keys
//! - A fixed-interval retry invoker for busy parents
//! - A waiter that polls accepted tasks to a terminal state
//! - Configuration and the error taxonomy shared by the other crates

pub mod config;
pub mod coordination;
pub mod error;
pub mod retry;
pub mod task;

pub use config::{ConfigError, CoordinatorConfig};
pub use coordination::{
    resolve_lock_key, resolve_lock_keys, GatewayOwner, LockKey, LockRegistry, ManagedObject,
    ObjectKind, OwnershipView, ParentRef, ScopedLock, ScopedLocks, DEFAULT_NESTED_LOCK_TIMEOUT,
};
pub use error::{CoordinationError, RemoteError, Result};
pub use retry::{RetryPolicy, RetryingInvoker};
pub use task::{TaskHandle, TaskPoller, TaskReport, TaskStatus, TaskWaiter};
