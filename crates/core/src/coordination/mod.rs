// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordination primitives for serializing mutations against shared parents
//!
//! This module provides:
//! - **LockRegistry** - Keyed exclusive locks, created lazily per parent
//! - **ScopedLock** - RAII guard releasing its key exactly once
//! - **Ownership** - Pure resolution of which parent key an object needs

pub mod ownership;
pub mod registry;
pub mod scoped;

pub use ownership::{
    resolve_lock_key, resolve_lock_keys, GatewayOwner, ManagedObject, ObjectKind, OwnershipView,
    ParentRef,
};
pub use registry::{LockKey, LockRegistry, DEFAULT_NESTED_LOCK_TIMEOUT};
pub use scoped::{ScopedLock, ScopedLocks};
