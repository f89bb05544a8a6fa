// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-plane adapters
//!
//! The control plane is modeled by three calls: submit a mutation, poll a
//! task, and look up who owns a gateway. Everything else about its API lives
//! in the resource translators.

mod noop;

pub use noop::NoOpControlPlane;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{ControlPlaneCall, FakeControlPlane, FakeEvent};

use async_trait::async_trait;
use gwlock_core::{GatewayOwner, ManagedObject, RemoteError, TaskHandle, TaskPoller};

/// Kind of state change a mutation makes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MutationAction {
    Create,
    Update,
    Delete,
}

impl MutationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationAction::Create => "create",
            MutationAction::Update => "update",
            MutationAction::Delete => "delete",
        }
    }
}

impl std::fmt::Display for MutationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A state-changing request against one managed object
#[derive(Clone, Debug, PartialEq)]
pub struct Mutation {
    pub object: ManagedObject,
    pub action: MutationAction,
    /// Translator-built request body, opaque to this layer
    pub payload: serde_json::Value,
}

impl Mutation {
    pub fn new(object: ManagedObject, action: MutationAction, payload: serde_json::Value) -> Self {
        Self {
            object,
            action,
            payload,
        }
    }

    pub fn create(object: ManagedObject, payload: serde_json::Value) -> Self {
        Self::new(object, MutationAction::Create, payload)
    }

    pub fn update(object: ManagedObject, payload: serde_json::Value) -> Self {
        Self::new(object, MutationAction::Update, payload)
    }

    pub fn delete(object: ManagedObject) -> Self {
        Self::new(object, MutationAction::Delete, serde_json::Value::Null)
    }

    /// e.g. `update nat_rule snat-1`
    pub fn describe(&self) -> String {
        format!("{} {}", self.action, self.object)
    }
}

/// Adapter for the networking control plane
#[async_trait]
pub trait ControlPlaneAdapter: TaskPoller + Clone + Send + Sync + 'static {
    /// Submit one mutation attempt.
    ///
    /// Returns the accepted task, [`RemoteError::Busy`] when the parent is
    /// mid-mutation, or [`RemoteError::Terminal`] for anything that will not
    /// succeed on retry.
    async fn submit(&self, mutation: &Mutation) -> Result<TaskHandle, RemoteError>;

    /// Owner of a gateway, or `None` if no such gateway exists
    async fn gateway_owner(&self, gateway_id: &str) -> Result<Option<GatewayOwner>, RemoteError>;
}
