// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op control plane for dry runs.

use super::{ControlPlaneAdapter, Mutation};
use async_trait::async_trait;
use gwlock_core::{GatewayOwner, RemoteError, TaskHandle, TaskPoller, TaskStatus};

/// Control plane that accepts everything and changes nothing.
///
/// Every submission comes back as an already-succeeded task and every gateway
/// is reported as standalone, so the full lock discipline runs without any
/// remote effect.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpControlPlane;

impl NoOpControlPlane {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TaskPoller for NoOpControlPlane {
    async fn poll_status(&self, _task: &TaskHandle) -> Result<TaskStatus, RemoteError> {
        Ok(TaskStatus::Success)
    }
}

#[async_trait]
impl ControlPlaneAdapter for NoOpControlPlane {
    async fn submit(&self, mutation: &Mutation) -> Result<TaskHandle, RemoteError> {
        Ok(TaskHandle::new("noop", mutation.describe()).with_status(TaskStatus::Success))
    }

    async fn gateway_owner(&self, gateway_id: &str) -> Result<Option<GatewayOwner>, RemoteError> {
        Ok(Some(GatewayOwner::Standalone {
            vdc: format!("noop-{gateway_id}"),
        }))
    }
}
