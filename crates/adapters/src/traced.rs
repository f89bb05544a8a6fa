// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::control_plane::{ControlPlaneAdapter, Mutation};
use async_trait::async_trait;
use gwlock_core::{GatewayOwner, RemoteError, TaskHandle, TaskPoller, TaskStatus};
use tracing::Instrument;

/// Wrapper that adds tracing to any ControlPlaneAdapter
#[derive(Clone)]
pub struct TracedControlPlane<C> {
    inner: C,
}

impl<C> TracedControlPlane<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<C: ControlPlaneAdapter> TaskPoller for TracedControlPlane<C> {
    async fn poll_status(&self, task: &TaskHandle) -> Result<TaskStatus, RemoteError> {
        let span = tracing::debug_span!("control_plane.poll", task_id = %task.id);

        async move {
            let start = std::time::Instant::now();
            let result = self.inner.poll_status(task).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(status) => tracing::debug!(%status, elapsed_ms, "polled"),
                Err(e) => tracing::warn!(elapsed_ms, error = %e, "poll failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[async_trait]
impl<C: ControlPlaneAdapter> ControlPlaneAdapter for TracedControlPlane<C> {
    async fn submit(&self, mutation: &Mutation) -> Result<TaskHandle, RemoteError> {
        let span = tracing::info_span!(
            "control_plane.submit",
            action = %mutation.action,
            object = %mutation.object,
        );

        async move {
            // Precondition: the object must name its parent
            if mutation.object.gateway_id().is_some_and(str::is_empty) {
                tracing::error!("mutation has no parent gateway id");
                return Err(RemoteError::terminal(format!(
                    "{} has no parent gateway id",
                    mutation.object
                )));
            }

            tracing::info!("submitting");

            let start = std::time::Instant::now();
            let result = self.inner.submit(mutation).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(task) => tracing::info!(task_id = %task.id, elapsed_ms, "task accepted"),
                Err(e) if e.is_busy() => tracing::info!(elapsed_ms, error = %e, "parent busy"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "submit failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn gateway_owner(&self, gateway_id: &str) -> Result<Option<GatewayOwner>, RemoteError> {
        let span = tracing::debug_span!("control_plane.gateway_owner", gateway_id);
        let result = self.inner.gateway_owner(gateway_id).instrument(span.clone()).await;

        let _guard = span.enter();
        match &result {
            Ok(Some(GatewayOwner::Group { group })) => tracing::debug!(group, "grouped gateway"),
            Ok(Some(GatewayOwner::Standalone { vdc })) => {
                tracing::debug!(vdc, "standalone gateway")
            }
            Ok(None) => tracing::warn!("gateway not found"),
            Err(e) => tracing::warn!(error = %e, "owner lookup failed"),
        }
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
