// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinated mutation executor
//!
//! Every mutation runs the same discipline regardless of whether it creates,
//! updates or deletes: resolve the parent keys, hold them, submit with busy
//! retries, wait for the accepted task to finish, then release.

use gwlock_adapters::{ControlPlaneAdapter, Mutation};
use gwlock_core::{
    resolve_lock_keys, CoordinationError, CoordinatorConfig, LockKey, LockRegistry,
    ManagedObject, OwnershipView, RemoteError, Result, RetryingInvoker, TaskHandle, TaskReport,
    TaskWaiter,
};
use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// A mutation whose task finished successfully
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Completed {
    pub operation_id: Uuid,
    /// Parent keys held while the mutation ran, ascending
    pub keys: Vec<LockKey>,
    /// Submissions made, including those rejected as busy
    pub attempts: u32,
    pub task: TaskReport,
}

/// Runs mutations against a control plane under per-parent locks
pub struct Coordinator<C> {
    registry: Arc<LockRegistry>,
    plane: C,
    config: CoordinatorConfig,
}

impl<C: ControlPlaneAdapter> Coordinator<C> {
    pub fn new(registry: Arc<LockRegistry>, plane: C, config: CoordinatorConfig) -> Self {
        Self {
            registry,
            plane,
            config,
        }
    }

    /// Shared lock registry
    pub fn registry(&self) -> &Arc<LockRegistry> {
        &self.registry
    }

    pub fn plane(&self) -> &C {
        &self.plane
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Lock keys for `objects`, sorted and de-duplicated.
    ///
    /// Looks up the owner of each referenced gateway once, then applies the
    /// ownership rule. A gateway the control plane does not know, or a failed
    /// lookup, makes the whole set unresolvable.
    pub async fn resolve(&self, objects: &[ManagedObject]) -> Result<Vec<LockKey>> {
        let mut view = OwnershipView::new();
        for object in objects {
            let Some(gateway_id) = object.gateway_id() else {
                continue;
            };
            if gateway_id.is_empty() || view.owner_of(gateway_id).is_some() {
                continue;
            }
            match self.plane.gateway_owner(gateway_id).await {
                Ok(Some(owner)) => view.insert(gateway_id, owner),
                Ok(None) => {}
                Err(e) => {
                    return Err(CoordinationError::UnresolvedOwner {
                        object: object.to_string(),
                        reason: format!("owner lookup for gateway {gateway_id} failed: {e}"),
                    })
                }
            }
        }
        tracing::debug!(gateways = view.len(), "owners looked up");
        resolve_lock_keys(objects, &view)
    }

    /// Submit `mutation` under its parent lock and wait for its task
    pub async fn execute(&self, mutation: &Mutation) -> Result<Completed> {
        let plane = &self.plane;
        self.execute_with(
            std::slice::from_ref(&mutation.object),
            &self.config,
            || plane.submit(mutation),
        )
        .await
    }

    /// Run a caller-supplied submission under the locks for `objects`.
    ///
    /// `submit` is called once per attempt and must perform exactly one
    /// control-plane request. Busy rejections are retried per `config.busy`;
    /// the accepted task is awaited per `config.task`. Locks are released
    /// when this returns, on every path.
    pub async fn execute_with<F, Fut>(
        &self,
        objects: &[ManagedObject],
        config: &CoordinatorConfig,
        mut submit: F,
    ) -> Result<Completed>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<TaskHandle, RemoteError>>,
    {
        let operation_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "coordinator.execute",
            op = %operation_id,
            target = %describe(objects),
        );

        async move {
            tracing::info!("starting");
            let start = Instant::now();
            let result = self
                .run(operation_id, objects, config, &mut submit)
                .await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(done) => tracing::info!(
                    task_id = %done.task.task_id,
                    attempts = done.attempts,
                    polls = done.task.polls,
                    elapsed_ms,
                    "completed"
                ),
                Err(e) if e.leaves_state_unknown() => tracing::warn!(
                    kind = e.kind(),
                    elapsed_ms,
                    error = %e,
                    "outcome unknown"
                ),
                Err(e) => tracing::error!(kind = e.kind(), elapsed_ms, error = %e, "failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run<F, Fut>(
        &self,
        operation_id: Uuid,
        objects: &[ManagedObject],
        config: &CoordinatorConfig,
        submit: &mut F,
    ) -> Result<Completed>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<TaskHandle, RemoteError>>,
    {
        let keys = self.resolve(objects).await?;
        if keys.is_empty() {
            return Err(CoordinationError::UnresolvedOwner {
                object: describe(objects),
                reason: "no managed objects given".to_string(),
            });
        }

        let locks = self
            .registry
            .acquire_all(keys.iter().cloned(), config.lock_timeout)
            .await?;
        tracing::debug!(keys = ?keys, "parents locked");

        let mut attempts: u32 = 0;
        let handle = RetryingInvoker::new(config.busy)
            .invoke(|| {
                attempts += 1;
                submit()
            })
            .await?;
        tracing::info!(task_id = %handle.id, attempts, "task accepted");

        let task = TaskWaiter::new(config.task)
            .wait(&self.plane, &handle)
            .await?;
        locks.release();

        Ok(Completed {
            operation_id,
            keys,
            attempts,
            task,
        })
    }
}

fn describe(objects: &[ManagedObject]) -> String {
    match objects {
        [] => "nothing".to_string(),
        [one] => one.to_string(),
        many => many
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
