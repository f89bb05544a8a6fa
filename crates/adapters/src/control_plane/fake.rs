// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake control plane for testing
//!
//! Enforces single-writer-per-parent the way the real control plane does: a
//! submission against a parent that still has a running task is rejected as
//! busy. Tasks finish after a configurable number of polls.
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ControlPlaneAdapter, Mutation, MutationAction};
use async_trait::async_trait;
use gwlock_core::{
    resolve_lock_key, GatewayOwner, OwnershipView, RemoteError, TaskHandle, TaskPoller, TaskStatus,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Recorded control-plane call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlPlaneCall {
    Submit {
        object: String,
        action: MutationAction,
    },
    Poll {
        task_id: String,
    },
    GatewayOwner {
        gateway_id: String,
    },
}

/// What happened to a parent, in the order the control plane saw it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeEvent {
    Accepted {
        task_id: String,
        parent: String,
        operation: String,
    },
    RejectedBusy {
        parent: String,
        operation: String,
    },
    Finished {
        task_id: String,
        parent: String,
        status: TaskStatus,
    },
}

struct FakeTask {
    parent: String,
    remaining_polls: u32,
    outcome: TaskStatus,
    status: TaskStatus,
}

#[derive(Default)]
struct FakeState {
    gateways: OwnershipView,
    tasks: HashMap<String, FakeTask>,
    /// Parent key -> task currently mutating it
    active: HashMap<String, String>,
    submit_errors: VecDeque<RemoteError>,
    poll_errors: VecDeque<RemoteError>,
    task_outcomes: VecDeque<TaskStatus>,
    polls_to_complete: u32,
    calls: Vec<ControlPlaneCall>,
    events: Vec<FakeEvent>,
    next_task: u64,
}

/// Fake control plane with call recording for testing
#[derive(Clone)]
pub struct FakeControlPlane {
    state: Arc<Mutex<FakeState>>,
}

impl Default for FakeControlPlane {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeControlPlane {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                polls_to_complete: 1,
                ..FakeState::default()
            })),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register an existing gateway and its owner
    pub fn add_gateway(&self, gateway_id: &str, owner: GatewayOwner) {
        self.lock().gateways.insert(gateway_id, owner);
    }

    /// Polls a task needs before it reaches its outcome; zero makes
    /// submissions come back already finished
    pub fn set_polls_to_complete(&self, polls: u32) {
        self.lock().polls_to_complete = polls;
    }

    /// Fail the next submission with `err` before any other checks
    pub fn push_submit_error(&self, err: RemoteError) {
        self.lock().submit_errors.push_back(err);
    }

    /// Fail the next status poll with `err`
    pub fn push_poll_error(&self, err: RemoteError) {
        self.lock().poll_errors.push_back(err);
    }

    /// Outcome for the next accepted task (default: success)
    pub fn push_task_outcome(&self, status: TaskStatus) {
        self.lock().task_outcomes.push_back(status);
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<ControlPlaneCall> {
        self.lock().calls.clone()
    }

    pub fn events(&self) -> Vec<FakeEvent> {
        self.lock().events.clone()
    }

    pub fn submit_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, ControlPlaneCall::Submit { .. }))
            .count()
    }

    pub fn poll_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, ControlPlaneCall::Poll { .. }))
            .count()
    }

    /// Submissions rejected because their parent was mid-mutation
    pub fn busy_rejections(&self) -> usize {
        self.lock()
            .events
            .iter()
            .filter(|e| matches!(e, FakeEvent::RejectedBusy { .. }))
            .count()
    }

    /// Whether a task is currently running against `parent`
    pub fn is_parent_busy(&self, parent: &str) -> bool {
        self.lock().active.contains_key(parent)
    }
}

#[async_trait]
impl TaskPoller for FakeControlPlane {
    async fn poll_status(&self, task: &TaskHandle) -> Result<TaskStatus, RemoteError> {
        let mut guard = self.lock();
        let state = &mut *guard;
        state.calls.push(ControlPlaneCall::Poll {
            task_id: task.id.clone(),
        });

        if let Some(err) = state.poll_errors.pop_front() {
            return Err(err);
        }

        let fake = state
            .tasks
            .get_mut(&task.id)
            .ok_or_else(|| RemoteError::terminal(format!("task {} not found", task.id)))?;
        if fake.status.is_terminal() {
            return Ok(fake.status.clone());
        }

        fake.remaining_polls = fake.remaining_polls.saturating_sub(1);
        if fake.remaining_polls == 0 {
            fake.status = fake.outcome.clone();
            state.active.remove(&fake.parent);
            state.events.push(FakeEvent::Finished {
                task_id: task.id.clone(),
                parent: fake.parent.clone(),
                status: fake.status.clone(),
            });
        }
        Ok(fake.status.clone())
    }
}

#[async_trait]
impl ControlPlaneAdapter for FakeControlPlane {
    async fn submit(&self, mutation: &Mutation) -> Result<TaskHandle, RemoteError> {
        let mut guard = self.lock();
        let state = &mut *guard;
        state.calls.push(ControlPlaneCall::Submit {
            object: mutation.object.to_string(),
            action: mutation.action,
        });

        if let Some(err) = state.submit_errors.pop_front() {
            return Err(err);
        }

        let operation = mutation.describe();
        let parent = resolve_lock_key(&mutation.object, &state.gateways)
            .map_err(|e| RemoteError::terminal(e.to_string()))?
            .to_string();

        if let Some(running) = state.active.get(&parent) {
            let message = format!("{parent} is busy with task {running}");
            state.events.push(FakeEvent::RejectedBusy { parent, operation });
            return Err(RemoteError::busy(message));
        }

        state.next_task += 1;
        let task_id = format!("task-{}", state.next_task);
        let outcome = state
            .task_outcomes
            .pop_front()
            .unwrap_or(TaskStatus::Success);
        state.events.push(FakeEvent::Accepted {
            task_id: task_id.clone(),
            parent: parent.clone(),
            operation: operation.clone(),
        });

        let handle = TaskHandle::new(task_id.clone(), operation);
        if state.polls_to_complete == 0 {
            state.events.push(FakeEvent::Finished {
                task_id: task_id.clone(),
                parent: parent.clone(),
                status: outcome.clone(),
            });
            state.tasks.insert(
                task_id,
                FakeTask {
                    parent,
                    remaining_polls: 0,
                    outcome: outcome.clone(),
                    status: outcome.clone(),
                },
            );
            return Ok(handle.with_status(outcome));
        }

        state.active.insert(parent.clone(), task_id.clone());
        state.tasks.insert(
            task_id,
            FakeTask {
                parent,
                remaining_polls: state.polls_to_complete,
                outcome,
                status: TaskStatus::Running,
            },
        );
        Ok(handle)
    }

    async fn gateway_owner(&self, gateway_id: &str) -> Result<Option<GatewayOwner>, RemoteError> {
        let mut state = self.lock();
        state.calls.push(ControlPlaneCall::GatewayOwner {
            gateway_id: gateway_id.to_string(),
        });
        Ok(state.gateways.owner_of(gateway_id).cloned())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
