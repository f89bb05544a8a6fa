//! Shared fixtures for behavioral scenarios

#![allow(dead_code)]

pub use gwlock_adapters::{
    ControlPlaneAdapter, FakeControlPlane, FakeEvent, Mutation, TracedControlPlane,
};
pub use gwlock_core::{
    CoordinationError, CoordinatorConfig, GatewayOwner, LockKey, LockRegistry, ManagedObject,
    ObjectKind, RemoteError, RetryPolicy, TaskHandle, TaskPoller, TaskStatus, TaskWaiter,
};
pub use gwlock_engine::{Completed, Coordinator};
pub use std::sync::Arc;
pub use std::time::Duration;
pub use tokio::time::Instant;

/// A fake control plane with one coordinator in front of it
pub struct Site {
    pub plane: FakeControlPlane,
    pub coordinator: Arc<Coordinator<FakeControlPlane>>,
}

impl Site {
    pub fn new() -> Self {
        Self::with_config(CoordinatorConfig::default())
    }

    pub fn with_config(config: CoordinatorConfig) -> Self {
        let plane = FakeControlPlane::new();
        let coordinator = Coordinator::new(Arc::new(LockRegistry::new()), plane.clone(), config);
        Self {
            plane,
            coordinator: Arc::new(coordinator),
        }
    }

    pub fn standalone(self, gateway_id: &str) -> Self {
        self.plane.add_gateway(
            gateway_id,
            GatewayOwner::Standalone {
                vdc: format!("vdc-{gateway_id}"),
            },
        );
        self
    }

    pub fn grouped(self, gateway_id: &str, group: &str) -> Self {
        self.plane.add_gateway(
            gateway_id,
            GatewayOwner::Group {
                group: group.to_string(),
            },
        );
        self
    }

    /// Run `mutation` through the coordinator on its own task
    pub fn spawn(
        &self,
        mutation: Mutation,
    ) -> tokio::task::JoinHandle<Result<Completed, CoordinationError>> {
        let coordinator = self.coordinator.clone();
        tokio::spawn(async move { coordinator.execute(&mutation).await })
    }

    /// Accepted/finished/rejected events in the order the control plane saw them
    pub fn timeline(&self) -> Vec<String> {
        self.plane
            .events()
            .into_iter()
            .map(|event| match event {
                FakeEvent::Accepted { task_id, .. } => format!("accepted {task_id}"),
                FakeEvent::RejectedBusy { parent, .. } => format!("busy {parent}"),
                FakeEvent::Finished { task_id, .. } => format!("finished {task_id}"),
            })
            .collect()
    }

    pub fn is_locked(&self, key: &str) -> bool {
        self.coordinator.registry().is_locked(&LockKey::from(key))
    }
}

pub fn nat_update(gateway_id: &str, name: &str) -> Mutation {
    Mutation::update(
        ManagedObject::on_gateway(ObjectKind::NatRule, name, gateway_id),
        serde_json::json!({ "enabled": true }),
    )
}

pub fn firewall_create(gateway_id: &str, name: &str) -> Mutation {
    Mutation::create(
        ManagedObject::on_gateway(ObjectKind::FirewallRule, name, gateway_id),
        serde_json::json!({ "action": "allow", "name": name }),
    )
}

pub fn firewall_delete(gateway_id: &str, name: &str) -> Mutation {
    Mutation::delete(ManagedObject::on_gateway(
        ObjectKind::FirewallRule,
        name,
        gateway_id,
    ))
}
