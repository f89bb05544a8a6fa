// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ownership resolution: which parent key guards a managed object
//!
//! A gateway serializes mutations against itself. When the gateway is pooled
//! under a shared resource group, the group serializes across all of its
//! gateways, so the group's key subsumes the gateway's.
//!
//! Resolution is a pure function over an [`OwnershipView`] the caller has
//! already fetched. Nothing here performs I/O or touches the registry.

use super::registry::LockKey;
use crate::error::{CoordinationError, Result};
use std::collections::HashMap;

/// Category of managed network object
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Gateway,
    Network,
    FirewallRule,
    NatRule,
    IpSecVpnTunnel,
    BgpConfiguration,
    BgpNeighbor,
    StaticRoute,
    IpSet,
    SecurityGroup,
    LoadBalancerPool,
    LoadBalancerVirtualService,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Gateway => "gateway",
            ObjectKind::Network => "network",
            ObjectKind::FirewallRule => "firewall_rule",
            ObjectKind::NatRule => "nat_rule",
            ObjectKind::IpSecVpnTunnel => "ipsec_vpn_tunnel",
            ObjectKind::BgpConfiguration => "bgp_configuration",
            ObjectKind::BgpNeighbor => "bgp_neighbor",
            ObjectKind::StaticRoute => "static_route",
            ObjectKind::IpSet => "ip_set",
            ObjectKind::SecurityGroup => "security_group",
            ObjectKind::LoadBalancerPool => "load_balancer_pool",
            ObjectKind::LoadBalancerVirtualService => "load_balancer_virtual_service",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an object names the parent it is mutated under
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParentRef {
    /// An existing gateway, looked up in the ownership view
    Gateway(String),
    /// The parent itself is being created; its id comes from the request
    FromRequest(String),
}

/// Reference to an object a collaborator is about to mutate
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ManagedObject {
    pub kind: ObjectKind,
    pub name: String,
    pub parent: ParentRef,
}

impl ManagedObject {
    pub fn new(kind: ObjectKind, name: impl Into<String>, parent: ParentRef) -> Self {
        Self {
            kind,
            name: name.into(),
            parent,
        }
    }

    /// An object living under an existing gateway
    pub fn on_gateway(
        kind: ObjectKind,
        name: impl Into<String>,
        gateway_id: impl Into<String>,
    ) -> Self {
        Self::new(kind, name, ParentRef::Gateway(gateway_id.into()))
    }

    /// A parent being created, keyed by the id from its request parameters
    pub fn new_parent(kind: ObjectKind, id: impl Into<String>) -> Self {
        let id = id.into();
        Self::new(kind, id.clone(), ParentRef::FromRequest(id))
    }

    /// Gateway id that must be looked up to resolve this object, if any
    pub fn gateway_id(&self) -> Option<&str> {
        match &self.parent {
            ParentRef::Gateway(id) => Some(id),
            ParentRef::FromRequest(_) => None,
        }
    }
}

impl std::fmt::Display for ManagedObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}

/// Who owns a gateway
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum GatewayOwner {
    /// Owned by a single tenant scope; the gateway serializes itself
    Standalone { vdc: String },
    /// Pooled under a shared resource group
    Group { group: String },
}

/// Already-fetched ownership of the gateways an operation touches
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OwnershipView {
    gateways: HashMap<String, GatewayOwner>,
}

impl OwnershipView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gateway(mut self, gateway_id: impl Into<String>, owner: GatewayOwner) -> Self {
        self.insert(gateway_id, owner);
        self
    }

    pub fn insert(&mut self, gateway_id: impl Into<String>, owner: GatewayOwner) {
        self.gateways.insert(gateway_id.into(), owner);
    }

    pub fn owner_of(&self, gateway_id: &str) -> Option<&GatewayOwner> {
        self.gateways.get(gateway_id)
    }

    pub fn len(&self) -> usize {
        self.gateways.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gateways.is_empty()
    }
}

/// Key that must be held before mutating `object`
pub fn resolve_lock_key(object: &ManagedObject, view: &OwnershipView) -> Result<LockKey> {
    let unresolved = |reason: String| CoordinationError::UnresolvedOwner {
        object: object.to_string(),
        reason,
    };

    match &object.parent {
        ParentRef::FromRequest(id) => {
            if id.is_empty() {
                return Err(unresolved("request carries no parent id".to_string()));
            }
            Ok(LockKey::new(id.as_str()))
        }
        ParentRef::Gateway(gateway_id) => {
            if gateway_id.is_empty() {
                return Err(unresolved("no parent gateway id".to_string()));
            }
            match view.owner_of(gateway_id) {
                None => Err(unresolved(format!("gateway {gateway_id} not found"))),
                Some(GatewayOwner::Group { group }) if group.is_empty() => Err(unresolved(
                    format!("gateway {gateway_id} names an empty group"),
                )),
                Some(GatewayOwner::Group { group }) => Ok(LockKey::new(group.as_str())),
                Some(GatewayOwner::Standalone { .. }) => Ok(LockKey::new(gateway_id.as_str())),
            }
        }
    }
}

/// Sorted, de-duplicated keys for every object an operation touches
pub fn resolve_lock_keys<'a, I>(objects: I, view: &OwnershipView) -> Result<Vec<LockKey>>
where
    I: IntoIterator<Item = &'a ManagedObject>,
{
    let mut keys = objects
        .into_iter()
        .map(|object| resolve_lock_key(object, view))
        .collect::<Result<Vec<_>>>()?;
    keys.sort();
    keys.dedup();
    Ok(keys)
}

#[cfg(test)]
#[path = "ownership_tests.rs"]
mod tests;
