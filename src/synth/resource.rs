// Copyright (c) 2025 - Cowboy AI, Inc.
//! Declared Resource Model
//!
//! A resource is a kind plus a bag of properties. Kinds live in this
//! crate's own namespace; how a provider fulfills them is out of scope.
//! Properties are plain JSON so the template stays provider-agnostic,
//! with deferred references ([`AttrRef`](crate::domain::AttrRef),
//! [`SecretValue`](crate::domain::SecretValue)) embedded as objects the
//! deploy engine resolves.

use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Taxonomy of declarable resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Vpc,
    Subnet,
    SecurityGroup,
    DatabaseSecret,
    DatabaseCluster,
    Instance,
    ContainerCluster,
    CapacityProvider,
    TaskDefinition,
    Service,
    ScalableTarget,
    LoadBalancer,
    Listener,
    TargetGroup,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Vpc => "Network::Vpc",
            ResourceKind::Subnet => "Network::Subnet",
            ResourceKind::SecurityGroup => "Network::SecurityGroup",
            ResourceKind::DatabaseSecret => "Database::Secret",
            ResourceKind::DatabaseCluster => "Database::Cluster",
            ResourceKind::Instance => "Compute::Instance",
            ResourceKind::ContainerCluster => "Compute::Cluster",
            ResourceKind::CapacityProvider => "Compute::CapacityProvider",
            ResourceKind::TaskDefinition => "Compute::TaskDefinition",
            ResourceKind::Service => "Compute::Service",
            ResourceKind::ScalableTarget => "Compute::ScalableTarget",
            ResourceKind::LoadBalancer => "LoadBalancer",
            ResourceKind::Listener => "LoadBalancer::Listener",
            ResourceKind::TargetGroup => "LoadBalancer::TargetGroup",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for ResourceKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// A single declared resource
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    kind: ResourceKind,
    properties: Value,
}

impl Resource {
    pub fn new(kind: ResourceKind, properties: Value) -> Self {
        Self { kind, properties }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn properties(&self) -> &Value {
        &self.properties
    }

    pub(crate) fn properties_mut(&mut self) -> &mut Value {
        &mut self.properties
    }
}
