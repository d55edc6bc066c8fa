// Copyright (c) 2025 - Cowboy AI, Inc.
//! Opaque Handles Exchanged Between Stacks
//!
//! Handles are the only data that flows across stack boundaries. They are
//! immutable value objects created by the producing stack's build function
//! and never mutated afterwards. Each handle records its provenance (the
//! sequence number of the stack that produced it) so the composition
//! context can enforce the acyclic dependency rule: a stack consumes only
//! handles produced by stacks built strictly earlier.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::database::{DatabaseEngine, DatabaseName};
use super::ingress::Port;
use super::network::{CidrBlock, SubnetTier, TierKind};

/// Sequence position of the stack that produced a handle
///
/// Allocated by the composition context when a stack scope is opened.
/// Opaque outside the crate; ordering is all that matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Provenance(pub(crate) u32);

/// Deferred reference to an attribute of a declared resource
///
/// Resolved by the external deploy engine, never at composition time.
/// Renders into the template as a `get-attr` object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttrRef {
    #[serde(rename = "get-attr")]
    target: AttrTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttrTarget {
    resource: String,
    attribute: String,
}

impl AttrRef {
    pub(crate) fn new(resource: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            target: AttrTarget {
                resource: resource.into(),
                attribute: attribute.into(),
            },
        }
    }

    /// Logical id of the resource the attribute belongs to
    pub fn resource(&self) -> &str {
        &self.target.resource
    }

    /// Attribute name resolved at deploy time
    pub fn attribute(&self) -> &str {
        &self.target.attribute
    }
}

/// Named fields of a credential secret
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretField {
    Username,
    Password,
    Host,
    Port,
}

/// Deferred resolution of one named secret field
///
/// This is a token, not a value. It renders into the template as a
/// `resolve` object for the external secret store; the raw credential is
/// never available during composition, so rotation is respected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecretValue {
    #[serde(rename = "resolve")]
    target: SecretTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecretTarget {
    secret: String,
    field: SecretField,
}

impl SecretValue {
    /// Logical id of the secret resource
    pub fn secret(&self) -> &str {
        &self.target.secret
    }

    pub fn field(&self) -> SecretField {
        self.target.field
    }
}

/// Opaque reference to a credential secret
///
/// Consumers may only request named fields; there is no accessor for the
/// secret's contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecretRef {
    logical_id: String,
}

impl SecretRef {
    pub(crate) fn new(logical_id: impl Into<String>) -> Self {
        Self {
            logical_id: logical_id.into(),
        }
    }

    /// Request deferred resolution of one named field
    pub fn field(&self, field: SecretField) -> SecretValue {
        SecretValue {
            target: SecretTarget {
                secret: self.logical_id.clone(),
                field,
            },
        }
    }
}

/// A provisioned virtual network with named subnet tiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkHandle {
    id: Uuid,
    logical_id: String,
    address_block: CidrBlock,
    az_count: u8,
    tiers: Vec<SubnetTier>,
    produced_by: Provenance,
}

impl NetworkHandle {
    pub(crate) fn new(
        logical_id: impl Into<String>,
        address_block: CidrBlock,
        az_count: u8,
        tiers: Vec<SubnetTier>,
        produced_by: Provenance,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            logical_id: logical_id.into(),
            address_block,
            az_count,
            tiers,
            produced_by,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Logical id of the network resource in the template
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    pub fn address_block(&self) -> CidrBlock {
        self.address_block
    }

    pub fn az_count(&self) -> u8 {
        self.az_count
    }

    pub fn tiers(&self) -> &[SubnetTier] {
        &self.tiers
    }

    /// Look up a tier by name
    pub fn tier(&self, name: &str) -> Option<&SubnetTier> {
        self.tiers.iter().find(|t| t.name() == name)
    }

    /// First tier of the given kind, in declaration order
    pub fn tier_of_kind(&self, kind: TierKind) -> Option<&SubnetTier> {
        self.tiers.iter().find(|t| t.kind() == kind)
    }

    /// The isolated tier, where managed databases are placed
    pub fn isolated_tier(&self) -> Option<&SubnetTier> {
        self.tier_of_kind(TierKind::Isolated)
    }

    pub(crate) fn produced_by(&self) -> Provenance {
        self.produced_by
    }
}

impl fmt::Display for NetworkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.logical_id, self.address_block)
    }
}

/// A named traffic-filter policy scoped to exactly one network
///
/// Security groups are declared without ingress rules; rules are granted
/// later by the stacks that wire consumers together. De-duplication of
/// grants keys on the identity (`id`) of this reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecurityGroupRef {
    id: Uuid,
    name: String,
    logical_id: String,
    network_id: Uuid,
    produced_by: Provenance,
}

impl SecurityGroupRef {
    pub(crate) fn new(
        name: impl Into<String>,
        logical_id: impl Into<String>,
        network_id: Uuid,
        produced_by: Provenance,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            logical_id: logical_id.into(),
            network_id,
            produced_by,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// Identity of the network this group is scoped to
    pub fn network_id(&self) -> Uuid {
        self.network_id
    }

    pub(crate) fn produced_by(&self) -> Provenance {
        self.produced_by
    }
}

impl fmt::Display for SecurityGroupRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A managed relational database cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseClusterHandle {
    id: Uuid,
    logical_id: String,
    engine: DatabaseEngine,
    default_database_name: DatabaseName,
    endpoint: AttrRef,
    secret: SecretRef,
    produced_by: Provenance,
}

impl DatabaseClusterHandle {
    pub(crate) fn new(
        logical_id: impl Into<String>,
        engine: DatabaseEngine,
        default_database_name: DatabaseName,
        endpoint: AttrRef,
        secret: SecretRef,
        produced_by: Provenance,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            logical_id: logical_id.into(),
            engine,
            default_database_name,
            endpoint,
            secret,
            produced_by,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    pub fn engine(&self) -> &DatabaseEngine {
        &self.engine
    }

    pub fn default_database_name(&self) -> &DatabaseName {
        &self.default_database_name
    }

    /// Cluster endpoint, resolved at deploy time
    pub fn endpoint(&self) -> &AttrRef {
        &self.endpoint
    }

    /// Opaque credential secret reference
    pub fn secret(&self) -> &SecretRef {
        &self.secret
    }

    /// Default port of the cluster's engine
    pub fn default_port(&self) -> Port {
        self.engine.default_port()
    }

    pub(crate) fn produced_by(&self) -> Provenance {
        self.produced_by
    }
}

/// The externally reachable entry point of a compute stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeOutput {
    output_name: String,
    load_balancer_dns: AttrRef,
    produced_by: Provenance,
}

impl ComputeOutput {
    pub(crate) fn new(
        output_name: impl Into<String>,
        load_balancer_dns: AttrRef,
        produced_by: Provenance,
    ) -> Self {
        Self {
            output_name: output_name.into(),
            load_balancer_dns,
            produced_by,
        }
    }

    /// Name of the template output carrying the DNS name
    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    /// Load balancer DNS name, resolved at deploy time
    pub fn load_balancer_dns(&self) -> &AttrRef {
        &self.load_balancer_dns
    }

    #[allow(dead_code)]
    pub(crate) fn produced_by(&self) -> Provenance {
        self.produced_by
    }
}
