// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stack Composition Domain Models
//!
//! Value objects with validation invariants and the opaque handles
//! exchanged between stacks. Everything here is immutable after
//! construction; invalid states are unrepresentable.
//!
//! # Value Objects with Invariants
//!
//! - [`CidrBlock`] - IPv4 address block, host bits must be zero
//! - [`SubnetTier`] - named subnet category with routing kind
//! - [`Port`] - non-zero TCP/UDP port
//! - [`HealthCheck`] - probe config, timeout strictly below interval
//! - [`ScalingRange`] - inclusive `[min, max]`, never empty
//! - [`DatabaseName`] - identifier-validated default schema name
//!
//! # Handles
//!
//! - [`NetworkHandle`] - provisioned network with named tiers
//! - [`SecurityGroupRef`] - traffic filter scoped to one network
//! - [`DatabaseClusterHandle`] - managed cluster with secret reference
//! - [`ComputeOutput`] - load balancer DNS output

pub mod compute;
pub mod database;
pub mod handles;
pub mod health;
pub mod ingress;
pub mod network;
pub mod scaling;

pub use compute::{
    ComputeError, EnvValue, ImageRef, InstanceType, KeyPairRef, PortMapping, StartupScript,
};
pub use database::{DatabaseEngine, DatabaseError, DatabaseName};
pub use handles::{
    AttrRef, ComputeOutput, DatabaseClusterHandle, NetworkHandle, Provenance, SecretField,
    SecretRef, SecretValue, SecurityGroupRef,
};
pub use health::{HealthCheck, HealthCheckError};
pub use ingress::{IngressError, IngressPeer, IngressRule, Port, Protocol};
pub use network::{CidrBlock, NetworkError, SubnetTier, TierKind};
pub use scaling::{Cron, ScalingError, ScalingPolicy, ScalingRange};
