// Copyright (c) 2025 - Cowboy AI, Inc.
//! Data Stack
//!
//! Declares a managed relational database cluster in the isolated
//! subnet tier and grants default-port ingress to the allowed security
//! groups. Grants are de-duplicated by group identity. Credentials live
//! in a generated secret; this stack only hands out the opaque
//! reference and never reads the secret's contents.

use serde_json::json;
use std::collections::HashSet;
use tracing::info;

use crate::domain::{
    AttrRef, DatabaseClusterHandle, DatabaseEngine, DatabaseName, IngressPeer, IngressRule,
    NetworkHandle, Provenance, SecretRef, SecurityGroupRef,
};
use crate::errors::{CompositionError, CompositionResult};
use crate::synth::{CompositionContext, Resource, ResourceKind};

/// Inputs of a data stack build
#[derive(Debug, Clone)]
pub struct DatabaseSpec {
    pub engine: DatabaseEngine,
    pub default_database_name: DatabaseName,
    pub instance_count: u8,
}

/// Builder for the data stack
pub struct DataStack;

impl DataStack {
    /// `build(network, allowedIngressGroups[]) -> DatabaseClusterHandle`
    pub fn build(
        ctx: &mut CompositionContext,
        scope: Provenance,
        spec: DatabaseSpec,
        network: &NetworkHandle,
        allowed_ingress_groups: &[SecurityGroupRef],
    ) -> CompositionResult<DatabaseClusterHandle> {
        let stack = ctx.stack_name(scope).to_string();

        ctx.consume(scope, network.produced_by(), network.logical_id())?;

        if spec.instance_count == 0 {
            return Err(CompositionError::InvalidField {
                stack,
                field: "instance_count".to_string(),
                message: "cluster needs at least one instance".to_string(),
            });
        }

        let isolated = network.isolated_tier().ok_or_else(|| {
            CompositionError::MissingSubnetTier {
                stack: stack.clone(),
                tier: "isolated".to_string(),
            }
        })?;

        for group in allowed_ingress_groups {
            ctx.consume(scope, group.produced_by(), group.name())?;
            if group.network_id() != network.id() {
                return Err(CompositionError::ForeignSecurityGroup {
                    stack,
                    group: group.name().to_string(),
                });
            }
        }

        let secret_id = ctx.add_resource(
            scope,
            "db/secret",
            Resource::new(
                ResourceKind::DatabaseSecret,
                json!({
                    "engine": spec.engine.family(),
                    "fields": ["username", "password", "host", "port"],
                }),
            ),
        )?;

        let cluster_id = ctx.add_resource(
            scope,
            "db/cluster",
            Resource::new(
                ResourceKind::DatabaseCluster,
                json!({
                    "engine": spec.engine.family(),
                    "engine-version": spec.engine.version(),
                    "default-database-name": spec.default_database_name.as_str(),
                    "network": network.logical_id(),
                    "subnet-tier": isolated.name(),
                    "instance-count": spec.instance_count,
                    "credentials": secret_id,
                }),
            ),
        )?;

        // Additive and idempotent: a group granted twice gets one rule
        let port = spec.engine.default_port();
        let mut seen = HashSet::new();
        for group in allowed_ingress_groups {
            if !seen.insert(group.id()) {
                continue;
            }
            ctx.grant_ingress(
                &cluster_id,
                IngressRule::tcp(
                    IngressPeer::Group(group.clone()),
                    port,
                    format!("{} access to cluster default port", group.name()),
                ),
            );
        }

        info!(
            stack = %ctx.stack_name(scope),
            cluster = %cluster_id,
            engine = %spec.engine,
            granted = seen.len(),
            "data stack built"
        );

        Ok(DatabaseClusterHandle::new(
            cluster_id.clone(),
            spec.engine,
            spec.default_database_name,
            AttrRef::new(cluster_id, "Endpoint"),
            SecretRef::new(secret_id),
            scope,
        ))
    }
}
