// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Stack
//!
//! Declares a virtual network with named subnet tiers and zero or more
//! security groups. Creates exactly `az_count x len(subnet_tiers)`
//! subnets, one per (availability zone, tier) pair. Security groups are
//! pure declarations with no ingress rules; this stack knows nothing
//! about what will consume them, which keeps the dependency arrow
//! one-directional.

use serde_json::json;
use std::collections::HashSet;
use tracing::info;

use crate::domain::{CidrBlock, NetworkHandle, Provenance, SecurityGroupRef, SubnetTier};
use crate::errors::{CompositionError, CompositionResult};
use crate::synth::{CompositionContext, Resource, ResourceKind};

/// Inputs of a network stack build
#[derive(Debug, Clone)]
pub struct NetworkSpec {
    pub address_block: CidrBlock,
    pub az_count: u8,
    pub subnet_tiers: Vec<SubnetTier>,
    /// Names of security groups to declare, without any rules
    pub security_groups: Vec<String>,
}

/// Builder for the network stack
pub struct NetworkStack;

impl NetworkStack {
    /// `build(addressBlock, azCount, subnetTiers[]) -> NetworkHandle, SecurityGroupRef[]`
    pub fn build(
        ctx: &mut CompositionContext,
        scope: Provenance,
        spec: NetworkSpec,
    ) -> CompositionResult<(NetworkHandle, Vec<SecurityGroupRef>)> {
        let stack = ctx.stack_name(scope).to_string();

        if spec.az_count == 0 {
            return Err(CompositionError::ZeroAvailabilityZones { stack });
        }
        if spec.subnet_tiers.is_empty() {
            return Err(CompositionError::NoSubnetTiers { stack });
        }

        let mut tier_names = HashSet::new();
        for tier in &spec.subnet_tiers {
            if !tier_names.insert(tier.name()) {
                return Err(CompositionError::DuplicateSubnetTier {
                    stack,
                    tier: tier.name().to_string(),
                });
            }
            if tier.prefix_length() < spec.address_block.prefix_length() {
                return Err(CompositionError::TierWiderThanNetwork {
                    stack,
                    tier: tier.name().to_string(),
                    tier_prefix: tier.prefix_length(),
                    network_prefix: spec.address_block.prefix_length(),
                });
            }
        }

        let mut group_names = HashSet::new();
        for name in &spec.security_groups {
            if !group_names.insert(name.as_str()) {
                return Err(CompositionError::DuplicateName {
                    stack,
                    what: "security group",
                    name: name.clone(),
                });
            }
        }

        let vpc_id = ctx.add_resource(
            scope,
            "Vpc",
            Resource::new(
                ResourceKind::Vpc,
                json!({
                    "address-block": spec.address_block.to_string(),
                    "az-count": spec.az_count,
                }),
            ),
        )?;

        // One subnet per (AZ, tier) pair, tier order preserved
        for tier in &spec.subnet_tiers {
            for az in 1..=spec.az_count {
                ctx.add_resource(
                    scope,
                    &format!("subnet/{}-az{}", tier.name(), az),
                    Resource::new(
                        ResourceKind::Subnet,
                        json!({
                            "network": vpc_id,
                            "tier": tier.name(),
                            "kind": tier.kind().to_string(),
                            "availability-zone": az,
                            "prefix-length": tier.prefix_length(),
                        }),
                    ),
                )?;
            }
        }

        let handle = NetworkHandle::new(
            vpc_id.clone(),
            spec.address_block,
            spec.az_count,
            spec.subnet_tiers.clone(),
            scope,
        );

        let mut groups = Vec::with_capacity(spec.security_groups.len());
        for name in &spec.security_groups {
            let logical_id = ctx.add_resource(
                scope,
                &format!("sg/{name}"),
                Resource::new(
                    ResourceKind::SecurityGroup,
                    json!({
                        "name": name,
                        "network": vpc_id,
                    }),
                ),
            )?;
            groups.push(SecurityGroupRef::new(name, logical_id, handle.id(), scope));
        }

        info!(
            stack = %ctx.stack_name(scope),
            network = %handle,
            subnets = spec.az_count as usize * spec.subnet_tiers.len(),
            security_groups = groups.len(),
            "network stack built"
        );

        Ok((handle, groups))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TierKind;
    use pretty_assertions::assert_eq;

    fn spec() -> NetworkSpec {
        NetworkSpec {
            address_block: CidrBlock::new("10.10.0.0/16").unwrap(),
            az_count: 3,
            subnet_tiers: vec![
                SubnetTier::new("Public", TierKind::Public, 24).unwrap(),
                SubnetTier::new("Private", TierKind::PrivateNat, 24).unwrap(),
                SubnetTier::new("DB", TierKind::Isolated, 24).unwrap(),
            ],
            security_groups: vec!["app".to_string(), "alb".to_string()],
        }
    }

    fn build(spec: NetworkSpec) -> CompositionResult<(NetworkHandle, Vec<SecurityGroupRef>)> {
        let mut ctx = CompositionContext::new("test");
        let scope = ctx.begin_stack("network").unwrap();
        NetworkStack::build(&mut ctx, scope, spec)
    }

    #[test]
    fn produces_handle_and_group_refs() {
        let (network, groups) = build(spec()).unwrap();
        assert_eq!(network.az_count(), 3);
        assert_eq!(network.tiers().len(), 3);
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| g.network_id() == network.id()));
    }

    #[test]
    fn declares_one_subnet_per_az_tier_pair() {
        let mut ctx = CompositionContext::new("test");
        let scope = ctx.begin_stack("network").unwrap();
        NetworkStack::build(&mut ctx, scope, spec()).unwrap();
        ctx.seal_stack(scope);

        let template = ctx.synth();
        assert_eq!(template.resources_of_kind(ResourceKind::Subnet).count(), 9);
        assert!(template.resource("network/subnet/DB-az3").is_some());
    }

    #[test]
    fn zero_azs_fails_fast() {
        let mut bad = spec();
        bad.az_count = 0;
        assert_eq!(
            build(bad),
            Err(CompositionError::ZeroAvailabilityZones {
                stack: "network".to_string()
            })
        );
    }

    #[test]
    fn empty_tiers_fail_fast() {
        let mut bad = spec();
        bad.subnet_tiers.clear();
        assert_eq!(
            build(bad),
            Err(CompositionError::NoSubnetTiers {
                stack: "network".to_string()
            })
        );
    }

    #[test]
    fn duplicate_tier_names_rejected() {
        let mut bad = spec();
        bad.subnet_tiers
            .push(SubnetTier::new("Public", TierKind::Public, 24).unwrap());
        assert_eq!(
            build(bad),
            Err(CompositionError::DuplicateSubnetTier {
                stack: "network".to_string(),
                tier: "Public".to_string(),
            })
        );
    }

    #[test]
    fn tier_wider_than_network_rejected() {
        let mut bad = spec();
        bad.subnet_tiers = vec![SubnetTier::new("Huge", TierKind::Public, 8).unwrap()];
        assert!(matches!(
            build(bad),
            Err(CompositionError::TierWiderThanNetwork { tier_prefix: 8, .. })
        ));
    }

    #[test]
    fn security_groups_declared_without_rules() {
        let mut ctx = CompositionContext::new("test");
        let scope = ctx.begin_stack("network").unwrap();
        let (_, groups) = NetworkStack::build(&mut ctx, scope, spec()).unwrap();
        for group in &groups {
            assert!(ctx.granted_ingress(group.logical_id()).is_empty());
        }
    }
}
