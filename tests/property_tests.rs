// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests
//!
//! proptest verification of the composition invariants that must hold
//! for all valid inputs: subnet counting, ingress idempotence, scaling
//! range and health check validation.

use proptest::prelude::*;
use std::time::Duration;

use cim_stacks::domain::{
    CidrBlock, HealthCheck, Port, ScalingRange, SubnetTier, TierKind,
};
use cim_stacks::stacks::{DataStack, DatabaseSpec, NetworkSpec, NetworkStack};
use cim_stacks::synth::CompositionContext;
use cim_stacks::ResourceKind;

fn tier_kind(index: usize) -> TierKind {
    match index % 3 {
        0 => TierKind::Public,
        1 => TierKind::PrivateNat,
        _ => TierKind::Isolated,
    }
}

proptest! {
    /// Health check construction succeeds exactly when timeout < interval
    #[test]
    fn health_check_requires_timeout_below_interval(
        interval in 1u64..600,
        timeout in 1u64..600,
    ) {
        let result = HealthCheck::new(
            Duration::from_secs(interval),
            Duration::from_secs(timeout),
            "/health",
        );
        prop_assert_eq!(result.is_ok(), timeout < interval);
    }

    /// Scaling range construction succeeds exactly when min <= max
    #[test]
    fn scaling_range_requires_min_at_most_max(min in 0u32..100, max in 0u32..100) {
        let result = ScalingRange::new(min, max);
        prop_assert_eq!(result.is_ok(), min <= max);
        if let Ok(range) = result {
            prop_assert!(range.contains(min));
            prop_assert!(range.contains(max));
        }
    }

    /// Exactly az_count x tier_count subnets, for any valid shape
    #[test]
    fn subnet_count_is_azs_times_tiers(az_count in 1u8..=6, tier_count in 1usize..=4) {
        let tiers = (0..tier_count)
            .map(|i| SubnetTier::new(format!("tier{i}"), tier_kind(i), 24).unwrap())
            .collect::<Vec<_>>();

        let mut ctx = CompositionContext::new("prop");
        let scope = ctx.begin_stack("network").unwrap();
        NetworkStack::build(
            &mut ctx,
            scope,
            NetworkSpec {
                address_block: CidrBlock::new("10.0.0.0/8").unwrap(),
                az_count,
                subnet_tiers: tiers,
                security_groups: vec![],
            },
        )
        .unwrap();
        ctx.seal_stack(scope);

        let template = ctx.synth();
        prop_assert_eq!(
            template.resources_of_kind(ResourceKind::Subnet).count(),
            az_count as usize * tier_count
        );
    }

    /// Granted-ingress set equals the de-duplicated identity set of the
    /// allowed groups, however the input repeats them
    #[test]
    fn ingress_grants_are_idempotent(picks in proptest::collection::vec(0usize..3, 1..12)) {
        let mut ctx = CompositionContext::new("prop");
        let scope = ctx.begin_stack("network").unwrap();
        let (network, groups) = NetworkStack::build(
            &mut ctx,
            scope,
            NetworkSpec {
                address_block: CidrBlock::new("10.10.0.0/16").unwrap(),
                az_count: 1,
                subnet_tiers: vec![SubnetTier::new("DB", TierKind::Isolated, 24).unwrap()],
                security_groups: vec!["a".into(), "b".into(), "c".into()],
            },
        )
        .unwrap();
        ctx.seal_stack(scope);

        let allowed: Vec<_> = picks.iter().map(|&i| groups[i].clone()).collect();
        let mut distinct = Vec::new();
        for &i in &picks {
            if !distinct.contains(&i) {
                distinct.push(i);
            }
        }

        let scope = ctx.begin_stack("data").unwrap();
        let handle = DataStack::build(
            &mut ctx,
            scope,
            DatabaseSpec {
                engine: cim_stacks::domain::DatabaseEngine::aurora_postgres("13.4").unwrap(),
                default_database_name: cim_stacks::domain::DatabaseName::new("db").unwrap(),
                instance_count: 1,
            },
            &network,
            &allowed,
        )
        .unwrap();

        let granted = ctx.granted_ingress(handle.logical_id());
        prop_assert_eq!(granted.len(), distinct.len());
    }

    /// Ports reject only zero
    #[test]
    fn port_validation(value in 0u16..) {
        prop_assert_eq!(Port::new(value).is_ok(), value != 0);
    }

    /// CIDR blocks accept any address whose host bits are masked off
    #[test]
    fn cidr_accepts_masked_addresses(raw in any::<u32>(), prefix in 0u8..=32) {
        let mask = if prefix == 0 { 0 } else { u32::MAX << (32 - prefix) };
        let masked = std::net::Ipv4Addr::from(raw & mask);
        prop_assert!(CidrBlock::from_parts(masked, prefix).is_ok());
    }
}
