//! Configuration-error taxonomy for stack composition
//!
//! Every variant names the offending stack and field so the operator can
//! fix inputs and re-run composition. Provider-side failures (quota,
//! permissions, bad image references) surface during the external deploy
//! step and are deliberately not represented here.

use thiserror::Error;

/// Errors detected during composition, before synthesis
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompositionError {
    /// Network declared with no availability zones
    #[error("stack {stack}: availability zone count must be at least 1")]
    ZeroAvailabilityZones { stack: String },

    /// Network declared with no subnet tiers
    #[error("stack {stack}: at least one subnet tier is required")]
    NoSubnetTiers { stack: String },

    /// Two subnet tiers share a name
    #[error("stack {stack}: duplicate subnet tier name: {tier}")]
    DuplicateSubnetTier { stack: String, tier: String },

    /// Subnet tier prefix shorter than the enclosing address block
    #[error(
        "stack {stack}: tier {tier} prefix /{tier_prefix} is wider than the network /{network_prefix}"
    )]
    TierWiderThanNetwork {
        stack: String,
        tier: String,
        tier_prefix: u8,
        network_prefix: u8,
    },

    /// A required subnet tier is absent from the consumed network
    #[error("stack {stack}: required subnet tier missing: {tier}")]
    MissingSubnetTier { stack: String, tier: String },

    /// Security group belongs to a different network than the one consumed
    #[error("stack {stack}: security group {group} is scoped to a different network")]
    ForeignSecurityGroup { stack: String, group: String },

    /// Security group name does not resolve within the groups passed in
    #[error("stack {stack}: unknown security group: {group}")]
    UnknownSecurityGroup { stack: String, group: String },

    /// Scaling range with min above max
    #[error("stack {stack}: {field}: empty scaling range [{min}, {max}]")]
    EmptyScalingRange {
        stack: String,
        field: String,
        min: u32,
        max: u32,
    },

    /// Scheduled capacity floor above the scalable maximum
    #[error("stack {stack}: {field}: scheduled capacity floor {floor} exceeds maximum {max}")]
    ScheduledFloorAboveMax {
        stack: String,
        field: String,
        floor: u32,
        max: u32,
    },

    /// Listener forwards to a target not declared in the same build call
    #[error("stack {stack}: listener on port {port} references undeclared target: {target}")]
    DanglingTarget {
        stack: String,
        port: u16,
        target: String,
    },

    /// Two listeners bound to the same port on one load balancer
    #[error("stack {stack}: duplicate listener port: {port}")]
    DuplicateListenerPort { stack: String, port: u16 },

    /// Two resources within one build call share a name
    #[error("stack {stack}: duplicate {what} name: {name}")]
    DuplicateName {
        stack: String,
        what: &'static str,
        name: String,
    },

    /// A handle was consumed before its producing stack was built
    #[error("stack {stack}: input {handle} was not produced by an earlier stack")]
    HandleFromLaterStack { stack: String, handle: String },

    /// Two stacks registered under the same name
    #[error("duplicate stack name: {stack}")]
    DuplicateStackName { stack: String },

    /// Logical id collision at registration time
    #[error("stack {stack}: duplicate logical id: {logical_id}")]
    DuplicateLogicalId { stack: String, logical_id: String },

    /// Output name collision at registration time
    #[error("stack {stack}: duplicate output name: {output}")]
    DuplicateOutput { stack: String, output: String },

    /// Invalid value object passed through a stack spec
    #[error("stack {stack}: {field}: {message}")]
    InvalidField {
        stack: String,
        field: String,
        message: String,
    },
}

/// Result type for composition operations
pub type CompositionResult<T> = Result<T, CompositionError>;
