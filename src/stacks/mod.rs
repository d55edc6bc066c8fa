// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stack Builders
//!
//! Each stack is a pure function from explicit input handles to output
//! handles, declaring its resources into the passed composition
//! context. A stack owns what it declares and never mutates a handle it
//! did not produce.

pub mod compute;
pub mod data;
pub mod network;

pub use compute::{
    AutoscalingSpec, ClusterCapacitySpec, ClusterSpec, ComputeSpec, ComputeStack, InstanceSpec,
    ListenerSpec, LoadBalancerSpec, ServiceSpec, TargetRef, TaskSpec,
};
pub use data::{DataStack, DatabaseSpec};
pub use network::{NetworkSpec, NetworkStack};
