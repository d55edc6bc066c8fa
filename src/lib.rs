//! Declarative cloud stack composition for the Composable Information Machine
//!
//! This crate composes a small directed acyclic graph of infrastructure
//! stacks. Later stacks consume opaque handles produced by earlier
//! stacks; the whole graph is validated during composition and
//! synthesized once, top-down, into a declarative resource template for
//! an external deploy engine. There is no persistent process and no
//! runtime execution: build the graph, synthesize, exit.
//!
//! # Stacks
//!
//! 1. **Network** - virtual network with named subnet tiers and
//!    rule-less security group declarations
//! 2. **Data** - managed database cluster in the isolated tier, with
//!    de-duplicated default-port ingress grants
//! 3. **Compute** - fixed instances and/or an elastic container
//!    cluster behind a public load balancer
//!
//! # Usage
//!
//! ```rust
//! use cim_stacks::domain::{CidrBlock, SubnetTier, TierKind};
//! use cim_stacks::stacks::NetworkSpec;
//! use cim_stacks::Composition;
//!
//! let mut app = Composition::new("example");
//! let (_network, groups) = app.network("network", NetworkSpec {
//!     address_block: CidrBlock::new("10.10.0.0/16").unwrap(),
//!     az_count: 3,
//!     subnet_tiers: vec![
//!         SubnetTier::new("Public", TierKind::Public, 24).unwrap(),
//!         SubnetTier::new("DB", TierKind::Isolated, 24).unwrap(),
//!     ],
//!     security_groups: vec!["app".to_string()],
//! }).unwrap();
//!
//! assert_eq!(groups.len(), 1);
//! let template = app.synth();
//! assert_eq!(template.resources().len(), 8); // 1 vpc + 6 subnets + 1 group
//! ```
//!
//! Configuration errors (missing tier, dangling listener target,
//! inverted scaling range, health-check timeout at or above interval)
//! abort composition before synthesis. Provider errors belong to the
//! deploy step and are out of scope.

pub mod composition;
pub mod domain;
pub mod errors;
pub mod stacks;
pub mod synth;

// Re-export commonly used types
pub use composition::Composition;
pub use errors::{CompositionError, CompositionResult};
pub use synth::{CompositionContext, OutputValue, Resource, ResourceKind, Template};
