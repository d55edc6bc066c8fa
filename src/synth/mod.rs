// Copyright (c) 2025 - Cowboy AI, Inc.
//! Composition Context and Template Synthesis
//!
//! The resource graph is built by threading an explicit
//! [`CompositionContext`] through each stack's build function, then
//! frozen once into a [`Template`]. There is no ambient registration
//! and no runtime execution.

pub mod context;
pub mod resource;
pub mod template;

pub use context::CompositionContext;
pub use resource::{Resource, ResourceKind};
pub use template::{OutputValue, Template, FORMAT_VERSION};
