// Copyright (c) 2025 - Cowboy AI, Inc.
//! Composition Root
//!
//! Runs stack builds in dependency order and freezes the graph into a
//! template. Each build opens a stack scope, runs the builder, and
//! seals the scope, so handles become consumable by later stacks only
//! once their producer is complete. Both wiring directions are
//! supported (data before compute, or compute before data); the
//! acyclic constraint is enforced by handle provenance either way.

use tracing::info;

use crate::domain::{
    ComputeOutput, DatabaseClusterHandle, NetworkHandle, SecurityGroupRef,
};
use crate::errors::CompositionResult;
use crate::stacks::{
    ComputeSpec, ComputeStack, DataStack, DatabaseSpec, NetworkSpec, NetworkStack,
};
use crate::synth::{CompositionContext, Template};

/// One composition run: build the graph, synthesize, done
#[derive(Debug)]
pub struct Composition {
    ctx: CompositionContext,
}

impl Composition {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            ctx: CompositionContext::new(app_name),
        }
    }

    /// Build a network stack under the given stack name
    pub fn network(
        &mut self,
        stack_name: &str,
        spec: NetworkSpec,
    ) -> CompositionResult<(NetworkHandle, Vec<SecurityGroupRef>)> {
        let scope = self.ctx.begin_stack(stack_name)?;
        let built = NetworkStack::build(&mut self.ctx, scope, spec)?;
        self.ctx.seal_stack(scope);
        Ok(built)
    }

    /// Build a data stack consuming an earlier network
    pub fn data(
        &mut self,
        stack_name: &str,
        spec: DatabaseSpec,
        network: &NetworkHandle,
        allowed_ingress_groups: &[SecurityGroupRef],
    ) -> CompositionResult<DatabaseClusterHandle> {
        let scope = self.ctx.begin_stack(stack_name)?;
        let built = DataStack::build(
            &mut self.ctx,
            scope,
            spec,
            network,
            allowed_ingress_groups,
        )?;
        self.ctx.seal_stack(scope);
        Ok(built)
    }

    /// Build a compute stack consuming an earlier network and,
    /// optionally, an earlier database cluster
    pub fn compute(
        &mut self,
        stack_name: &str,
        spec: ComputeSpec,
        network: &NetworkHandle,
        security_groups: &[SecurityGroupRef],
        database: Option<&DatabaseClusterHandle>,
    ) -> CompositionResult<ComputeOutput> {
        let scope = self.ctx.begin_stack(stack_name)?;
        let built = ComputeStack::build(
            &mut self.ctx,
            scope,
            spec,
            network,
            security_groups,
            database,
        )?;
        self.ctx.seal_stack(scope);
        Ok(built)
    }

    /// Direct access to the context, for custom wiring and inspection
    pub fn context(&self) -> &CompositionContext {
        &self.ctx
    }

    /// Freeze the graph into a declarative template
    pub fn synth(self) -> Template {
        let template = self.ctx.synth();
        info!(
            app = template.app(),
            resources = template.resources().len(),
            outputs = template.outputs().len(),
            "composition synthesized"
        );
        template
    }
}
