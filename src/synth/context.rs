// Copyright (c) 2025 - Cowboy AI, Inc.
//! Explicit Composition Context
//!
//! Every stack build receives the context as a parameter; no construct
//! registers itself into ambient scope. The context allocates stack
//! sequence positions, records declared resources under
//! `{stack}/{local-id}` logical ids, accumulates ingress grants
//! (ordered, de-duplicated by rule identity), and collects named
//! outputs. Composition is single-threaded and synchronous; `&mut`
//! threading is the whole concurrency model.
//!
//! The context also enforces the acyclic dependency rule: a handle may
//! only be consumed by a stack whose sequence position is strictly
//! greater than the handle's provenance.

use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::domain::{IngressRule, Provenance};
use crate::errors::{CompositionError, CompositionResult};
use crate::synth::resource::Resource;
use crate::synth::template::{OutputValue, Template};

#[derive(Debug)]
struct StackRecord {
    name: String,
    sealed: bool,
}

/// Mutable state of one composition run
#[derive(Debug)]
pub struct CompositionContext {
    app_name: String,
    stacks: Vec<StackRecord>,
    resources: Vec<(String, Resource)>,
    logical_ids: HashSet<String>,
    ingress: HashMap<String, Vec<IngressRule>>,
    outputs: Vec<(String, OutputValue)>,
    output_names: HashSet<String>,
}

impl CompositionContext {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            stacks: Vec::new(),
            resources: Vec::new(),
            logical_ids: HashSet::new(),
            ingress: HashMap::new(),
            outputs: Vec::new(),
            output_names: HashSet::new(),
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Open a stack scope, allocating its sequence position
    pub fn begin_stack(&mut self, name: &str) -> CompositionResult<Provenance> {
        if self.stacks.iter().any(|s| s.name == name) {
            return Err(CompositionError::DuplicateStackName {
                stack: name.to_string(),
            });
        }

        let seq = self.stacks.len() as u32;
        self.stacks.push(StackRecord {
            name: name.to_string(),
            sealed: false,
        });
        debug!(stack = name, seq, "opened stack scope");
        Ok(Provenance(seq))
    }

    /// Seal a stack scope; its handles become consumable by later stacks
    pub fn seal_stack(&mut self, scope: Provenance) {
        if let Some(record) = self.stacks.get_mut(scope.0 as usize) {
            record.sealed = true;
        }
    }

    /// Name of the stack at the given sequence position
    pub fn stack_name(&self, scope: Provenance) -> &str {
        self.stacks
            .get(scope.0 as usize)
            .map(|s| s.name.as_str())
            .unwrap_or("<unknown>")
    }

    /// Assert that a handle was produced by a strictly earlier, sealed stack
    pub fn consume(
        &self,
        current: Provenance,
        produced_by: Provenance,
        handle: &str,
    ) -> CompositionResult<()> {
        let earlier_and_sealed = produced_by < current
            && self
                .stacks
                .get(produced_by.0 as usize)
                .is_some_and(|s| s.sealed);

        if !earlier_and_sealed {
            return Err(CompositionError::HandleFromLaterStack {
                stack: self.stack_name(current).to_string(),
                handle: handle.to_string(),
            });
        }
        Ok(())
    }

    /// Register a resource under `{stack}/{local_id}`, returning the logical id
    pub fn add_resource(
        &mut self,
        scope: Provenance,
        local_id: &str,
        resource: Resource,
    ) -> CompositionResult<String> {
        let logical_id = format!("{}/{}", self.stack_name(scope), local_id);

        if !self.logical_ids.insert(logical_id.clone()) {
            return Err(CompositionError::DuplicateLogicalId {
                stack: self.stack_name(scope).to_string(),
                logical_id,
            });
        }

        debug!(%logical_id, kind = %resource.kind(), "declared resource");
        self.resources.push((logical_id.clone(), resource));
        Ok(logical_id)
    }

    /// Grant an ingress rule on a target resource
    ///
    /// Additive and idempotent: granting an identical rule again is a
    /// no-op. Returns whether the rule was newly added.
    pub fn grant_ingress(&mut self, target_logical_id: &str, rule: IngressRule) -> bool {
        let rules = self
            .ingress
            .entry(target_logical_id.to_string())
            .or_default();

        if rules.contains(&rule) {
            debug!(
                target = target_logical_id,
                rule = %rule.peer(),
                "ingress grant already present, skipping"
            );
            return false;
        }
        rules.push(rule);
        true
    }

    /// Ingress rules granted so far on a target, in grant order
    pub fn granted_ingress(&self, target_logical_id: &str) -> &[IngressRule] {
        self.ingress
            .get(target_logical_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Register a named, human-readable composition output
    pub fn add_output(
        &mut self,
        scope: Provenance,
        name: &str,
        value: OutputValue,
    ) -> CompositionResult<()> {
        if !self.output_names.insert(name.to_string()) {
            return Err(CompositionError::DuplicateOutput {
                stack: self.stack_name(scope).to_string(),
                output: name.to_string(),
            });
        }
        self.outputs.push((name.to_string(), value));
        Ok(())
    }

    /// Number of resources declared so far
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Freeze the context into a template
    ///
    /// Accumulated ingress grants are folded into their target
    /// resource's properties here, once all stacks have contributed.
    pub fn synth(mut self) -> Template {
        for (logical_id, resource) in &mut self.resources {
            let Some(rules) = self.ingress.remove(logical_id) else {
                continue;
            };
            if let Some(object) = resource.properties_mut().as_object_mut() {
                object.insert(
                    "ingress".to_string(),
                    serde_json::to_value(&rules).unwrap_or_default(),
                );
            }
        }

        Template::new(self.app_name, self.resources, self.outputs)
    }
}
