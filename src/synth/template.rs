// Copyright (c) 2025 - Cowboy AI, Inc.
//! Synthesized Template
//!
//! The one-shot product of composition: an ordered map of declared
//! resources plus named outputs, rendered to JSON (or YAML behind the
//! `yaml` feature). The template is a declarative artifact for an
//! external deploy step; nothing here executes.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::AttrRef;
use crate::synth::resource::{Resource, ResourceKind};

/// Format tag written into every template
pub const FORMAT_VERSION: &str = "cim-stacks/1";

/// A named output value: either deferred or literal
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutputValue {
    Attr(AttrRef),
    Literal(String),
}

impl OutputValue {
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }
}

impl From<AttrRef> for OutputValue {
    fn from(attr: AttrRef) -> Self {
        Self::Attr(attr)
    }
}

/// The declarative resource template produced by [`synth`](crate::Composition::synth)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Template {
    format_version: &'static str,
    app: String,
    resources: BTreeMap<String, Resource>,
    outputs: BTreeMap<String, OutputValue>,
}

impl Template {
    pub(crate) fn new(
        app: String,
        resources: Vec<(String, Resource)>,
        outputs: Vec<(String, OutputValue)>,
    ) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            app,
            resources: resources.into_iter().collect(),
            outputs: outputs.into_iter().collect(),
        }
    }

    pub fn app(&self) -> &str {
        &self.app
    }

    pub fn resources(&self) -> &BTreeMap<String, Resource> {
        &self.resources
    }

    /// Look up one resource by its logical id
    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.resources.get(logical_id)
    }

    /// All resources of the given kind, in logical-id order
    pub fn resources_of_kind(
        &self,
        kind: ResourceKind,
    ) -> impl Iterator<Item = (&str, &Resource)> {
        self.resources
            .iter()
            .filter(move |(_, r)| r.kind() == kind)
            .map(|(id, r)| (id.as_str(), r))
    }

    pub fn outputs(&self) -> &BTreeMap<String, OutputValue> {
        &self.outputs
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "yaml")]
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Template {
        Template::new(
            "app".to_string(),
            vec![
                (
                    "network/Vpc".to_string(),
                    Resource::new(ResourceKind::Vpc, json!({"address-block": "10.10.0.0/16"})),
                ),
                (
                    "network/subnet/Public-az1".to_string(),
                    Resource::new(ResourceKind::Subnet, json!({"tier": "Public"})),
                ),
            ],
            vec![("dns".to_string(), OutputValue::literal("lb.example"))],
        )
    }

    #[test]
    fn lookup_and_kind_filter() {
        let template = sample();
        assert!(template.resource("network/Vpc").is_some());
        assert!(template.resource("missing").is_none());
        assert_eq!(template.resources_of_kind(ResourceKind::Subnet).count(), 1);
        assert_eq!(template.resources_of_kind(ResourceKind::Service).count(), 0);
    }

    #[test]
    fn renders_versioned_json() {
        let template = sample();
        let value: serde_json::Value =
            serde_json::from_str(&template.to_json().unwrap()).unwrap();
        assert_eq!(value["format-version"], json!(FORMAT_VERSION));
        assert_eq!(value["app"], json!("app"));
        assert_eq!(value["outputs"]["dns"], json!("lb.example"));
        assert_eq!(
            value["resources"]["network/Vpc"]["kind"],
            json!("Network::Vpc")
        );
    }
}
