// Copyright (c) 2025 - Cowboy AI, Inc.
//! Compute Value Objects
//!
//! Building blocks for the compute stack: instance sizing, container
//! image references, order-preserving startup scripts, port mappings,
//! and environment values that may defer to a secret at deploy time.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::handles::SecretValue;
use super::ingress::{Port, Protocol};

/// Compute value-object validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ComputeError {
    #[error("Instance type cannot be empty")]
    EmptyInstanceType,

    #[error("Container image name cannot be empty")]
    EmptyImageName,

    #[error("Container image tag cannot be empty")]
    EmptyImageTag,

    #[error("Key pair name cannot be empty")]
    EmptyKeyPairName,
}

/// Virtual machine sizing class, e.g. `t3.nano`
///
/// Not validated against any provider catalog; an unknown type is a
/// deploy-time provider error, not a composition error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceType(String);

impl InstanceType {
    pub fn new(value: impl Into<String>) -> Result<Self, ComputeError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ComputeError::EmptyInstanceType);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Container image reference by name and tag
///
/// The registry is an opaque external collaborator; existence of the
/// image is not checked at composition time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRef {
    name: String,
    tag: String,
}

impl ImageRef {
    pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Result<Self, ComputeError> {
        let name = name.into();
        let tag = tag.into();
        if name.trim().is_empty() {
            return Err(ComputeError::EmptyImageName);
        }
        if tag.trim().is_empty() {
            return Err(ComputeError::EmptyImageTag);
        }
        Ok(Self { name, tag })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.tag)
    }
}

/// Order-preserving instance startup script
///
/// Commands run exactly once per instance boot, in the order added.
/// Rendering prepends a strict shell prologue so a failing command
/// aborts the boot sequence instead of leaving it half-applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StartupScript {
    commands: Vec<String>,
}

impl StartupScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command; order is preserved verbatim
    pub fn add_command(&mut self, command: impl Into<String>) -> &mut Self {
        self.commands.push(command.into());
        self
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Render as a shell script for cloud-init style execution
    pub fn render(&self) -> String {
        let mut script = String::from("#!/bin/bash\nset -euo pipefail\n");
        for command in &self.commands {
            script.push_str(command);
            script.push('\n');
        }
        script
    }
}

/// Container port exposed on the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PortMapping {
    pub container_port: Port,
    pub host_port: Port,
    pub protocol: Protocol,
}

impl PortMapping {
    pub fn tcp(container_port: Port, host_port: Port) -> Self {
        Self {
            container_port,
            host_port,
            protocol: Protocol::Tcp,
        }
    }
}

/// A container environment value
///
/// Either a literal known at composition time, or a deferred secret
/// field resolved by the deploy engine. Credentials must always use the
/// deferred form; there is no way to turn a [`SecretValue`] into a
/// literal here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Literal(String),
    FromSecret(SecretValue),
}

impl EnvValue {
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, EnvValue::FromSecret(_))
    }
}

impl From<SecretValue> for EnvValue {
    fn from(value: SecretValue) -> Self {
        Self::FromSecret(value)
    }
}

/// Name of an externally managed instance-login key pair
///
/// Always an external configuration input; never hard-code one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyPairRef(String);

impl KeyPairRef {
    pub fn new(name: impl Into<String>) -> Result<Self, ComputeError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ComputeError::EmptyKeyPairName);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::handles::{SecretField, SecretRef};

    #[test]
    fn image_ref_display() {
        let image = ImageRef::new("sonarqube", "8.9.8-community").unwrap();
        assert_eq!(image.to_string(), "sonarqube:8.9.8-community");
    }

    #[test]
    fn image_ref_requires_name_and_tag() {
        assert_eq!(ImageRef::new("", "latest"), Err(ComputeError::EmptyImageName));
        assert_eq!(ImageRef::new("app", " "), Err(ComputeError::EmptyImageTag));
    }

    #[test]
    fn startup_script_preserves_order() {
        let mut script = StartupScript::new();
        script
            .add_command("dnf install -y httpd")
            .add_command("echo ok > /var/www/html/health")
            .add_command("systemctl enable --now httpd");

        assert_eq!(
            script.commands(),
            &[
                "dnf install -y httpd",
                "echo ok > /var/www/html/health",
                "systemctl enable --now httpd",
            ]
        );

        let rendered = script.render();
        let install = rendered.find("dnf install").unwrap();
        let payload = rendered.find("echo ok").unwrap();
        let enable = rendered.find("systemctl enable").unwrap();
        assert!(install < payload && payload < enable);
        assert!(rendered.starts_with("#!/bin/bash\nset -euo pipefail\n"));
    }

    #[test]
    fn env_value_literal_serializes_as_string() {
        let value = EnvValue::literal("jdbc:postgresql://db/mpb");
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json, serde_json::json!("jdbc:postgresql://db/mpb"));
        assert!(!value.is_deferred());
    }

    #[test]
    fn env_value_from_secret_stays_deferred() {
        let secret = SecretRef::new("data/db/secret");
        let value: EnvValue = secret.field(SecretField::Password).into();
        assert!(value.is_deferred());

        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "resolve": { "secret": "data/db/secret", "field": "password" }
            })
        );
    }
}
