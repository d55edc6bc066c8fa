// Copyright (c) 2025 - Cowboy AI, Inc.
//! Ingress Rule Value Objects
//!
//! An ingress rule grants a peer access to a port on a resource. Grants
//! are additive and idempotent: the composition context de-duplicates
//! rules by identity, so granting the same rule twice declares it once.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

use super::handles::SecurityGroupRef;

/// Ingress validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IngressError {
    #[error("Port 0 is not a valid port")]
    ZeroPort,
}

/// TCP/UDP port number value object (1-65535)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Port(u16);

impl Port {
    pub fn new(value: u16) -> Result<Self, IngressError> {
        if value == 0 {
            return Err(IngressError::ZeroPort);
        }
        Ok(Self(value))
    }

    /// Construct a port known at compile time to be non-zero
    pub(crate) const fn known(value: u16) -> Self {
        Self(value)
    }

    pub fn get(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transport protocol of an ingress rule or port mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
            Protocol::Udp => write!(f, "udp"),
        }
    }
}

/// Source of permitted traffic
///
/// Serialized by hand: a group peer renders as a logical-id reference,
/// not as the full handle. Rules are write-only template data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IngressPeer {
    /// Traffic originating from members of a security group
    Group(SecurityGroupRef),
    /// Traffic from any IPv4 address
    AnyIpv4,
}

impl Serialize for IngressPeer {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            IngressPeer::Group(group) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("security-group", group.logical_id())?;
                map.end()
            }
            IngressPeer::AnyIpv4 => serializer.serialize_str("any-ipv4"),
        }
    }
}

impl fmt::Display for IngressPeer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngressPeer::Group(group) => write!(f, "group {}", group.name()),
            IngressPeer::AnyIpv4 => write!(f, "any-ipv4"),
        }
    }
}

/// A single ingress grant: peer, port, protocol, description
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct IngressRule {
    peer: IngressPeer,
    port: Port,
    protocol: Protocol,
    description: String,
}

impl IngressRule {
    pub fn tcp(peer: IngressPeer, port: Port, description: impl Into<String>) -> Self {
        Self {
            peer,
            port,
            protocol: Protocol::Tcp,
            description: description.into(),
        }
    }

    pub fn new(
        peer: IngressPeer,
        port: Port,
        protocol: Protocol,
        description: impl Into<String>,
    ) -> Self {
        Self {
            peer,
            port,
            protocol,
            description: description.into(),
        }
    }

    pub fn peer(&self) -> &IngressPeer {
        &self.peer
    }

    pub fn port(&self) -> Port {
        self.port
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_port_zero() {
        assert_eq!(Port::new(0), Err(IngressError::ZeroPort));
        assert!(Port::new(1).is_ok());
        assert!(Port::new(65535).is_ok());
    }

    #[test]
    fn any_ipv4_peer_serializes_as_string() {
        let json = serde_json::to_value(IngressPeer::AnyIpv4).unwrap();
        assert_eq!(json, serde_json::json!("any-ipv4"));
    }

    #[test]
    fn rule_identity_includes_all_fields() {
        let a = IngressRule::tcp(IngressPeer::AnyIpv4, Port::known(22), "ssh");
        let b = IngressRule::tcp(IngressPeer::AnyIpv4, Port::known(22), "ssh");
        let c = IngressRule::tcp(IngressPeer::AnyIpv4, Port::known(22), "other");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
