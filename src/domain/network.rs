// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects with Validation Invariants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("Invalid IPv4 address: {0}")]
    InvalidAddress(String),

    #[error("Invalid prefix length: {0} (must be 0-32)")]
    InvalidPrefixLength(u8),

    #[error("Host bits set in address block: {0}")]
    HostBitsSet(String),

    #[error("Subnet tier name cannot be empty")]
    EmptyTierName,
}

/// IPv4 address block in CIDR notation value object
///
/// Invariants:
/// - Prefix length 0-32
/// - All host bits zero (the block denotes a network, not a host)
///
/// # Examples
///
/// ```rust
/// use cim_stacks::domain::CidrBlock;
///
/// let block = CidrBlock::new("10.10.0.0/16").unwrap();
/// assert_eq!(block.prefix_length(), 16);
///
/// assert!(CidrBlock::new("10.10.0.1/16").is_err()); // host bits set
/// assert!(CidrBlock::new("10.10.0.0/33").is_err()); // bad prefix
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CidrBlock {
    address: Ipv4Addr,
    prefix_length: u8,
}

impl CidrBlock {
    /// Parse an address block from `a.b.c.d/len` notation
    pub fn new(cidr: impl AsRef<str>) -> Result<Self, NetworkError> {
        let cidr = cidr.as_ref();

        let (addr_str, prefix_str) = cidr
            .split_once('/')
            .ok_or_else(|| NetworkError::InvalidCidr(cidr.to_string()))?;

        let address = Ipv4Addr::from_str(addr_str)
            .map_err(|_| NetworkError::InvalidAddress(addr_str.to_string()))?;

        let prefix_length = prefix_str
            .parse::<u8>()
            .map_err(|_| NetworkError::InvalidCidr(cidr.to_string()))?;

        Self::from_parts(address, prefix_length)
    }

    /// Create from separate address and prefix
    pub fn from_parts(address: Ipv4Addr, prefix_length: u8) -> Result<Self, NetworkError> {
        if prefix_length > 32 {
            return Err(NetworkError::InvalidPrefixLength(prefix_length));
        }

        // Invariant: host portion must be zero
        let host_mask = if prefix_length == 32 {
            0
        } else {
            u32::MAX >> prefix_length
        };
        if u32::from(address) & host_mask != 0 {
            return Err(NetworkError::HostBitsSet(format!(
                "{address}/{prefix_length}"
            )));
        }

        Ok(Self {
            address,
            prefix_length,
        })
    }

    /// Get the network address
    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    /// Get the prefix length
    pub fn prefix_length(&self) -> u8 {
        self.prefix_length
    }
}

impl fmt::Display for CidrBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_length)
    }
}

impl FromStr for CidrBlock {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Routing policy category of a subnet tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TierKind {
    /// Routable from the internet
    Public,
    /// Egress to the internet through NAT, no inbound routing
    PrivateNat,
    /// No internet routing in either direction
    Isolated,
}

impl fmt::Display for TierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TierKind::Public => write!(f, "public"),
            TierKind::PrivateNat => write!(f, "private-nat"),
            TierKind::Isolated => write!(f, "isolated"),
        }
    }
}

/// A named category of network segments sharing routing policy
///
/// The network stack creates one subnet per (availability zone, tier)
/// pair. Tier names are unique within a network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubnetTier {
    name: String,
    kind: TierKind,
    prefix_length: u8,
}

impl SubnetTier {
    /// Create a subnet tier with a non-empty name and a valid prefix
    pub fn new(
        name: impl Into<String>,
        kind: TierKind,
        prefix_length: u8,
    ) -> Result<Self, NetworkError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(NetworkError::EmptyTierName);
        }
        if prefix_length > 32 {
            return Err(NetworkError::InvalidPrefixLength(prefix_length));
        }

        Ok(Self {
            name,
            kind,
            prefix_length,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TierKind {
        self.kind
    }

    pub fn prefix_length(&self) -> u8 {
        self.prefix_length
    }
}
