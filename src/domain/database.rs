// Copyright (c) 2025 - Cowboy AI, Inc.
//! Database Engine and Schema Name Value Objects

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::ingress::Port;

/// Database validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DatabaseError {
    #[error("Database name cannot be empty")]
    EmptyName,

    #[error("Database name must start with a letter: {0}")]
    InvalidStart(String),

    #[error("Invalid character in database name: {0}")]
    InvalidCharacter(char),

    #[error("Database name exceeds 63 characters: {0}")]
    NameTooLong(usize),

    #[error("Engine version cannot be empty")]
    EmptyVersion,
}

/// Managed relational cluster engine family and version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "family", content = "version")]
pub enum DatabaseEngine {
    AuroraPostgres(String),
    AuroraMysql(String),
}

impl DatabaseEngine {
    pub fn aurora_postgres(version: impl Into<String>) -> Result<Self, DatabaseError> {
        let version = version.into();
        if version.trim().is_empty() {
            return Err(DatabaseError::EmptyVersion);
        }
        Ok(Self::AuroraPostgres(version))
    }

    pub fn aurora_mysql(version: impl Into<String>) -> Result<Self, DatabaseError> {
        let version = version.into();
        if version.trim().is_empty() {
            return Err(DatabaseError::EmptyVersion);
        }
        Ok(Self::AuroraMysql(version))
    }

    /// The port the engine listens on unless overridden
    pub fn default_port(&self) -> Port {
        match self {
            DatabaseEngine::AuroraPostgres(_) => Port::known(5432),
            DatabaseEngine::AuroraMysql(_) => Port::known(3306),
        }
    }

    pub fn family(&self) -> &'static str {
        match self {
            DatabaseEngine::AuroraPostgres(_) => "aurora-postgres",
            DatabaseEngine::AuroraMysql(_) => "aurora-mysql",
        }
    }

    pub fn version(&self) -> &str {
        match self {
            DatabaseEngine::AuroraPostgres(v) | DatabaseEngine::AuroraMysql(v) => v,
        }
    }
}

impl fmt::Display for DatabaseEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.family(), self.version())
    }
}

/// Default schema name created with the cluster
///
/// Invariants: non-empty, starts with a letter, alphanumeric or
/// underscore throughout, at most 63 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatabaseName(String);

impl DatabaseName {
    pub const MAX_LENGTH: usize = 63;

    pub fn new(name: impl Into<String>) -> Result<Self, DatabaseError> {
        let name = name.into();

        if name.is_empty() {
            return Err(DatabaseError::EmptyName);
        }
        if name.len() > Self::MAX_LENGTH {
            return Err(DatabaseError::NameTooLong(name.len()));
        }

        let mut chars = name.chars();
        let first = chars.next().unwrap_or('_');
        if !first.is_ascii_alphabetic() {
            return Err(DatabaseError::InvalidStart(name));
        }
        for c in chars {
            if !c.is_ascii_alphanumeric() && c != '_' {
                return Err(DatabaseError::InvalidCharacter(c));
            }
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatabaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
