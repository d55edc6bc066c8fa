// Copyright (c) 2025 - Cowboy AI, Inc.
//! Health Check Value Object
//!
//! Invariant: the probe timeout must be strictly less than the probe
//! interval, otherwise checks would overlap. Violations are construction
//! errors, so an invalid health check can never reach synthesis.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Health check validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HealthCheckError {
    #[error("Timeout {timeout:?} must be strictly less than interval {interval:?}")]
    TimeoutNotBelowInterval { timeout: Duration, interval: Duration },

    #[error("Health check path must start with '/': {0}")]
    InvalidPath(String),
}

/// Per-target-group health probe configuration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HealthCheck {
    interval: Duration,
    timeout: Duration,
    path: String,
}

impl HealthCheck {
    /// Create a health check; fails unless `timeout < interval`
    pub fn new(
        interval: Duration,
        timeout: Duration,
        path: impl Into<String>,
    ) -> Result<Self, HealthCheckError> {
        let path = path.into();

        if timeout >= interval {
            return Err(HealthCheckError::TimeoutNotBelowInterval { timeout, interval });
        }
        if !path.starts_with('/') {
            return Err(HealthCheckError::InvalidPath(path));
        }

        Ok(Self {
            interval,
            timeout,
            path,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn accepts_timeout_below_interval() {
        let check = HealthCheck::new(
            Duration::from_secs(60),
            Duration::from_secs(5),
            "/health",
        )
        .unwrap();
        assert_eq!(check.interval(), Duration::from_secs(60));
        assert_eq!(check.timeout(), Duration::from_secs(5));
        assert_eq!(check.path(), "/health");
    }

    #[test_case(30, 30 ; "timeout equal to interval")]
    #[test_case(30, 31 ; "timeout above interval")]
    fn rejects_timeout_at_or_above_interval(interval_secs: u64, timeout_secs: u64) {
        let result = HealthCheck::new(
            Duration::from_secs(interval_secs),
            Duration::from_secs(timeout_secs),
            "/health",
        );
        assert!(matches!(
            result,
            Err(HealthCheckError::TimeoutNotBelowInterval { .. })
        ));
    }

    #[test]
    fn rejects_relative_path() {
        let result = HealthCheck::new(
            Duration::from_secs(60),
            Duration::from_secs(5),
            "health",
        );
        assert_eq!(
            result,
            Err(HealthCheckError::InvalidPath("health".to_string()))
        );
    }
}
