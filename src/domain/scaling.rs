// Copyright (c) 2025 - Cowboy AI, Inc.
//! Autoscaling Value Objects
//!
//! A scalable range bounds how far a service may grow or shrink.
//! Policies adjust capacity within that range, either on a time schedule
//! (cron-triggered capacity floor) or by tracking a utilization metric
//! with cooldown windows. Floors above the range maximum are rejected by
//! the compute stack at build time, because only it knows both.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Scaling validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScalingError {
    #[error("Empty scaling range: min {min} exceeds max {max}")]
    EmptyRange { min: u32, max: u32 },

    #[error("Invalid utilization target: {0}% (must be 1-100)")]
    InvalidTargetPercent(u8),

    #[error("Invalid cron schedule: hour {hour}, minute {minute}")]
    InvalidCron { hour: u8, minute: u8 },
}

/// Inclusive `[min, max]` task-count range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScalingRange {
    min: u32,
    max: u32,
}

impl ScalingRange {
    /// Create a range; fails if `min > max`
    pub fn new(min: u32, max: u32) -> Result<Self, ScalingError> {
        if min > max {
            return Err(ScalingError::EmptyRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn contains(&self, capacity: u32) -> bool {
        self.min <= capacity && capacity <= self.max
    }
}

impl fmt::Display for ScalingRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Daily cron trigger (hour and minute, UTC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cron {
    hour: u8,
    minute: u8,
}

impl Cron {
    pub fn daily(hour: u8, minute: u8) -> Result<Self, ScalingError> {
        if hour > 23 || minute > 59 {
            return Err(ScalingError::InvalidCron { hour, minute });
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }
}

/// A capacity adjustment rule attached to a scalable target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScalingPolicy {
    /// At the scheduled time, raise the capacity floor to `min_capacity`
    Scheduled { schedule: Cron, min_capacity: u32 },

    /// Track a target utilization percentage with cooldown windows
    TargetUtilization {
        target_percent: u8,
        scale_in_cooldown: Duration,
        scale_out_cooldown: Duration,
    },
}

impl ScalingPolicy {
    /// Cron-triggered capacity floor change
    pub fn scheduled(schedule: Cron, min_capacity: u32) -> Self {
        Self::Scheduled {
            schedule,
            min_capacity,
        }
    }

    /// Target-utilization rule; fails unless the target is 1-100%
    pub fn target_utilization(
        target_percent: u8,
        scale_in_cooldown: Duration,
        scale_out_cooldown: Duration,
    ) -> Result<Self, ScalingError> {
        if target_percent == 0 || target_percent > 100 {
            return Err(ScalingError::InvalidTargetPercent(target_percent));
        }
        Ok(Self::TargetUtilization {
            target_percent,
            scale_in_cooldown,
            scale_out_cooldown,
        })
    }

    /// The capacity floor this policy may impose, if any
    pub fn capacity_floor(&self) -> Option<u32> {
        match self {
            ScalingPolicy::Scheduled { min_capacity, .. } => Some(*min_capacity),
            ScalingPolicy::TargetUtilization { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn accepts_valid_range() {
        let range = ScalingRange::new(1, 3).unwrap();
        assert_eq!(range.min(), 1);
        assert_eq!(range.max(), 3);
        assert!(range.contains(2));
        assert!(!range.contains(4));
    }

    #[test]
    fn single_point_range_is_valid() {
        assert!(ScalingRange::new(2, 2).is_ok());
    }

    #[test]
    fn rejects_inverted_range() {
        assert_eq!(
            ScalingRange::new(3, 1),
            Err(ScalingError::EmptyRange { min: 3, max: 1 })
        );
    }

    #[test_case(24, 0)]
    #[test_case(0, 60)]
    fn rejects_out_of_range_cron(hour: u8, minute: u8) {
        assert_eq!(
            Cron::daily(hour, minute),
            Err(ScalingError::InvalidCron { hour, minute })
        );
    }

    #[test_case(0)]
    #[test_case(101)]
    fn rejects_bad_utilization_target(percent: u8) {
        let result = ScalingPolicy::target_utilization(
            percent,
            Duration::from_secs(60),
            Duration::from_secs(60),
        );
        assert_eq!(result, Err(ScalingError::InvalidTargetPercent(percent)));
    }

    #[test]
    fn scheduled_policy_exposes_its_floor() {
        let policy = ScalingPolicy::scheduled(Cron::daily(20, 0).unwrap(), 2);
        assert_eq!(policy.capacity_floor(), Some(2));

        let tracking = ScalingPolicy::target_utilization(
            50,
            Duration::from_secs(60),
            Duration::from_secs(60),
        )
        .unwrap();
        assert_eq!(tracking.capacity_floor(), None);
    }
}
