// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Run configuration.
//!
//! [`Config`] is built once from the command line and handed to the
//! dispatcher and the aggregator. It is never mutated afterwards.

use std::time::Duration;

use crate::error::ConfigError;
use crate::ssh::known_hosts::StrictHostKeyChecking;

pub const DEFAULT_MAX_FLIGHT: usize = 50;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_GLOBAL_TIMEOUT_SECS: u64 = 600;

/// How results are grouped in the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupingMode {
    /// One group per endpoint identity
    #[default]
    PerHost,
    /// One group per distinct result body
    Collapse,
}

#[derive(Debug, Clone)]
pub struct Config {
    max_flight: usize,
    job_timeout: Option<Duration>,
    global_timeout: Option<Duration>,
    grouping: GroupingMode,
    host_key_checking: StrictHostKeyChecking,
}

impl Config {
    /// Create a configuration with the given concurrency cap and default timeouts.
    pub fn new(max_flight: usize) -> Result<Self, ConfigError> {
        if max_flight == 0 {
            return Err(ConfigError::InvalidMaxFlight);
        }
        Ok(Self {
            max_flight,
            ..Self::default()
        })
    }

    /// Per-job timeout in seconds covering connect and execute; 0 disables it.
    pub fn with_job_timeout_secs(mut self, secs: u64) -> Self {
        self.job_timeout = timeout_from_secs(secs);
        self
    }

    /// Whole-run timeout in seconds; 0 disables it.
    pub fn with_global_timeout_secs(mut self, secs: u64) -> Self {
        self.global_timeout = timeout_from_secs(secs);
        self
    }

    pub fn with_job_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.job_timeout = timeout;
        self
    }

    pub fn with_global_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.global_timeout = timeout;
        self
    }

    pub fn with_grouping(mut self, grouping: GroupingMode) -> Self {
        self.grouping = grouping;
        self
    }

    pub fn with_host_key_checking(mut self, mode: StrictHostKeyChecking) -> Self {
        self.host_key_checking = mode;
        self
    }

    pub fn max_flight(&self) -> usize {
        self.max_flight
    }

    pub fn job_timeout(&self) -> Option<Duration> {
        self.job_timeout
    }

    pub fn global_timeout(&self) -> Option<Duration> {
        self.global_timeout
    }

    pub fn grouping(&self) -> GroupingMode {
        self.grouping
    }

    pub fn host_key_checking(&self) -> StrictHostKeyChecking {
        self.host_key_checking
    }

    /// Number of workers to spawn for `endpoints` jobs: never more than there is work for.
    pub fn worker_count(&self, endpoints: usize) -> usize {
        self.max_flight.min(endpoints)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_flight: DEFAULT_MAX_FLIGHT,
            job_timeout: timeout_from_secs(DEFAULT_TIMEOUT_SECS),
            global_timeout: timeout_from_secs(DEFAULT_GLOBAL_TIMEOUT_SECS),
            grouping: GroupingMode::default(),
            host_key_checking: StrictHostKeyChecking::default(),
        }
    }
}

/// Seconds to an optional deadline, where 0 means unlimited.
pub fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_flight(), 50);
        assert_eq!(config.job_timeout(), Some(Duration::from_secs(60)));
        assert_eq!(config.global_timeout(), Some(Duration::from_secs(600)));
        assert_eq!(config.grouping(), GroupingMode::PerHost);
        assert_eq!(config.host_key_checking(), StrictHostKeyChecking::No);
    }

    #[test]
    fn test_zero_max_flight_rejected() {
        assert!(matches!(
            Config::new(0),
            Err(ConfigError::InvalidMaxFlight)
        ));
    }

    #[test]
    fn test_zero_timeout_is_unlimited() {
        let config = Config::new(4)
            .unwrap()
            .with_job_timeout_secs(0)
            .with_global_timeout_secs(0);
        assert_eq!(config.job_timeout(), None);
        assert_eq!(config.global_timeout(), None);
    }

    #[test]
    fn test_worker_count_is_min_of_cap_and_endpoints() {
        let config = Config::new(50).unwrap();
        assert_eq!(config.worker_count(3), 3);
        assert_eq!(config.worker_count(0), 0);

        let config = Config::new(1).unwrap();
        assert_eq!(config.worker_count(5), 1);
    }
}
