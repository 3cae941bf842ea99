use crate::core::models::mapping::AtomMapping;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_CANDIDATES: usize = 10;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Which ring changes a merge may introduce.
///
/// Both flags default to `false`: a mapping that opens, closes or resizes a
/// ring is rejected unless explicitly allowed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct MergePolicy {
    pub allow_ring_breaking: bool,
    pub allow_ring_size_change: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MappingConfig {
    /// A user-supplied CSV mapping; when present the search is skipped.
    pub mapping_file: Option<PathBuf>,
    pub prematch: AtomMapping,
    pub timeout: Duration,
    pub max_candidates: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeConfig {
    pub mapping: MappingConfig,
    pub policy: MergePolicy,
    /// Index of the perturbed molecule in the lambda=0 system.
    pub molecule0: usize,
    /// Index of the perturbed molecule in the lambda=1 system.
    pub molecule1: usize,
}

#[derive(Default)]
pub struct MergeConfigBuilder {
    mapping_file: Option<PathBuf>,
    prematch: Option<AtomMapping>,
    timeout: Option<Duration>,
    max_candidates: Option<usize>,
    policy: Option<MergePolicy>,
    molecule0: Option<usize>,
    molecule1: Option<usize>,
}

impl MergeConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mapping_file(mut self, path: PathBuf) -> Self {
        self.mapping_file = Some(path);
        self
    }
    pub fn prematch(mut self, prematch: AtomMapping) -> Self {
        self.prematch = Some(prematch);
        self
    }
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
    pub fn max_candidates(mut self, n: usize) -> Self {
        self.max_candidates = Some(n);
        self
    }
    pub fn policy(mut self, policy: MergePolicy) -> Self {
        self.policy = Some(policy);
        self
    }
    pub fn molecule0(mut self, index: usize) -> Self {
        self.molecule0 = Some(index);
        self
    }
    pub fn molecule1(mut self, index: usize) -> Self {
        self.molecule1 = Some(index);
        self
    }

    pub fn build(self) -> Result<MergeConfig, ConfigError> {
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        if timeout.is_zero() {
            return Err(ConfigError::InvalidParameter {
                name: "timeout",
                reason: "must be greater than zero".to_string(),
            });
        }
        let max_candidates = self.max_candidates.unwrap_or(DEFAULT_MAX_CANDIDATES);
        if max_candidates == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "max_candidates",
                reason: "at least one candidate must be requested".to_string(),
            });
        }

        Ok(MergeConfig {
            mapping: MappingConfig {
                mapping_file: self.mapping_file,
                prematch: self.prematch.unwrap_or_default(),
                timeout,
                max_candidates,
            },
            policy: self.policy.unwrap_or_default(),
            molecule0: self.molecule0.unwrap_or(0),
            molecule1: self.molecule1.unwrap_or(0),
        })
    }
}
