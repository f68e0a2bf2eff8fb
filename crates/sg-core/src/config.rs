//! Run configuration.
//!
//! Controls the seed, the step cap applied by drive loops, and an optional
//! wall-clock timeout for the whole run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default cap on steps taken by one drive loop.
pub const STEPS_MAX_DEFAULT: u64 = 10_000_000;

/// Configuration for driving a generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenConfig {
    /// Seed for all randomized combinators (if None, uses `SG_SEED` or a
    /// random seed)
    pub seed: Option<u64>,
    /// Maximum `next` calls a drive loop makes before giving up
    pub steps_max: u64,
    /// Wall-clock budget for the run, applied as a context deadline
    pub timeout: Option<Duration>,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            seed: None,
            steps_max: STEPS_MAX_DEFAULT,
            timeout: None,
        }
    }
}

impl GenConfig {
    /// Small budget for quick iteration.
    #[must_use]
    pub fn fast() -> Self {
        Self {
            steps_max: 10_000,
            timeout: Some(Duration::from_secs(5)),
            ..Default::default()
        }
    }

    /// Large budget for long soak runs.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            steps_max: 1_000_000_000,
            timeout: Some(Duration::from_secs(3600)),
            ..Default::default()
        }
    }

    /// Fixed-seed variant of this config.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check the configuration for values that can never work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.seed == Some(0) {
            return Err(ConfigError::ZeroSeed);
        }
        if self.steps_max == 0 {
            return Err(ConfigError::ZeroStepsMax);
        }
        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}
