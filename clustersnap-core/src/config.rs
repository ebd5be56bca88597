//! Runner configuration.

use crate::{Result, error::GatherError};
use std::time::Duration;

/// Configuration for one gather run.
///
/// Controls which units run, how many run at once, and how long each one
/// may spend on remote calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Maximum number of units running concurrently.
    ///
    /// Default: 4
    pub max_concurrency: usize,

    /// Deadline applied to each unit's context.
    ///
    /// Default: 60 seconds
    pub unit_timeout: Duration,

    /// Unit ids to skip.
    ///
    /// An entry matches a unit id exactly, or every id below it when it is a
    /// prefix up to a `/` (`clusterconfig` disables `clusterconfig/proxy`).
    pub disabled: Vec<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            unit_timeout: Duration::from_secs(60),
            disabled: Vec::new(),
        }
    }
}

impl RunnerConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum concurrency.
    #[must_use]
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Sets the per-unit deadline.
    #[must_use]
    pub fn with_unit_timeout(mut self, unit_timeout: Duration) -> Self {
        self.unit_timeout = unit_timeout;
        self
    }

    /// Sets the unit ids to skip.
    #[must_use]
    pub fn with_disabled(mut self, disabled: Vec<String>) -> Self {
        self.disabled = disabled;
        self
    }

    /// Returns true unless `id` is disabled.
    pub fn is_enabled(&self, id: &str) -> bool {
        !self.disabled.iter().any(|entry| {
            let entry = entry.trim_end_matches('/');
            id == entry
                || id
                    .strip_prefix(entry)
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns a configuration error for zero concurrency, a zero timeout,
    /// or an empty disabled entry.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            return Err(GatherError::configuration(
                "max_concurrency must be at least 1",
            ));
        }
        if self.unit_timeout.is_zero() {
            return Err(GatherError::configuration(
                "unit_timeout must be greater than zero",
            ));
        }
        if self.disabled.iter().any(|entry| entry.trim().is_empty()) {
            return Err(GatherError::configuration(
                "disabled gatherer ids must not be empty",
            ));
        }
        Ok(())
    }
}
