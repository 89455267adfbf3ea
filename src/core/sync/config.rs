/*!
 * Handoff Configuration
 *
 * Backoff tuning for polling loops and strategy preference, loadable from
 * JSON or the `HANDOFF_CONFIG` environment variable.
 */

use super::traits::{HandoffKind, HandoffProfile};
use crate::core::errors::ConfigError;
use crate::core::limits::{
    CONFIG_ENV_VAR, DEFAULT_INITIAL_SLEEP, DEFAULT_MAX_SLEEP, DEFAULT_SPIN_LIMIT,
    DEFAULT_YIELD_LIMIT, LONG_WAIT_MAX_SLEEP, LOW_LATENCY_MAX_SLEEP, LOW_LATENCY_SPIN_LIMIT,
    LOW_LATENCY_YIELD_LIMIT,
};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMicroSeconds};
use std::env::VarError;
use std::time::Duration;
use tracing::{debug, warn};

/// Three-phase backoff tuning
///
/// Iterations below `spin_limit` only issue a spin hint, iterations below
/// `yield_limit` yield to the scheduler, and later iterations sleep starting
/// at `initial_sleep` and doubling up to `max_sleep`.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub spin_limit: u32,
    pub yield_limit: u32,
    #[serde_as(as = "DurationMicroSeconds<u64>")]
    pub initial_sleep: Duration,
    #[serde_as(as = "DurationMicroSeconds<u64>")]
    pub max_sleep: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            spin_limit: DEFAULT_SPIN_LIMIT,
            yield_limit: DEFAULT_YIELD_LIMIT,
            initial_sleep: DEFAULT_INITIAL_SLEEP,
            max_sleep: DEFAULT_MAX_SLEEP,
        }
    }
}

impl BackoffConfig {
    /// Configuration optimized for low-latency (< 1ms wait expected)
    pub const fn low_latency() -> Self {
        Self {
            spin_limit: LOW_LATENCY_SPIN_LIMIT,
            yield_limit: LOW_LATENCY_YIELD_LIMIT,
            initial_sleep: DEFAULT_INITIAL_SLEEP,
            max_sleep: LOW_LATENCY_MAX_SLEEP,
        }
    }

    /// Configuration optimized for long waits (> 1ms expected)
    pub const fn long_wait() -> Self {
        Self {
            spin_limit: 1,
            yield_limit: 10,
            initial_sleep: DEFAULT_INITIAL_SLEEP,
            max_sleep: LONG_WAIT_MAX_SLEEP,
        }
    }

    /// Same phases, different sleep cap
    pub const fn with_max_sleep(mut self, max_sleep: Duration) -> Self {
        self.max_sleep = max_sleep;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spin_limit > self.yield_limit {
            return Err(ConfigError::Invalid(format!(
                "spin_limit ({}) exceeds yield_limit ({})",
                self.spin_limit, self.yield_limit
            )));
        }
        if self.initial_sleep.is_zero() && !self.max_sleep.is_zero() {
            return Err(ConfigError::Invalid(
                "initial_sleep must be non-zero when max_sleep is non-zero".to_string(),
            ));
        }
        if self.max_sleep < self.initial_sleep {
            return Err(ConfigError::Invalid(format!(
                "max_sleep ({:?}) is below initial_sleep ({:?})",
                self.max_sleep, self.initial_sleep
            )));
        }
        Ok(())
    }
}

/// Handoff configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandoffConfig {
    /// Strategy to use regardless of profile, if set
    pub preferred: Option<HandoffKind>,
    /// Backoff used by atomic flag polling
    pub backoff: BackoffConfig,
}

impl HandoffConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.backoff.validate()?;
        Ok(config)
    }

    /// Load from `HANDOFF_CONFIG`, falling back to defaults when unset
    ///
    /// A variable that is set but invalid is an error, not a silent default.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(json) => {
                let config = Self::from_json(&json).inspect_err(|e| {
                    warn!(error = %e, var = CONFIG_ENV_VAR, "Rejected handoff configuration");
                })?;
                debug!(?config, "Loaded handoff configuration from environment");
                Ok(config)
            }
            Err(VarError::NotPresent) => Ok(Self::default()),
            Err(VarError::NotUnicode(_)) => Err(ConfigError::Malformed(format!(
                "{CONFIG_ENV_VAR} is not valid unicode"
            ))),
        }
    }

    /// Select a strategy for the profile, honoring an explicit preference
    pub fn select(&self, profile: &HandoffProfile) -> HandoffKind {
        match self.preferred {
            Some(kind) => kind,
            None => HandoffKind::recommend(profile),
        }
    }
}
