//! Configuration loading for limiters.
//!
//! A limiter is described in YAML:
//!
//! ```yaml
//! enabled: true
//! limit: 100
//! window: 1s
//! ```
//!
//! `window` accepts any [`humantime`] duration (`250ms`, `1m 30s`, ...). Setting
//! `enabled: false` builds a [`NullLimiter`] so limiting can be switched off
//! administratively.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::ConfigError;
use crate::FixedWindowConfig;
use crate::FixedWindowLimiter;
use crate::NullLimiter;
use crate::RateLimiter;

/// Description of a limiter, as loaded from configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LimiterConfig {
    /// When `false`, [`LimiterConfig::build`] returns a [`NullLimiter`].
    pub enabled: bool,
    /// Maximum admissions per window.
    pub limit: usize,
    /// Length of one window.
    pub window: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLimiterConfig {
    #[serde(default = "default_enabled")]
    enabled: bool,
    limit: usize,
    window: String,
}

fn default_enabled() -> bool {
    true
}

impl TryFrom<RawLimiterConfig> for LimiterConfig {
    type Error = ConfigError;

    fn try_from(raw: RawLimiterConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            enabled: raw.enabled,
            limit: raw.limit,
            window: humantime::parse_duration(raw.window.trim())?,
        })
    }
}

impl LimiterConfig {
    /// Parse a configuration from YAML text.
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let raw: RawLimiterConfig = serde_yaml::from_str(contents)?;
        raw.try_into()
    }

    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// The fixed window parameters of this configuration.
    pub fn fixed_window(&self) -> FixedWindowConfig {
        FixedWindowConfig::new(self.limit, self.window)
    }

    /// Build the limiter this configuration describes.
    pub fn build(&self) -> Arc<dyn RateLimiter> {
        if self.enabled {
            debug!(limit = self.limit, window = ?self.window, "building fixed window limiter");
            Arc::new(FixedWindowLimiter::new(self.fixed_window()))
        } else {
            debug!("limiting disabled, building null limiter");
            Arc::new(NullLimiter)
        }
    }
}
