//! Caucus configuration

use crate::error::CaucusResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Caucus configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaucusConfig {
    /// Delay before the single-shot startup refresh, in milliseconds
    pub kick_delay_ms: u64,
    /// Catch and log observer panics instead of unwinding through dispatch
    pub isolate_observer_panics: bool,
    /// Skip (and log) entries that fail to resurrect in the change handler
    pub isolate_entry_failures: bool,
}

impl CaucusConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from TOML; missing fields take defaults
    ///
    /// # Errors
    /// Returns error if `text` is not valid TOML for this shape
    pub fn from_toml_str(text: &str) -> CaucusResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// With kick delay
    #[inline]
    #[must_use]
    pub fn with_kick_delay(mut self, delay: Duration) -> Self {
        self.kick_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With observer panic isolation
    #[inline]
    #[must_use]
    pub fn with_observer_isolation(mut self, isolate: bool) -> Self {
        self.isolate_observer_panics = isolate;
        self
    }

    /// With per-entry failure isolation
    #[inline]
    #[must_use]
    pub fn with_entry_isolation(mut self, isolate: bool) -> Self {
        self.isolate_entry_failures = isolate;
        self
    }

    /// Kick delay as a [`Duration`]
    #[inline]
    #[must_use]
    pub fn kick_delay(&self) -> Duration {
        Duration::from_millis(self.kick_delay_ms)
    }
}

impl Default for CaucusConfig {
    fn default() -> Self {
        Self {
            kick_delay_ms: 250,
            isolate_observer_panics: true,
            isolate_entry_failures: true,
        }
    }
}
