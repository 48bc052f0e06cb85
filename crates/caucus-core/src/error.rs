//! Error types for Caucus operations
//!
//! Provides error handling for:
//! - Point lookups on absent keys
//! - Registry failures (unknown type names, malformed envelopes, type mismatches)
//! - Use after disconnect
//! - Configuration parsing

use caucus_stream::RegistryError;

/// Main Caucus error type
#[derive(Debug, thiserror::Error)]
pub enum CaucusError {
    /// Key is not present in the shared map
    #[error("key not found: '{key}'")]
    NotFound {
        /// Missing key
        key: String,
    },

    /// Flatten or resurrect failed
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Caucus was disconnected from its shared map
    #[error("caucus is disconnected from its shared map")]
    Disconnected,

    /// Timer requested outside a tokio runtime
    #[error("no tokio runtime available for the startup kick")]
    NoRuntime,

    /// Configuration could not be parsed
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),
}

impl CaucusError {
    /// Create not-found error for key
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Check if error is a missing key
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type alias for Caucus operations
pub type CaucusResult<T> = Result<T, CaucusError>;
