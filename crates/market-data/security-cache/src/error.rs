//! Error types for the security cache

use thiserror::Error;

/// Security cache error types
#[derive(Debug, Error)]
pub enum CacheError {
    /// A required argument was missing or malformed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation is deliberately not offered by this layer; do not retry
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// The persistent registry failed
    #[error("Registry error: {0}")]
    Registry(#[source] anyhow::Error),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl CacheError {
    /// Whether this is the deliberate delete refusal
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }

    /// Whether this is an argument validation failure
    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

/// Result alias for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
