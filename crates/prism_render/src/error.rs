//! # Render Error Types
//!
//! The queue and façade deliberately have no error taxonomy: work items
//! cannot fail to enqueue, pool exhaustion triggers a refill rather than an
//! error, and threading-contract misuse is a debug assertion. What remains
//! fallible is configuration loading.

use thiserror::Error;

/// Errors loading or validating a [`RenderConfig`](crate::RenderConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML for the expected schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field value is outside its allowed range.
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// The offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
