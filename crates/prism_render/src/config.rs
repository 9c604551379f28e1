//! # Render Server Configuration
//!
//! Two knobs, both read exactly once at construction:
//! - `create_thread`: dedicated render thread, or synchronous direct
//!   dispatch on the constructing thread. A construction-time choice,
//!   never a runtime fallback.
//! - `pool_prealloc`: batch size for handle-pool refills.
//!
//! Loaded from TOML once at startup; everything absent takes its default.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default handle-pool batch size.
pub const DEFAULT_POOL_PREALLOC: usize = 64;

/// Startup configuration for a [`RenderServer`](crate::RenderServer).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Spawn a dedicated render thread (`true`) or run every operation
    /// synchronously on the constructing thread (`false`).
    pub create_thread: bool,

    /// Number of handles created per pool-refill batch. Must be >= 1.
    pub pool_prealloc: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            create_thread: true,
            pool_prealloc: DEFAULT_POOL_PREALLOC,
        }
    }
}

impl RenderConfig {
    /// Creates the single-threaded configuration (no render thread).
    #[must_use]
    pub fn single_threaded() -> Self {
        Self {
            create_thread: false,
            ..Self::default()
        }
    }

    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::InvalidValue`] for out-of-range fields.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, plus the
    /// errors of [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Validates field ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if `pool_prealloc` is zero.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.pool_prealloc == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pool_prealloc",
                reason: "must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}
