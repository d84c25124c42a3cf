//! Security cache configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::CacheResult;

/// Default map pre-sizing
const DEFAULT_INITIAL_CAPACITY: usize = 1024;

/// Environment prefix for overrides (e.g. `SECURITY_CACHE__NOTIFY_ON_HYDRATION=false`)
const ENV_PREFIX: &str = "SECURITY_CACHE";

/// Security cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityCacheConfig {
    /// Fire "added" for every record inserted while hydrating at startup
    pub notify_on_hydration: bool,
    /// Initial capacity of the native-id map
    pub initial_capacity: usize,
    /// Persistent registry location
    pub registry: RegistryConfig,
}

impl Default for SecurityCacheConfig {
    fn default() -> Self {
        Self {
            notify_on_hydration: true,
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            registry: RegistryConfig::default(),
        }
    }
}

/// WAL registry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// WAL directory
    pub wal_dir: PathBuf,
    /// WAL segment size in MB
    pub segment_size_mb: Option<u64>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            wal_dir: PathBuf::from("./data/securities_wal"),
            segment_size_mb: Some(64),
        }
    }
}

impl SecurityCacheConfig {
    /// Load configuration from file with environment overrides
    ///
    /// # Errors
    ///
    /// Returns [`crate::CacheError::Config`] if the file is missing or malformed.
    pub fn from_file(path: &str) -> CacheResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
