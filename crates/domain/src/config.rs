//! Application configuration structures

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_SYNC_CRON, FEED_FETCH_TIMEOUT_SECS};

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub sync: SyncConfig,
}

/// Database connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: String,
    /// Connection pool size
    pub pool_size: u32,
}

/// Calendar sync settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Cron expression driving the fleet sync schedule
    pub cron_expression: String,
    /// Timeout applied to each external feed fetch, in seconds
    pub feed_timeout_secs: u64,
    /// Whether scheduled syncing is enabled
    pub enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig { path: "roost.db".into(), pool_size: 4 },
            sync: SyncConfig::default(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            cron_expression: DEFAULT_SYNC_CRON.into(),
            feed_timeout_secs: FEED_FETCH_TIMEOUT_SECS,
            enabled: true,
        }
    }
}
