//! Application configuration structures
//!
//! Loaded by `shomer-infra` from environment variables or config files.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ITEM_DELAY_MS, DEFAULT_PLATFORM_TIMEOUT_SECS, DEFAULT_SWEEP_CRON,
    DEFAULT_TOKEN_REFRESH_BUFFER_SECS,
};

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLCipher database file
    pub path: String,
    /// Connection pool size
    pub pool_size: u32,
    /// SQLCipher encryption key
    pub encryption_key: Option<String>,
    /// 64-hex-char key used to encrypt platform tokens at rest
    pub token_cipher_key: Option<String>,
}

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Cron expression for the weekly recompute sweep
    pub sweep_cron: String,
    /// Whether automatic scheduling is enabled at all
    pub enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { sweep_cron: DEFAULT_SWEEP_CRON.to_string(), enabled: true }
    }
}

/// Visibility executor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Delay between consecutive item mutations on one platform (ms)
    pub item_delay_ms: u64,
    /// Upper bound for a single platform's pass (seconds)
    pub platform_timeout_secs: u64,
    /// Tokens expiring within this window are refreshed before use (seconds)
    pub token_refresh_buffer_secs: i64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            item_delay_ms: DEFAULT_ITEM_DELAY_MS,
            platform_timeout_secs: DEFAULT_PLATFORM_TIMEOUT_SECS,
            token_refresh_buffer_secs: DEFAULT_TOKEN_REFRESH_BUFFER_SECS,
        }
    }
}
