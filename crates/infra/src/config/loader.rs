//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `SHOMER_DB_PATH`: Database file path (required)
//! - `SHOMER_DB_POOL_SIZE`: Connection pool size (required)
//! - `SHOMER_DB_ENCRYPTION_KEY`: SQLCipher database key
//! - `SHOMER_TOKEN_CIPHER_KEY`: Hex key for token encryption at rest
//! - `SHOMER_SWEEP_CRON`: Cron expression for the weekly sweep
//! - `SHOMER_SCHEDULER_ENABLED`: Whether the scheduler runs (true/false)
//! - `SHOMER_ITEM_DELAY_MS`: Delay between item mutations
//! - `SHOMER_PLATFORM_TIMEOUT_SECS`: Per-platform pass timeout
//! - `SHOMER_TOKEN_REFRESH_BUFFER_SECS`: Token refresh window
//!
//! ## File Locations
//! The loader probes `config.{json,toml}` and `shomer.{json,toml}` in the
//! working directory, up to two parent directories, and next to the
//! executable.

use std::path::{Path, PathBuf};

use shomer_domain::{
    Config, DatabaseConfig, ExecutorConfig, Result, SchedulerConfig, ShomerError,
};

/// Load configuration with automatic fallback strategy.
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables.
///
/// # Errors
/// Returns `ShomerError::Config` if required variables are missing or have
/// invalid values.
pub fn load_from_env() -> Result<Config> {
    let db_path = env_var("SHOMER_DB_PATH")?;
    let db_pool_size = env_var("SHOMER_DB_POOL_SIZE").and_then(|s| {
        s.parse::<u32>().map_err(|e| ShomerError::Config(format!("invalid pool size: {e}")))
    })?;
    let db_encryption_key = std::env::var("SHOMER_DB_ENCRYPTION_KEY").ok();
    let token_cipher_key = std::env::var("SHOMER_TOKEN_CIPHER_KEY").ok();

    let scheduler_defaults = SchedulerConfig::default();
    let sweep_cron =
        std::env::var("SHOMER_SWEEP_CRON").unwrap_or(scheduler_defaults.sweep_cron);
    let scheduler_enabled = env_bool("SHOMER_SCHEDULER_ENABLED", scheduler_defaults.enabled);

    let executor_defaults = ExecutorConfig::default();
    let item_delay_ms =
        env_parsed("SHOMER_ITEM_DELAY_MS", executor_defaults.item_delay_ms)?;
    let platform_timeout_secs =
        env_parsed("SHOMER_PLATFORM_TIMEOUT_SECS", executor_defaults.platform_timeout_secs)?;
    let token_refresh_buffer_secs = env_parsed(
        "SHOMER_TOKEN_REFRESH_BUFFER_SECS",
        executor_defaults.token_refresh_buffer_secs,
    )?;

    Ok(Config {
        database: DatabaseConfig {
            path: db_path,
            pool_size: db_pool_size,
            encryption_key: db_encryption_key,
            token_cipher_key,
        },
        scheduler: SchedulerConfig { sweep_cron, enabled: scheduler_enabled },
        executor: ExecutorConfig { item_delay_ms, platform_timeout_secs, token_refresh_buffer_secs },
    })
}

/// Load configuration from a file.
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ShomerError::Config(format!(
                    "config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ShomerError::Config("no config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ShomerError::Config(format!("failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ShomerError::Config(format!("invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ShomerError::Config(format!("invalid JSON format: {e}"))),
        _ => Err(ShomerError::Config(format!("unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files.
///
/// Returns the first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("config.json"),
            cwd.join("config.toml"),
            cwd.join("shomer.json"),
            cwd.join("shomer.toml"),
            cwd.join("../config.json"),
            cwd.join("../config.toml"),
            cwd.join("../../config.json"),
            cwd.join("../../config.toml"),
        ]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![
                exe_dir.join("config.json"),
                exe_dir.join("config.toml"),
                exe_dir.join("shomer.json"),
                exe_dir.join("shomer.toml"),
            ]);
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| ShomerError::Config(format!("missing required environment variable: {key}")))
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| ShomerError::Config(format!("invalid value for {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
