//! Configuration loading logic.
//!
//! Handles loading config from files and applying environment variable overrides.

use crate::CentralConfig;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Standard locations to search for config.toml
pub const CONFIG_SEARCH_PATHS: &[&str] = &[
    "config.toml",      // Current directory
    "../config.toml",   // Parent directory (when running from subdirectory)
    "/app/config.toml", // Docker container
];

/// Load the central configuration from config.toml.
///
/// Searches for config.toml in the following order:
/// 1. Path specified by PAPER_SOCCER_CONFIG environment variable
/// 2. Current directory (config.toml)
/// 3. Parent directory (../config.toml)
/// 4. Docker container path (/app/config.toml)
///
/// After loading, environment variable overrides are applied.
pub fn load_config() -> CentralConfig {
    if let Ok(path) = std::env::var("PAPER_SOCCER_CONFIG") {
        let path = PathBuf::from(&path);
        if path.exists() {
            info!("Loading config from PAPER_SOCCER_CONFIG: {}", path.display());
            return load_from_path(&path);
        }
        warn!(
            "PAPER_SOCCER_CONFIG={} not found, searching defaults",
            path.display()
        );
    }

    for path_str in CONFIG_SEARCH_PATHS {
        let path = PathBuf::from(path_str);
        if path.exists() {
            info!("Loading config from {}", path.display());
            return load_from_path(&path);
        }
    }

    debug!("No config.toml found, using built-in defaults");
    apply_env_overrides(CentralConfig::default())
}

/// Load configuration from a specific path.
pub fn load_from_path(path: &PathBuf) -> CentralConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => apply_env_overrides(config),
            Err(e) => {
                warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                apply_env_overrides(CentralConfig::default())
            }
        },
        Err(e) => {
            warn!("Failed to read {}: {}, using defaults", path.display(), e);
            apply_env_overrides(CentralConfig::default())
        }
    }
}

/// Macro to reduce env override boilerplate
macro_rules! env_override {
    // String field
    ($config:expr, $section:ident . $field:ident, $key:expr) => {
        if let Ok(v) = std::env::var($key) {
            $config.$section.$field = v;
        }
    };
    // Parseable field (i32, u64, usize, etc.)
    ($config:expr, $section:ident . $field:ident, $key:expr, parse) => {
        if let Ok(v) =
            std::env::var($key).and_then(|s| s.parse().map_err(|_| std::env::VarError::NotPresent))
        {
            $config.$section.$field = v;
        }
    };
}

/// Apply environment variable overrides to a configuration.
///
/// Environment variables follow the pattern: PAPER_SOCCER_<SECTION>_<KEY>
pub fn apply_env_overrides(mut config: CentralConfig) -> CentralConfig {
    // Common
    env_override!(config, common.data_dir, "PAPER_SOCCER_COMMON_DATA_DIR");
    env_override!(config, common.log_level, "PAPER_SOCCER_COMMON_LOG_LEVEL");

    // Board
    env_override!(config, board.width, "PAPER_SOCCER_BOARD_WIDTH", parse);
    env_override!(config, board.height, "PAPER_SOCCER_BOARD_HEIGHT", parse);

    // Judge
    env_override!(config, judge.namespace, "PAPER_SOCCER_JUDGE_NAMESPACE");
    env_override!(config, judge.owner, "PAPER_SOCCER_JUDGE_OWNER");
    env_override!(
        config,
        judge.turn_timeout_secs,
        "PAPER_SOCCER_JUDGE_TURN_TIMEOUT_SECS",
        parse
    );
    env_override!(
        config,
        judge.retry_interval_secs,
        "PAPER_SOCCER_JUDGE_RETRY_INTERVAL_SECS",
        parse
    );
    env_override!(
        config,
        judge.register_poll_secs,
        "PAPER_SOCCER_JUDGE_REGISTER_POLL_SECS",
        parse
    );
    env_override!(
        config,
        judge.queue_capacity,
        "PAPER_SOCCER_JUDGE_QUEUE_CAPACITY",
        parse
    );

    // Store
    env_override!(
        config,
        store.poll_interval_ms,
        "PAPER_SOCCER_STORE_POLL_INTERVAL_MS",
        parse
    );

    config
}
