//! Default configuration values loaded from config.defaults.toml.
//!
//! The defaults file is embedded at compile time so the binary never depends
//! on it being present at runtime.

use once_cell::sync::Lazy;
use serde::Deserialize;

/// The embedded defaults TOML file (loaded at compile time)
const DEFAULTS_TOML: &str = include_str!("../../../config.defaults.toml");

/// Parsed defaults structure (parsed once at first use)
static DEFAULTS: Lazy<DefaultsConfig> = Lazy::new(|| {
    toml::from_str(DEFAULTS_TOML).expect("config.defaults.toml should be valid TOML")
});

// ============================================================================
// Internal structs for parsing config.defaults.toml
// ============================================================================

#[derive(Debug, Deserialize)]
struct DefaultsConfig {
    common: CommonDefaults,
    board: BoardDefaults,
    judge: JudgeDefaults,
    store: StoreDefaults,
}

#[derive(Debug, Deserialize)]
struct CommonDefaults {
    data_dir: String,
    log_level: String,
}

#[derive(Debug, Deserialize)]
struct BoardDefaults {
    width: i32,
    height: i32,
}

#[derive(Debug, Deserialize)]
struct JudgeDefaults {
    namespace: String,
    owner: String,
    turn_timeout_secs: u64,
    retry_interval_secs: u64,
    register_poll_secs: u64,
    queue_capacity: usize,
}

#[derive(Debug, Deserialize)]
struct StoreDefaults {
    poll_interval_ms: u64,
}

// ============================================================================
// Public accessor functions
// ============================================================================

// Common
pub fn data_dir() -> &'static str {
    &DEFAULTS.common.data_dir
}
pub fn log_level() -> &'static str {
    &DEFAULTS.common.log_level
}

// Board
pub fn board_width() -> i32 {
    DEFAULTS.board.width
}
pub fn board_height() -> i32 {
    DEFAULTS.board.height
}

// Judge
pub fn namespace() -> &'static str {
    &DEFAULTS.judge.namespace
}
pub fn owner() -> &'static str {
    &DEFAULTS.judge.owner
}
pub fn turn_timeout_secs() -> u64 {
    DEFAULTS.judge.turn_timeout_secs
}
pub fn retry_interval_secs() -> u64 {
    DEFAULTS.judge.retry_interval_secs
}
pub fn register_poll_secs() -> u64 {
    DEFAULTS.judge.register_poll_secs
}
pub fn queue_capacity() -> usize {
    DEFAULTS.judge.queue_capacity
}

// Store
pub fn poll_interval_ms() -> u64 {
    DEFAULTS.store.poll_interval_ms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_parse() {
        // Just accessing these will verify the TOML parses correctly
        assert_eq!(data_dir(), "./data");
        assert_eq!(log_level(), "info");
    }

    #[test]
    fn test_board_defaults_are_odd() {
        assert_eq!(board_width(), 11);
        assert_eq!(board_height(), 15);
        assert_eq!(board_width() % 2, 1);
        assert_eq!(board_height() % 2, 1);
    }

    #[test]
    fn test_judge_defaults() {
        assert_eq!(namespace(), "paper-soccer");
        assert_eq!(turn_timeout_secs(), 3);
        assert_eq!(retry_interval_secs(), 3);
        assert_eq!(queue_capacity(), 16);
    }
}
