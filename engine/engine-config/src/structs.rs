//! Configuration struct definitions.
//!
//! All config structs with serde deserialization support and default values.

use crate::defaults;
use serde::Deserialize;

// ============================================================================
// Serde default functions (required for #[serde(default = "...")])
// These call the accessor functions from defaults module
// ============================================================================

fn d_data_dir() -> String {
    defaults::data_dir().into()
}
fn d_log_level() -> String {
    defaults::log_level().into()
}
fn d_width() -> i32 {
    defaults::board_width()
}
fn d_height() -> i32 {
    defaults::board_height()
}
fn d_namespace() -> String {
    defaults::namespace().into()
}
fn d_owner() -> String {
    defaults::owner().into()
}
fn d_turn_timeout() -> u64 {
    defaults::turn_timeout_secs()
}
fn d_retry_interval() -> u64 {
    defaults::retry_interval_secs()
}
fn d_register_poll() -> u64 {
    defaults::register_poll_secs()
}
fn d_queue_capacity() -> usize {
    defaults::queue_capacity()
}
fn d_poll_interval() -> u64 {
    defaults::poll_interval_ms()
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Root configuration structure matching config.toml
#[derive(Debug, Deserialize, Default, Clone)]
pub struct CentralConfig {
    #[serde(default)]
    pub common: CommonConfig,
    #[serde(default)]
    pub board: BoardConfig,
    #[serde(default)]
    pub judge: JudgeConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Common configuration shared by all components
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CommonConfig {
    /// Directory holding the shared SQLite store
    #[serde(default = "d_data_dir")]
    pub data_dir: String,
    #[serde(default = "d_log_level")]
    pub log_level: String,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            data_dir: defaults::data_dir().into(),
            log_level: defaults::log_level().into(),
        }
    }
}

/// Board geometry. Both dimensions must be odd.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BoardConfig {
    #[serde(default = "d_width")]
    pub width: i32,
    #[serde(default = "d_height")]
    pub height: i32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: defaults::board_width(),
            height: defaults::board_height(),
        }
    }
}

/// Referee behaviour: identity in the store and turn timing
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct JudgeConfig {
    /// Namespace every record of this game lives under
    #[serde(default = "d_namespace")]
    pub namespace: String,
    /// Owner identity the judge writes records as
    #[serde(default = "d_owner")]
    pub owner: String,
    /// Seconds a player has to move before forfeiting the turn
    #[serde(default = "d_turn_timeout")]
    pub turn_timeout_secs: u64,
    /// Fixed backoff between failed store writes
    #[serde(default = "d_retry_interval")]
    pub retry_interval_secs: u64,
    /// Interval between lookups for player registrations
    #[serde(default = "d_register_poll")]
    pub register_poll_secs: u64,
    /// Capacity of the action notification queue
    #[serde(default = "d_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            namespace: defaults::namespace().into(),
            owner: defaults::owner().into(),
            turn_timeout_secs: defaults::turn_timeout_secs(),
            retry_interval_secs: defaults::retry_interval_secs(),
            register_poll_secs: defaults::register_poll_secs(),
            queue_capacity: defaults::queue_capacity(),
        }
    }
}

/// Shared record store configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    /// How often watches poll for new revisions, in milliseconds
    #[serde(default = "d_poll_interval")]
    pub poll_interval_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: defaults::poll_interval_ms(),
        }
    }
}
