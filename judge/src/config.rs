//! Configuration for the judge service
//!
//! Configuration is loaded from config.toml with environment variable overrides.
//! CLI arguments take highest priority, followed by env vars, then config.toml.

use anyhow::{anyhow, Result};
use clap::Parser;
use engine_config::{load_config, CentralConfig};
use once_cell::sync::Lazy;
use std::time::Duration;
use tracing::level_filters::LevelFilter;

/// Largest board side accepted, in vertices
pub const MAX_BOARD_SIDE: i32 = 101;

// Load central config once at startup
static CENTRAL_CONFIG: Lazy<CentralConfig> = Lazy::new(load_config);

/// Read `JUDGE_<key>` from the environment, falling back to `fallback`.
fn env_or<T: std::str::FromStr>(key: &str, fallback: T) -> T {
    std::env::var(format!("JUDGE_{}", key))
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

fn default_namespace() -> String {
    env_or("NAMESPACE", CENTRAL_CONFIG.judge.namespace.clone())
}

fn default_owner() -> String {
    env_or("OWNER", CENTRAL_CONFIG.judge.owner.clone())
}

fn default_width() -> i32 {
    env_or("WIDTH", CENTRAL_CONFIG.board.width)
}

fn default_height() -> i32 {
    env_or("HEIGHT", CENTRAL_CONFIG.board.height)
}

fn default_turn_timeout() -> u64 {
    env_or("TURN_TIMEOUT_SECS", CENTRAL_CONFIG.judge.turn_timeout_secs)
}

fn default_retry_interval() -> u64 {
    env_or("RETRY_INTERVAL_SECS", CENTRAL_CONFIG.judge.retry_interval_secs)
}

fn default_register_poll() -> u64 {
    env_or("REGISTER_POLL_SECS", CENTRAL_CONFIG.judge.register_poll_secs)
}

fn default_queue_capacity() -> usize {
    env_or("QUEUE_CAPACITY", CENTRAL_CONFIG.judge.queue_capacity)
}

fn default_log_level() -> String {
    env_or("LOG_LEVEL", CENTRAL_CONFIG.common.log_level.clone())
}

fn default_store_path() -> String {
    env_or(
        "STORE_PATH",
        format!("{}/store.db", CENTRAL_CONFIG.common.data_dir),
    )
}

fn default_poll_interval() -> u64 {
    env_or("POLL_INTERVAL_MS", CENTRAL_CONFIG.store.poll_interval_ms)
}

#[derive(Parser, Debug, Clone)]
#[command(name = "judge")]
#[command(about = "Paper soccer judge - referees one game over the shared record store")]
#[command(
    long_about = "Judge that waits for two players to register, then validates their moves,
publishes the world after every verdict and announces the winner.

Configuration is loaded from config.toml with environment variable overrides.
CLI arguments take highest priority."
)]
pub struct Config {
    /// Namespace every record of the game lives under
    #[arg(long, default_value_t = default_namespace())]
    pub namespace: String,

    /// Identity the judge writes records as
    #[arg(long, default_value_t = default_owner())]
    pub owner: String,

    /// Board width in vertices (odd)
    #[arg(long, default_value_t = default_width())]
    pub width: i32,

    /// Board height in vertices (odd)
    #[arg(long, default_value_t = default_height())]
    pub height: i32,

    /// Seconds a player has to move before forfeiting the turn
    #[arg(long, default_value_t = default_turn_timeout())]
    pub turn_timeout_secs: u64,

    /// Seconds between retries of a failed store write
    #[arg(long, default_value_t = default_retry_interval())]
    pub retry_interval_secs: u64,

    /// Seconds between lookups for player registrations
    #[arg(long, default_value_t = default_register_poll())]
    pub register_poll_secs: u64,

    /// Capacity of the action notification queue
    #[arg(long, default_value_t = default_queue_capacity())]
    pub queue_capacity: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value_t = default_log_level())]
    pub log_level: String,

    /// Path to the shared SQLite store
    #[arg(long, default_value_t = default_store_path())]
    pub store_path: String,

    /// Store polling interval in milliseconds
    #[arg(long, default_value_t = default_poll_interval())]
    pub poll_interval_ms: u64,

    /// Seed for the side coin flip (random when omitted)
    #[arg(long, env = "JUDGE_SEED")]
    pub seed: Option<u64>,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(anyhow!("namespace cannot be empty"));
        }

        if self.owner.is_empty() {
            return Err(anyhow!("owner cannot be empty"));
        }

        if self.width % 2 == 0 || self.height % 2 == 0 {
            return Err(anyhow!(
                "board dimensions must be odd, got {}x{}",
                self.width,
                self.height
            ));
        }

        if self.width < 3 || self.height < 3 {
            return Err(anyhow!(
                "board must be at least 3x3, got {}x{}",
                self.width,
                self.height
            ));
        }

        if self.width > MAX_BOARD_SIDE || self.height > MAX_BOARD_SIDE {
            return Err(anyhow!(
                "board must be at most {}x{}, got {}x{}",
                MAX_BOARD_SIDE,
                MAX_BOARD_SIDE,
                self.width,
                self.height
            ));
        }

        if self.turn_timeout_secs == 0 {
            return Err(anyhow!("turn_timeout_secs must be greater than 0"));
        }

        if self.retry_interval_secs == 0 {
            return Err(anyhow!("retry_interval_secs must be greater than 0"));
        }

        if self.register_poll_secs == 0 {
            return Err(anyhow!("register_poll_secs must be greater than 0"));
        }

        if self.queue_capacity == 0 {
            return Err(anyhow!("queue_capacity must be greater than 0"));
        }

        if self.poll_interval_ms == 0 {
            return Err(anyhow!("poll_interval_ms must be greater than 0"));
        }

        if self.log_level.parse::<LevelFilter>().is_err() {
            return Err(anyhow!(
                "invalid log level '{}', expected one of trace, debug, info, warn, error",
                self.log_level
            ));
        }

        Ok(())
    }

    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.turn_timeout_secs)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }

    pub fn register_poll(&self) -> Duration {
        Duration::from_secs(self.register_poll_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
