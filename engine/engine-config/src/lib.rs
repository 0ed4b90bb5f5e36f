//! Centralized configuration loading from config.toml.
//!
//! This crate provides the configuration structs and loading logic used by
//! the judge binary and anything else that needs board or store settings.
//!
//! # Configuration Priority
//!
//! Settings are loaded with the following priority (highest to lowest):
//! 1. Environment variables (`PAPER_SOCCER_<SECTION>_<KEY>`)
//! 2. config.toml file
//! 3. Built-in defaults (`config.defaults.toml`, embedded at compile time)
//!
//! # Environment Variable Override Pattern
//!
//! ```text
//! PAPER_SOCCER_<SECTION>_<KEY>=value
//!
//! Examples:
//!     PAPER_SOCCER_COMMON_LOG_LEVEL=debug
//!     PAPER_SOCCER_BOARD_WIDTH=9
//!     PAPER_SOCCER_JUDGE_TURN_TIMEOUT_SECS=5
//!     PAPER_SOCCER_COMMON_DATA_DIR=/data
//! ```

mod defaults;
mod loader;
mod structs;

pub use defaults::*;
pub use loader::{apply_env_overrides, load_config, load_from_path, CONFIG_SEARCH_PATHS};
pub use structs::*;
