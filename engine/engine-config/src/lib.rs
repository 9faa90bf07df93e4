//! Centralized configuration loading from config.toml.
//!
//! This crate provides the configuration structs and loading logic shared by
//! the search engine and the self-play actor.
//!
//! # Configuration Priority
//!
//! Settings are loaded with the following priority (highest to lowest):
//! 1. Environment variables (`ARENA_<SECTION>_<KEY>`)
//! 2. config.toml file
//! 3. Built-in defaults (`config.defaults.toml`)
//!
//! # Environment Variable Override Pattern
//!
//! ```text
//! ARENA_<SECTION>_<KEY>=value
//!
//! Examples:
//!     ARENA_COMMON_ENV_ID=connect4
//!     ARENA_MCTS_NUM_SIMULATIONS=400
//!     ARENA_COALESCER_MAX_WAIT_MS=5
//!     ARENA_SELFPLAY_NUM_GAMES=64
//! ```

mod defaults;
mod loader;
mod structs;

pub use defaults::*;
pub use loader::{
    apply_env_overrides, load_config, load_from_path, try_load_from_path, CONFIG_ENV_VAR,
    CONFIG_SEARCH_PATHS,
};
pub use structs::*;
