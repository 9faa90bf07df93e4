//! Configuration loading logic.
//!
//! Handles loading config from files and applying environment variable overrides.

use crate::CentralConfig;
use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "ARENA_CONFIG";

/// Standard locations to search for config.toml
pub const CONFIG_SEARCH_PATHS: &[&str] = &[
    "config.toml",      // Current directory
    "../config.toml",   // Parent directory (when running from subdirectory)
    "/app/config.toml", // Docker container
];

/// Load the central configuration from config.toml.
///
/// Searches for config.toml in the following order:
/// 1. Path specified by the ARENA_CONFIG environment variable
/// 2. Current directory (config.toml)
/// 3. Parent directory (../config.toml)
/// 4. Docker container path (/app/config.toml)
///
/// After loading, environment variable overrides are applied.
pub fn load_config() -> CentralConfig {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        let path = PathBuf::from(&path);
        if path.exists() {
            info!("Loading config from {}: {}", CONFIG_ENV_VAR, path.display());
            return load_from_path(&path);
        }
        warn!(
            "{}={} not found, searching defaults",
            CONFIG_ENV_VAR,
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

/// Load configuration from a specific path, falling back to defaults when the
/// file cannot be read or parsed.
pub fn load_from_path(path: &Path) -> CentralConfig {
    match try_load_from_path(path) {
        Ok(config) => config,
        Err(e) => {
            warn!("{:#}, using defaults", e);
            apply_env_overrides(CentralConfig::default())
        }
    }
}

/// Load configuration from a specific path, surfacing read and parse errors.
pub fn try_load_from_path(path: &Path) -> anyhow::Result<CentralConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: CentralConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(apply_env_overrides(config))
}

/// Macro to reduce env override boilerplate
macro_rules! env_override {
    // String field
    ($config:expr, $section:ident . $field:ident, $key:expr) => {
        if let Ok(v) = std::env::var($key) {
            $config.$section.$field = v;
        }
    };
    // Parseable field (u32, u64, f64, etc.)
    ($config:expr, $section:ident . $field:ident, $key:expr, parse) => {
        match std::env::var($key).map(|s| s.parse()) {
            Ok(Ok(v)) => $config.$section.$field = v,
            Ok(Err(_)) => warn!("Ignoring unparseable {}", $key),
            Err(_) => {}
        }
    };
}

/// Apply environment variable overrides to a configuration.
///
/// Environment variables follow the pattern: ARENA_<SECTION>_<KEY>
pub fn apply_env_overrides(mut config: CentralConfig) -> CentralConfig {
    // Common
    env_override!(config, common.env_id, "ARENA_COMMON_ENV_ID");
    env_override!(config, common.data_dir, "ARENA_COMMON_DATA_DIR");
    env_override!(config, common.log_level, "ARENA_COMMON_LOG_LEVEL");

    // MCTS
    env_override!(
        config,
        mcts.num_simulations,
        "ARENA_MCTS_NUM_SIMULATIONS",
        parse
    );
    env_override!(config, mcts.c_puct, "ARENA_MCTS_C_PUCT", parse);
    env_override!(config, mcts.temperature, "ARENA_MCTS_TEMPERATURE", parse);
    env_override!(
        config,
        mcts.temp_threshold,
        "ARENA_MCTS_TEMP_THRESHOLD",
        parse
    );
    env_override!(
        config,
        mcts.dirichlet_alpha,
        "ARENA_MCTS_DIRICHLET_ALPHA",
        parse
    );
    env_override!(
        config,
        mcts.dirichlet_weight,
        "ARENA_MCTS_DIRICHLET_WEIGHT",
        parse
    );

    // Coalescer
    env_override!(
        config,
        coalescer.max_wait_ms,
        "ARENA_COALESCER_MAX_WAIT_MS",
        parse
    );
    env_override!(
        config,
        coalescer.min_wait_ms,
        "ARENA_COALESCER_MIN_WAIT_MS",
        parse
    );
    env_override!(
        config,
        coalescer.wait_fraction,
        "ARENA_COALESCER_WAIT_FRACTION",
        parse
    );
    env_override!(
        config,
        coalescer.eval_timeout_ms,
        "ARENA_COALESCER_EVAL_TIMEOUT_MS",
        parse
    );

    // Self-play
    env_override!(
        config,
        selfplay.num_games,
        "ARENA_SELFPLAY_NUM_GAMES",
        parse
    );
    env_override!(
        config,
        selfplay.max_moves,
        "ARENA_SELFPLAY_MAX_MOVES",
        parse
    );
    env_override!(config, selfplay.seed, "ARENA_SELFPLAY_SEED", parse);
    env_override!(
        config,
        selfplay.log_interval,
        "ARENA_SELFPLAY_LOG_INTERVAL",
        parse
    );

    config
}
