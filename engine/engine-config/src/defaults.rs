//! Default configuration values loaded from config.defaults.toml.
//!
//! The defaults file is embedded at compile time so every binary ships with
//! the same baseline regardless of its working directory.

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
    mcts: MctsDefaults,
    coalescer: CoalescerDefaults,
    selfplay: SelfPlayDefaults,
}

#[derive(Debug, Deserialize)]
struct CommonDefaults {
    data_dir: String,
    env_id: String,
    log_level: String,
}

#[derive(Debug, Deserialize)]
struct MctsDefaults {
    num_simulations: u32,
    c_puct: f64,
    temperature: f64,
    temp_threshold: u32,
    dirichlet_alpha: f64,
    dirichlet_weight: f64,
}

#[derive(Debug, Deserialize)]
struct CoalescerDefaults {
    max_wait_ms: u64,
    min_wait_ms: u64,
    wait_fraction: f64,
    eval_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
struct SelfPlayDefaults {
    num_games: usize,
    max_moves: u32,
    seed: u64,
    log_interval: u32,
}

// ============================================================================
// Public accessor functions
// ============================================================================

// Common
pub fn data_dir() -> &'static str {
    &DEFAULTS.common.data_dir
}
pub fn env_id() -> &'static str {
    &DEFAULTS.common.env_id
}
pub fn log_level() -> &'static str {
    &DEFAULTS.common.log_level
}

// MCTS
pub fn num_simulations() -> u32 {
    DEFAULTS.mcts.num_simulations
}
pub fn c_puct() -> f64 {
    DEFAULTS.mcts.c_puct
}
pub fn temperature() -> f64 {
    DEFAULTS.mcts.temperature
}
pub fn temp_threshold() -> u32 {
    DEFAULTS.mcts.temp_threshold
}
pub fn dirichlet_alpha() -> f64 {
    DEFAULTS.mcts.dirichlet_alpha
}
pub fn dirichlet_weight() -> f64 {
    DEFAULTS.mcts.dirichlet_weight
}

// Coalescer
pub fn max_wait_ms() -> u64 {
    DEFAULTS.coalescer.max_wait_ms
}
pub fn min_wait_ms() -> u64 {
    DEFAULTS.coalescer.min_wait_ms
}
pub fn wait_fraction() -> f64 {
    DEFAULTS.coalescer.wait_fraction
}
pub fn eval_timeout_ms() -> u64 {
    DEFAULTS.coalescer.eval_timeout_ms
}

// Self-play
pub fn num_games() -> usize {
    DEFAULTS.selfplay.num_games
}
pub fn max_moves() -> u32 {
    DEFAULTS.selfplay.max_moves
}
pub fn seed() -> u64 {
    DEFAULTS.selfplay.seed
}
pub fn log_interval() -> u32 {
    DEFAULTS.selfplay.log_interval
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_parse() {
        // Just accessing these will verify the TOML parses correctly
        assert_eq!(data_dir(), "./data");
        assert_eq!(env_id(), "tictactoe");
        assert_eq!(log_level(), "info");
    }

    #[test]
    fn test_mcts_defaults() {
        assert_eq!(num_simulations(), 200);
        assert!((c_puct() - 1.25).abs() < f64::EPSILON);
        assert_eq!(temp_threshold(), 15);
        assert!((dirichlet_alpha() - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_coalescer_defaults() {
        assert_eq!(max_wait_ms(), 10);
        assert_eq!(min_wait_ms(), 1);
        assert!((wait_fraction() - 0.9).abs() < f64::EPSILON);
        assert_eq!(eval_timeout_ms(), 0);
    }

    #[test]
    fn test_selfplay_defaults() {
        assert_eq!(num_games(), 8);
        assert_eq!(max_moves(), 512);
        assert_eq!(seed(), 42);
        assert_eq!(log_interval(), 10);
    }
}
