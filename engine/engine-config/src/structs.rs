//! Configuration struct definitions.
//!
//! All config structs with serde deserialization support and default values.

use crate::defaults;
use serde::Deserialize;
use std::time::Duration;

// ============================================================================
// Serde default functions (required for #[serde(default = "...")])
// These call the accessor functions from defaults module
// ============================================================================

fn d_data_dir() -> String {
    defaults::data_dir().into()
}
fn d_env_id() -> String {
    defaults::env_id().into()
}
fn d_log_level() -> String {
    defaults::log_level().into()
}
fn d_num_sims() -> u32 {
    defaults::num_simulations()
}
fn d_c_puct() -> f64 {
    defaults::c_puct()
}
fn d_temperature() -> f64 {
    defaults::temperature()
}
fn d_temp_threshold() -> u32 {
    defaults::temp_threshold()
}
fn d_dirichlet_alpha() -> f64 {
    defaults::dirichlet_alpha()
}
fn d_dirichlet_weight() -> f64 {
    defaults::dirichlet_weight()
}
fn d_max_wait_ms() -> u64 {
    defaults::max_wait_ms()
}
fn d_min_wait_ms() -> u64 {
    defaults::min_wait_ms()
}
fn d_wait_fraction() -> f64 {
    defaults::wait_fraction()
}
fn d_eval_timeout_ms() -> u64 {
    defaults::eval_timeout_ms()
}
fn d_num_games() -> usize {
    defaults::num_games()
}
fn d_max_moves() -> u32 {
    defaults::max_moves()
}
fn d_seed() -> u64 {
    defaults::seed()
}
fn d_log_interval() -> u32 {
    defaults::log_interval()
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
    pub mcts: MctsConfig,
    #[serde(default)]
    pub coalescer: CoalescerConfig,
    #[serde(default)]
    pub selfplay: SelfPlayConfig,
}

/// Common configuration shared by all components
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CommonConfig {
    #[serde(default = "d_data_dir")]
    pub data_dir: String,
    #[serde(default = "d_env_id")]
    pub env_id: String,
    #[serde(default = "d_log_level")]
    pub log_level: String,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            data_dir: defaults::data_dir().into(),
            env_id: defaults::env_id().into(),
            log_level: defaults::log_level().into(),
        }
    }
}

/// MCTS (Monte Carlo Tree Search) configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MctsConfig {
    #[serde(default = "d_num_sims")]
    pub num_simulations: u32,
    #[serde(default = "d_c_puct")]
    pub c_puct: f64,
    #[serde(default = "d_temperature")]
    pub temperature: f64,
    #[serde(default = "d_temp_threshold")]
    pub temp_threshold: u32,
    #[serde(default = "d_dirichlet_alpha")]
    pub dirichlet_alpha: f64,
    #[serde(default = "d_dirichlet_weight")]
    pub dirichlet_weight: f64,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            num_simulations: defaults::num_simulations(),
            c_puct: defaults::c_puct(),
            temperature: defaults::temperature(),
            temp_threshold: defaults::temp_threshold(),
            dirichlet_alpha: defaults::dirichlet_alpha(),
            dirichlet_weight: defaults::dirichlet_weight(),
        }
    }
}

/// Request coalescer (evaluation batching) configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CoalescerConfig {
    /// Cap on the adaptive wait interval
    #[serde(default = "d_max_wait_ms")]
    pub max_wait_ms: u64,
    #[serde(default = "d_min_wait_ms")]
    pub min_wait_ms: u64,
    #[serde(default = "d_wait_fraction")]
    pub wait_fraction: f64,
    /// Evaluator call timeout in milliseconds (0 = no timeout)
    #[serde(default = "d_eval_timeout_ms")]
    pub eval_timeout_ms: u64,
}

impl CoalescerConfig {
    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }

    pub fn min_wait(&self) -> Duration {
        Duration::from_millis(self.min_wait_ms)
    }

    pub fn eval_timeout(&self) -> Option<Duration> {
        (self.eval_timeout_ms > 0).then(|| Duration::from_millis(self.eval_timeout_ms))
    }
}

impl Default for CoalescerConfig {
    fn default() -> Self {
        Self {
            max_wait_ms: defaults::max_wait_ms(),
            min_wait_ms: defaults::min_wait_ms(),
            wait_fraction: defaults::wait_fraction(),
            eval_timeout_ms: defaults::eval_timeout_ms(),
        }
    }
}

/// Self-play run configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SelfPlayConfig {
    #[serde(default = "d_num_games")]
    pub num_games: usize,
    /// Games still running after this many moves are reported as failures
    #[serde(default = "d_max_moves")]
    pub max_moves: u32,
    #[serde(default = "d_seed")]
    pub seed: u64,
    #[serde(default = "d_log_interval")]
    pub log_interval: u32,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            num_games: defaults::num_games(),
            max_moves: defaults::max_moves(),
            seed: defaults::seed(),
            log_interval: defaults::log_interval(),
        }
    }
}
