// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::plan::Strategy;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [planner]
/// strategy = "adaptive"
/// max_depth = 3
/// max_subtasks = 10
/// max_parallel = 5
/// adaptive_threshold = 0.5
/// goal_check_interval = 5
/// timeout_ms = 60000
/// ```
///
/// All fields are optional and have the defaults documented on
/// [`PlannerConfig`].
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigFile {
    /// Planner behaviour from `[planner]`.
    #[serde(default)]
    pub planner: PlannerConfig,
}

/// Tunables for decomposition and execution.
///
/// Validated by [`PlannerConfig::validate`] at every `decompose`/`execute`
/// entry point, before any task runs.
#[derive(Debug, Clone, Deserialize)]
pub struct PlannerConfig {
    /// Initial execution strategy. Adaptive starts sequential and may switch.
    #[serde(default)]
    pub strategy: Strategy,

    /// Maximum subtask nesting depth the decomposer accepts.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum subtasks any single task may fan out into.
    #[serde(default = "default_max_subtasks")]
    pub max_subtasks: usize,

    /// Worker-pool size for parallel dispatch. Fixed for the duration of one
    /// `execute` call; adaptive switching changes the strategy, never this.
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// Efficiency threshold in `[0.0, 1.0]` governing adaptive switching.
    #[serde(default = "default_adaptive_threshold")]
    pub adaptive_threshold: f64,

    /// Evaluate goal criteria every N completed tasks; `0` means "only once
    /// all tasks are terminal".
    #[serde(default)]
    pub goal_check_interval: usize,

    /// Wall-clock budget for one `execute` call in milliseconds; `0` means
    /// no timeout.
    #[serde(default)]
    pub timeout_ms: u64,
}

fn default_max_depth() -> usize {
    3
}

fn default_max_subtasks() -> usize {
    10
}

fn default_max_parallel() -> usize {
    5
}

fn default_adaptive_threshold() -> f64 {
    0.5
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            max_depth: default_max_depth(),
            max_subtasks: default_max_subtasks(),
            max_parallel: default_max_parallel(),
            adaptive_threshold: default_adaptive_threshold(),
            goal_check_interval: 0,
            timeout_ms: 0,
        }
    }
}

impl PlannerConfig {
    /// Effective timeout, `None` when `timeout_ms == 0`.
    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.timeout_ms))
        }
    }
}
