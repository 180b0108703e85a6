// src/config/validate.rs

use crate::config::model::PlannerConfig;
use crate::errors::{PlanError, Result};

impl PlannerConfig {
    /// Run semantic validation against the configuration.
    ///
    /// This checks:
    /// - `max_depth >= 1`
    /// - `max_subtasks >= 1`
    /// - `max_parallel >= 1`
    /// - `adaptive_threshold` within `[0.0, 1.0]` and finite
    ///
    /// Called at every `decompose`/`execute` entry point so hand-built
    /// configs are rejected before any task runs.
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(PlanError::InvalidConfig(
                "max_depth must be >= 1 (got 0)".to_string(),
            ));
        }
        if self.max_subtasks == 0 {
            return Err(PlanError::InvalidConfig(
                "max_subtasks must be >= 1 (got 0)".to_string(),
            ));
        }
        if self.max_parallel == 0 {
            return Err(PlanError::InvalidConfig(
                "max_parallel must be >= 1 (got 0)".to_string(),
            ));
        }
        if !self.adaptive_threshold.is_finite()
            || !(0.0..=1.0).contains(&self.adaptive_threshold)
        {
            return Err(PlanError::InvalidConfig(format!(
                "adaptive_threshold must be within [0.0, 1.0] (got {})",
                self.adaptive_threshold
            )));
        }
        Ok(())
    }
}
