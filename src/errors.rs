// src/errors.rs

//! Crate-wide error taxonomy.
//!
//! Structural and decomposition failures are always fatal to the call that
//! produced them and are reported before any task runs. Per-task execution
//! failures are *not* errors at this level; they are recorded on the task and
//! surface through `PlanResult` metrics.

use thiserror::Error;

/// Errors returned by decomposition and plan execution entry points.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The dependency relation over the plan's tasks contains a cycle.
    ///
    /// `path` is the concrete sequence of task IDs forming the cycle, first
    /// ID repeated at the end, so callers (and LLM retry paths) can surface
    /// exactly which edges are wrong.
    #[error("cycle detected in task graph: {}", path.join(" -> "))]
    CycleDetected { path: Vec<String> },

    /// A task references a dependency ID that is not part of the plan,
    /// references itself, or shares an ID with another task.
    #[error("invalid plan structure: {0}")]
    InvalidPlan(String),

    /// A `PlannerConfig` field is out of range.
    #[error("invalid planner config: {0}")]
    InvalidConfig(String),

    /// The goal-analysis capability itself failed (network/LLM error).
    #[error("goal analysis failed: {source}")]
    Analysis {
        #[source]
        source: anyhow::Error,
    },

    /// The goal-analysis capability answered, but the response did not
    /// conform to the expected task-tree structure.
    #[error("malformed decomposition response: {0}")]
    MalformedDecomposition(String),

    /// Decomposition exceeded the configured nesting depth.
    #[error("decomposition depth {depth} exceeds max_depth {max_depth}")]
    DepthExceeded { depth: usize, max_depth: usize },

    /// A single task fanned out into more subtasks than allowed.
    #[error("task '{task}' has {count} subtasks, exceeding max_subtasks {max_subtasks}")]
    FanOutExceeded {
        task: String,
        count: usize,
        max_subtasks: usize,
    },

    /// The caller's cancellation token fired before any task had started.
    /// Cancellation after partial progress is reported through
    /// `PlanResult::status` instead.
    #[error("execution cancelled before any task started")]
    Cancelled,
}

pub type Result<T, E = PlanError> = std::result::Result<T, E>;
