// src/decompose/schema.rs

//! Strict schema for the goal-analysis response.
//!
//! The analyzer's output is an untyped document and is never trusted: it is
//! parsed into these structures immediately and anything that does not
//! conform is rejected at the decomposer boundary. None of these types leak
//! into the rest of the crate.

use serde::Deserialize;

use crate::plan::TaskType;

/// Top-level decomposition payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDecomposition {
    pub tasks: Vec<RawTaskSpec>,

    /// Advisory overall complexity score (1-10); out-of-range values are
    /// dropped with a warning, never treated as failure.
    #[serde(default)]
    pub complexity: Option<u8>,
}

/// One proposed task from the analyzer.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTaskSpec {
    pub id: String,
    pub description: String,

    #[serde(default)]
    pub task_type: Option<TaskType>,

    #[serde(default)]
    pub dependencies: Vec<String>,

    #[serde(default)]
    pub subtasks: Vec<RawTaskSpec>,

    /// Advisory per-task complexity score (1-10).
    #[serde(default)]
    pub complexity: Option<u8>,
}

impl RawTaskSpec {
    /// Nesting depth of this spec's subtask tree; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        1 + self
            .subtasks
            .iter()
            .map(RawTaskSpec::depth)
            .max()
            .unwrap_or(0)
    }
}
