// src/plan/mod.rs

//! The task graph data model: [`Task`], [`Plan`], [`GoalState`] and the
//! [`Strategy`] selector. No I/O, no concurrency.

pub mod goal;
pub mod task;

use std::collections::HashSet;
use std::str::FromStr;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::errors::{PlanError, Result};

pub use goal::{CriterionOp, GoalCriterion, GoalState};
pub use task::{Task, TaskStatus, TaskType};

/// Execution strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Sequential,
    Parallel,
    Adaptive,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Sequential
    }
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Sequential => "sequential",
            Strategy::Parallel => "parallel",
            Strategy::Adaptive => "adaptive",
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sequential" => Ok(Strategy::Sequential),
            "parallel" => Ok(Strategy::Parallel),
            "adaptive" => Ok(Strategy::Adaptive),
            other => Err(format!(
                "invalid strategy: {other} (expected \"sequential\", \"parallel\" or \"adaptive\")"
            )),
        }
    }
}

/// A complete unit of schedulable work: the full task graph for one goal.
///
/// Structure (the set of tasks and their dependency edges) is immutable once
/// execution begins; the run controller mutates only task status fields.
#[derive(Debug, Clone)]
pub struct Plan {
    pub id: String,
    /// The originating goal description.
    pub goal: String,
    /// Initial strategy selection; adaptive runs may finish under another.
    pub strategy: Strategy,
    /// Insertion order is preserved for deterministic tie-breaking but is
    /// NOT an execution guarantee.
    pub tasks: Vec<Task>,
    pub goal_state: Option<GoalState>,
    pub created_at: SystemTime,
}

impl Plan {
    pub fn new(id: impl Into<String>, goal: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            goal: goal.into(),
            strategy: Strategy::default(),
            tasks: Vec::new(),
            goal_state: None,
            created_at: SystemTime::now(),
        }
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_tasks(mut self, tasks: Vec<Task>) -> Self {
        self.tasks = tasks;
        self
    }

    pub fn with_goal_state(mut self, goal_state: GoalState) -> Self {
        self.goal_state = Some(goal_state);
        self
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Index of a task in insertion order.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    /// Validate structural invariants that do not require graph traversal:
    /// unique IDs, dependencies referencing only IDs in this plan, and no
    /// self-references. Acyclicity is checked separately by
    /// [`crate::dag::validate_acyclic`].
    pub fn validate_structure(&self) -> Result<()> {
        let mut seen: HashSet<&str> = HashSet::new();
        for task in &self.tasks {
            if !seen.insert(task.id.as_str()) {
                return Err(PlanError::InvalidPlan(format!(
                    "duplicate task id '{}'",
                    task.id
                )));
            }
        }

        for task in &self.tasks {
            for dep in &task.dependencies {
                if dep == &task.id {
                    return Err(PlanError::InvalidPlan(format!(
                        "task '{}' cannot depend on itself",
                        task.id
                    )));
                }
                if !seen.contains(dep.as_str()) {
                    return Err(PlanError::InvalidPlan(format!(
                        "task '{}' has unknown dependency '{}'",
                        task.id, dep
                    )));
                }
            }
        }

        Ok(())
    }

    /// Human-readable summary of tasks, dependencies and execution waves.
    /// Purely diagnostic; nothing is executed.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("plan '{}' (strategy: {})\n", self.id, self.strategy.as_str()));
        out.push_str(&format!("goal: {}\n", self.goal));
        out.push_str(&format!("tasks ({}):\n", self.tasks.len()));

        for task in &self.tasks {
            out.push_str(&format!("  - {} [{:?}]", task.id, task.status));
            if !task.dependencies.is_empty() {
                out.push_str(&format!(" after {:?}", task.dependencies));
            }
            out.push('\n');
            out.push_str(&format!("      {}\n", task.description));
        }

        if let Ok(waves) = crate::dag::wave_grouping(self) {
            out.push_str(&format!("waves ({}):\n", waves.len()));
            for (i, wave) in waves.iter().enumerate() {
                out.push_str(&format!("  {}: {:?}\n", i + 1, wave));
            }
        }

        out
    }
}
