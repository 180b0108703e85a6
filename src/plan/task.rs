// src/plan/task.rs

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Classification of a task. Informational only; scheduling never looks at
/// this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Observation,
    Action,
    Decision,
    Aggregate,
}

impl Default for TaskType {
    fn default() -> Self {
        TaskType::Action
    }
}

/// Per-run state of a task.
///
/// `Pending -> Running -> {Completed | Failed}`; a Pending task whose
/// dependency chain contains a failure becomes `Blocked` without ever being
/// attempted. `Completed`, `Failed` and `Blocked` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Blocked,
}

impl TaskStatus {
    /// Terminal states never change again within one run.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Blocked
        )
    }
}

/// An atomic unit of delegated work with dependencies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique within one plan.
    pub id: String,

    /// Human-readable instruction handed to the work-execution capability.
    pub description: String,

    #[serde(default)]
    pub task_type: TaskType,

    #[serde(default = "pending")]
    pub status: TaskStatus,

    /// IDs of tasks that must reach `Completed` before this one may start.
    /// Must reference tasks in the same plan; self-reference is forbidden.
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Nested decomposition structure. Subtasks are informational; the
    /// engine schedules only top-level tasks.
    #[serde(default)]
    pub subtasks: Vec<Task>,

    /// Advisory complexity score in 1..=10 from decomposition. Never gates
    /// success or failure.
    #[serde(default)]
    pub complexity: Option<u8>,

    /// Populated exactly once, on `Completed`.
    #[serde(default)]
    pub result: Option<String>,

    /// Populated exactly once, on `Failed` (or a short reason on `Blocked`).
    #[serde(default)]
    pub error: Option<String>,

    #[serde(skip)]
    pub started_at: Option<Instant>,

    #[serde(skip)]
    pub ended_at: Option<Instant>,
}

fn pending() -> TaskStatus {
    TaskStatus::Pending
}

impl Task {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            task_type: TaskType::default(),
            status: TaskStatus::Pending,
            dependencies: Vec::new(),
            subtasks: Vec::new(),
            complexity: None,
            result: None,
            error: None,
            started_at: None,
            ended_at: None,
        }
    }

    pub fn with_dependencies(mut self, deps: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_type(mut self, task_type: TaskType) -> Self {
        self.task_type = task_type;
        self
    }

    /// Wall-clock duration of the single execution attempt, if the task ran
    /// to a terminal state. Blocked tasks never ran and return `None`.
    pub fn duration(&self) -> Option<Duration> {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => Some(end.duration_since(start)),
            _ => None,
        }
    }
}
