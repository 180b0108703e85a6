// src/report.rs

//! Read-only outcome of one plan execution: status, metrics and the
//! append-only event timeline.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::plan::Strategy;

/// Final disposition of one `execute` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    /// Either every task reached a terminal state with at least one
    /// completion path intact, or the goal was achieved early.
    Completed,
    /// Every remaining pending task was blocked; nothing further could ever
    /// complete.
    Failed,
    /// The caller's cancellation token (or the configured timeout) fired
    /// after partial progress.
    Cancelled,
}

/// Timeline entry tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    TaskStarted,
    TaskCompleted,
    TaskFailed,
    GoalChecked,
    GoalAchieved,
    StrategyInitialized,
    StrategySwitched,
}

/// One append-only timeline entry.
///
/// `elapsed` is measured from the start of the `execute` call; entries are
/// appended in real emission order, serialized through the run controller,
/// which is the only externally observable ordering contract.
#[derive(Debug, Clone, Serialize)]
pub struct PlanEvent {
    pub kind: EventKind,
    pub elapsed: Duration,
    pub metadata: BTreeMap<String, String>,
}

impl PlanEvent {
    pub fn new(kind: EventKind, elapsed: Duration) -> Self {
        Self {
            kind,
            elapsed,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Aggregate numbers for one execution.
///
/// `task_count` counts tasks that reached a terminal state during the run
/// (an early goal stop leaves the rest Pending and uncounted). Blocked tasks
/// count toward `failed_task_count` but are excluded from
/// `avg_task_duration` since they never ran.
#[derive(Debug, Clone, Serialize)]
pub struct PlanMetrics {
    pub task_count: usize,
    pub failed_task_count: usize,
    pub success_rate: f64,
    pub execution_time: Duration,
    pub avg_task_duration: Duration,
    /// The strategy in use when the run ended; differs from the plan's
    /// initial selection after an adaptive switch.
    pub strategy: Strategy,
}

impl PlanMetrics {
    pub fn compute(
        task_count: usize,
        failed_task_count: usize,
        execution_time: Duration,
        run_durations: &[Duration],
        strategy: Strategy,
    ) -> Self {
        let success_rate = if task_count == 0 {
            0.0
        } else {
            (task_count - failed_task_count) as f64 / task_count as f64
        };

        let avg_task_duration = if run_durations.is_empty() {
            Duration::ZERO
        } else {
            run_durations.iter().sum::<Duration>() / run_durations.len() as u32
        };

        Self {
            task_count,
            failed_task_count,
            success_rate,
            execution_time,
            avg_task_duration,
            strategy,
        }
    }
}

/// Produced once per execution, read-only after return.
#[derive(Debug, Clone, Serialize)]
pub struct PlanResult {
    pub plan_id: String,
    pub status: PlanStatus,
    pub goal_met: bool,
    pub metrics: PlanMetrics,
    pub timeline: Vec<PlanEvent>,
}

impl PlanResult {
    /// Count of timeline entries with the given tag.
    pub fn event_count(&self, kind: EventKind) -> usize {
        self.timeline.iter().filter(|e| e.kind == kind).count()
    }
}
