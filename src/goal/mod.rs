// src/goal/mod.rs

//! Goal evaluation: deciding whether a plan's objective is already satisfied
//! before all tasks finish.
//!
//! This layer owns only the comparison and the aggregate "is goal met"
//! decision (AND of all criteria). Observed values come from a
//! [`GoalObserver`] collaborator; [`PlanProgressObserver`] is the built-in
//! implementation resolving the standard progress counters.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::plan::{GoalState, Plan, TaskStatus};

/// Supplies the observed value for a named goal criterion.
///
/// Returning `None` means the name is not observable; the criterion is then
/// treated as unsatisfied (and logged) rather than failing the run.
pub trait GoalObserver: Send + Sync {
    fn observe(&self, name: &str, plan: &Plan) -> Option<f64>;
}

/// Built-in observer over the plan's own progress counters.
///
/// Resolves:
/// - `completed_tasks`
/// - `failed_tasks` (includes Blocked, matching the failure metrics)
/// - `total_tasks`
/// - `success_rate` (completed / total)
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanProgressObserver;

impl GoalObserver for PlanProgressObserver {
    fn observe(&self, name: &str, plan: &Plan) -> Option<f64> {
        let count = |status: TaskStatus| {
            plan.tasks.iter().filter(|t| t.status == status).count() as f64
        };

        match name {
            "completed_tasks" => Some(count(TaskStatus::Completed)),
            "failed_tasks" => Some(count(TaskStatus::Failed) + count(TaskStatus::Blocked)),
            "total_tasks" => Some(plan.tasks.len() as f64),
            "success_rate" => {
                if plan.tasks.is_empty() {
                    Some(0.0)
                } else {
                    Some(count(TaskStatus::Completed) / plan.tasks.len() as f64)
                }
            }
            _ => None,
        }
    }
}

/// Applies goal criteria against observed values.
pub struct GoalEvaluator {
    observer: Arc<dyn GoalObserver>,
}

impl GoalEvaluator {
    pub fn new(observer: Arc<dyn GoalObserver>) -> Self {
        Self { observer }
    }

    /// Evaluate all criteria in `goal_state` against the plan's current
    /// progress, updating each criterion's `satisfied` flag. Returns `true`
    /// when every criterion holds.
    pub fn evaluate(&self, goal_state: &mut GoalState, plan: &Plan) -> bool {
        let mut all_met = !goal_state.criteria.is_empty();

        for criterion in &mut goal_state.criteria {
            match self.observer.observe(&criterion.name, plan) {
                Some(observed) => {
                    criterion.satisfied = criterion.operator.compare(observed, criterion.expected);
                    debug!(
                        criterion = %criterion.name,
                        observed,
                        expected = criterion.expected,
                        satisfied = criterion.satisfied,
                        "evaluated goal criterion"
                    );
                }
                None => {
                    warn!(
                        criterion = %criterion.name,
                        "no observable value for goal criterion; treating as unsatisfied"
                    );
                    criterion.satisfied = false;
                }
            }

            all_met &= criterion.satisfied;
        }

        all_met
    }
}
