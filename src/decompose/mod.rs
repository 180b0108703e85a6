// src/decompose/mod.rs

//! Turns a natural-language goal into a validated [`Plan`] by invoking the
//! external goal-analysis capability and structurally validating the result.

pub mod schema;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::PlannerConfig;
use crate::dag;
use crate::errors::{PlanError, Result};
use crate::plan::{Plan, Strategy, Task, TaskType};
use schema::{RawDecomposition, RawTaskSpec};

/// Goal-analysis capability: natural-language goal in, proposed task tree
/// out as an untyped JSON document.
///
/// Implementations may fail (network/LLM error) or return structurally
/// invalid data; the [`Decomposer`] validates, never trusts, the output.
#[async_trait]
pub trait GoalAnalyzer: Send + Sync {
    async fn analyze(&self, goal: &str) -> anyhow::Result<Value>;
}

static PLAN_COUNTER: AtomicU64 = AtomicU64::new(1);

fn next_plan_id() -> String {
    format!("plan-{}", PLAN_COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// Validating decomposer over a [`GoalAnalyzer`].
pub struct Decomposer {
    analyzer: Arc<dyn GoalAnalyzer>,
}

impl Decomposer {
    pub fn new(analyzer: Arc<dyn GoalAnalyzer>) -> Self {
        Self { analyzer }
    }

    /// Decompose `goal` into a validated plan.
    ///
    /// Failure modes are kept distinct:
    /// - [`PlanError::Analysis`]: the capability itself failed;
    /// - [`PlanError::MalformedDecomposition`]: the response parsed but
    ///   violates the task-tree contract (missing fields, duplicate IDs,
    ///   unknown or self dependencies);
    /// - [`PlanError::DepthExceeded`] / [`PlanError::FanOutExceeded`]: hard
    ///   limits from the config, never silent truncation;
    /// - [`PlanError::CycleDetected`]: carries the cycle path;
    /// - [`PlanError::Cancelled`]: the token fired, no partial plan returned.
    pub async fn decompose(&self, goal: &str, config: &PlannerConfig) -> Result<Plan> {
        self.decompose_with_cancel(goal, config, CancellationToken::new())
            .await
    }

    pub async fn decompose_with_cancel(
        &self,
        goal: &str,
        config: &PlannerConfig,
        cancel: CancellationToken,
    ) -> Result<Plan> {
        config.validate()?;

        if cancel.is_cancelled() {
            return Err(PlanError::Cancelled);
        }

        debug!(goal, "invoking goal analysis");
        let response = tokio::select! {
            res = self.analyzer.analyze(goal) => {
                res.map_err(|source| PlanError::Analysis { source })?
            }
            () = cancel.cancelled() => return Err(PlanError::Cancelled),
        };

        let raw: RawDecomposition = serde_json::from_value(response)
            .map_err(|err| PlanError::MalformedDecomposition(err.to_string()))?;

        if raw.tasks.is_empty() {
            return Err(PlanError::MalformedDecomposition(
                "analyzer proposed no tasks".to_string(),
            ));
        }

        enforce_limits(&raw, config)?;

        let tasks: Vec<Task> = raw.tasks.iter().map(convert_spec).collect();
        let plan = Plan::new(next_plan_id(), goal)
            .with_strategy(config.strategy)
            .with_tasks(tasks);

        plan.validate_structure().map_err(|err| match err {
            // Structural problems here come from the untrusted response, so
            // they are decomposition errors rather than caller mistakes.
            PlanError::InvalidPlan(msg) => PlanError::MalformedDecomposition(msg),
            other => other,
        })?;
        dag::validate_acyclic(&plan)?;

        info!(
            plan = %plan.id,
            tasks = plan.tasks.len(),
            strategy = plan.strategy.as_str(),
            "decomposed goal into plan"
        );

        Ok(plan)
    }
}

/// Enforce `max_depth` (subtask nesting, goal as implicit root) and
/// `max_subtasks` (per-task fan-out; the top-level list counts as the root's
/// fan-out). Exceeding either is a hard validation failure.
fn enforce_limits(raw: &RawDecomposition, config: &PlannerConfig) -> Result<()> {
    if raw.tasks.len() > config.max_subtasks {
        return Err(PlanError::FanOutExceeded {
            task: "<root>".to_string(),
            count: raw.tasks.len(),
            max_subtasks: config.max_subtasks,
        });
    }

    for spec in &raw.tasks {
        let depth = spec.depth();
        if depth > config.max_depth {
            return Err(PlanError::DepthExceeded {
                depth,
                max_depth: config.max_depth,
            });
        }
        check_fan_out(spec, config.max_subtasks)?;
    }

    Ok(())
}

fn check_fan_out(spec: &RawTaskSpec, max_subtasks: usize) -> Result<()> {
    if spec.subtasks.len() > max_subtasks {
        return Err(PlanError::FanOutExceeded {
            task: spec.id.clone(),
            count: spec.subtasks.len(),
            max_subtasks,
        });
    }
    for sub in &spec.subtasks {
        check_fan_out(sub, max_subtasks)?;
    }
    Ok(())
}

fn convert_spec(spec: &RawTaskSpec) -> Task {
    let mut task = Task::new(&spec.id, &spec.description);
    task.task_type = spec.task_type.unwrap_or(TaskType::Action);
    task.dependencies = spec.dependencies.clone();
    task.subtasks = spec.subtasks.iter().map(convert_spec).collect();
    task.complexity = sanitize_complexity(&spec.id, spec.complexity);
    task
}

fn sanitize_complexity(task_id: &str, complexity: Option<u8>) -> Option<u8> {
    match complexity {
        Some(score) if (1..=10).contains(&score) => Some(score),
        Some(score) => {
            // Advisory metadata must never gate success, so a bad score is
            // dropped rather than rejected.
            warn!(task = %task_id, score, "complexity score outside 1..=10; ignoring");
            None
        }
        None => None,
    }
}

/// Optional strategy pre-selection from decomposition shape: suggest
/// parallel execution when the plan has real width and non-trivial advisory
/// complexity; otherwise keep the configured strategy.
pub fn preselect_strategy(plan: &Plan, config: &PlannerConfig) -> Strategy {
    let widest_wave = dag::wave_grouping(plan)
        .map(|waves| waves.iter().map(Vec::len).max().unwrap_or(0))
        .unwrap_or(0);

    let scores: Vec<u8> = plan.tasks.iter().filter_map(|t| t.complexity).collect();
    let mean_complexity = if scores.is_empty() {
        0.0
    } else {
        scores.iter().map(|&s| f64::from(s)).sum::<f64>() / scores.len() as f64
    };

    if widest_wave > 1 && mean_complexity >= 5.0 {
        Strategy::Parallel
    } else {
        config.strategy
    }
}
