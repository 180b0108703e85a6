// src/lib.rs

//! planweave: the planning and execution layer of an AI-agent stack.
//!
//! Given a high-level goal, produce a directed task graph through an
//! external goal-analysis capability, then run it to completion under a
//! sequential, parallel or adaptive strategy with bounded concurrency,
//! blocked-cascade failure handling and optional early goal satisfaction.
//!
//! The two capabilities planweave consumes are trait seams:
//! [`decompose::GoalAnalyzer`] (goal in, proposed task tree out) and
//! [`exec::WorkExecutor`] (task description in, result out). Nothing in this
//! crate performs LLM or tool calls itself.

pub mod config;
pub mod dag;
pub mod decompose;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod goal;
pub mod logging;
pub mod plan;
pub mod report;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

pub use config::PlannerConfig;
pub use decompose::{Decomposer, GoalAnalyzer};
pub use engine::Executor;
pub use errors::{PlanError, Result};
pub use exec::WorkExecutor;
pub use goal::{GoalObserver, PlanProgressObserver};
pub use plan::{
    CriterionOp, GoalCriterion, GoalState, Plan, Strategy, Task, TaskStatus, TaskType,
};
pub use report::{EventKind, PlanEvent, PlanMetrics, PlanResult, PlanStatus};

/// High-level entry surface wiring the decomposer and the run controller
/// behind one configuration.
pub struct Planner {
    decomposer: Decomposer,
    executor: Executor,
    config: PlannerConfig,
}

impl Planner {
    pub fn new(
        analyzer: Arc<dyn GoalAnalyzer>,
        work: Arc<dyn WorkExecutor>,
        config: PlannerConfig,
    ) -> Self {
        Self {
            decomposer: Decomposer::new(analyzer),
            executor: Executor::new(work, config.clone()),
            config,
        }
    }

    /// Supply a custom goal observer instead of the built-in progress
    /// counters.
    pub fn with_observer(mut self, observer: Arc<dyn GoalObserver>) -> Self {
        self.executor = self.executor.with_observer(observer);
        self
    }

    /// Turn a goal description into a validated plan.
    pub async fn decompose(&self, goal: &str) -> Result<Plan> {
        self.decomposer.decompose(goal, &self.config).await
    }

    /// Run a plan (decomposed or hand-built) to completion.
    pub async fn execute(&self, plan: &mut Plan) -> Result<PlanResult> {
        self.executor.execute(plan).await
    }

    /// Run a plan under the caller's cancellation token. The configured
    /// timeout, if any, rides on the same token.
    pub async fn execute_with_cancel(
        &self,
        plan: &mut Plan,
        cancel: CancellationToken,
    ) -> Result<PlanResult> {
        self.executor.execute_with_cancel(plan, cancel).await
    }

    /// Convenience composition: decompose the goal, then execute the
    /// resulting plan.
    pub async fn plan_and_execute(&self, goal: &str) -> Result<PlanResult> {
        self.plan_and_execute_with_cancel(goal, CancellationToken::new())
            .await
    }

    pub async fn plan_and_execute_with_cancel(
        &self,
        goal: &str,
        cancel: CancellationToken,
    ) -> Result<PlanResult> {
        let mut plan = self
            .decomposer
            .decompose_with_cancel(goal, &self.config, cancel.clone())
            .await?;
        self.executor.execute_with_cancel(&mut plan, cancel).await
    }
}
