// src/engine/runtime.rs

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::PlannerConfig;
use crate::dag;
use crate::engine::adaptive::{AdaptiveController, Mode};
use crate::errors::{PlanError, Result};
use crate::exec::{TaskCompletion, WorkExecutor, spawn_worker};
use crate::goal::{GoalEvaluator, GoalObserver, PlanProgressObserver};
use crate::plan::{GoalState, Plan, Strategy, TaskStatus};
use crate::report::{EventKind, PlanEvent, PlanMetrics, PlanResult, PlanStatus};

/// The run controller: selects a strategy, drives the plan's tasks through
/// the work-execution capability, consults the goal evaluator and assembles
/// the final [`PlanResult`].
///
/// Workers report back through a single results channel consumed exclusively
/// here; the controller is the only writer of task status and of the
/// timeline, so the plan itself needs no locking.
pub struct Executor {
    work: Arc<dyn WorkExecutor>,
    observer: Arc<dyn GoalObserver>,
    config: PlannerConfig,
}

impl Executor {
    pub fn new(work: Arc<dyn WorkExecutor>, config: PlannerConfig) -> Self {
        Self {
            work,
            observer: Arc::new(PlanProgressObserver),
            config,
        }
    }

    /// Replace the built-in progress observer with a custom one.
    pub fn with_observer(mut self, observer: Arc<dyn GoalObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub async fn execute(&self, plan: &mut Plan) -> Result<PlanResult> {
        self.execute_with_cancel(plan, CancellationToken::new())
            .await
    }

    /// Run `plan` to natural completion, goal satisfaction or cancellation.
    ///
    /// Returns `Err` only when no result could be produced at all (invalid
    /// config, structural problem, cancelled before any task started).
    /// Partial failure is reported through the result's status and metrics,
    /// never through the returned error.
    pub async fn execute_with_cancel(
        &self,
        plan: &mut Plan,
        cancel: CancellationToken,
    ) -> Result<PlanResult> {
        self.config.validate()?;
        // Defensive re-check: the plan may have been hand-built without
        // going through the decomposer.
        plan.validate_structure()?;
        dag::validate_acyclic(plan)?;

        if cancel.is_cancelled() {
            return Err(PlanError::Cancelled);
        }

        // The timeout deadline rides on a child of the caller's token, so
        // expiry and caller cancellation are indistinguishable downstream.
        let cancel = cancel.child_token();
        if let Some(timeout) = self.config.timeout() {
            let deadline_token = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                deadline_token.cancel();
            });
        }

        let initial_mode = match plan.strategy {
            Strategy::Sequential | Strategy::Adaptive => Mode::Sequential,
            Strategy::Parallel => Mode::Parallel,
        };
        let adaptive = AdaptiveController::new(
            plan.strategy == Strategy::Adaptive,
            initial_mode,
            self.config.adaptive_threshold,
        );

        let (results_tx, results_rx) = mpsc::channel::<TaskCompletion>(64);

        info!(
            plan = %plan.id,
            tasks = plan.tasks.len(),
            strategy = plan.strategy.as_str(),
            "starting plan execution"
        );

        let run = RunLoop {
            goal_state: plan.goal_state.take(),
            plan,
            work: Arc::clone(&self.work),
            evaluator: GoalEvaluator::new(Arc::clone(&self.observer)),
            max_parallel: self.config.max_parallel,
            goal_check_interval: self.config.goal_check_interval,
            cancel,
            results_tx,
            results_rx,
            adaptive,
            started: Instant::now(),
            completed: HashSet::new(),
            timeline: Vec::new(),
            run_durations: Vec::new(),
            in_flight: 0,
            dispatched: 0,
            completed_since_check: 0,
            goal_met: false,
            cancelled: false,
        };

        run.run().await
    }
}

/// Per-run mutable state. Owns the plan borrow for the duration of the run;
/// the goal state is taken out of the plan so it can be evaluated against it
/// and is restored before returning.
struct RunLoop<'a> {
    plan: &'a mut Plan,
    goal_state: Option<GoalState>,
    work: Arc<dyn WorkExecutor>,
    evaluator: GoalEvaluator,
    max_parallel: usize,
    goal_check_interval: usize,
    cancel: CancellationToken,
    results_tx: mpsc::Sender<TaskCompletion>,
    results_rx: mpsc::Receiver<TaskCompletion>,
    adaptive: AdaptiveController,
    started: Instant,
    completed: HashSet<String>,
    timeline: Vec<PlanEvent>,
    run_durations: Vec<Duration>,
    in_flight: usize,
    dispatched: usize,
    completed_since_check: usize,
    goal_met: bool,
    cancelled: bool,
}

impl RunLoop<'_> {
    async fn run(mut self) -> Result<PlanResult> {
        self.push_event(
            PlanEvent::new(EventKind::StrategyInitialized, self.started.elapsed())
                .with("strategy", self.plan.strategy.as_str())
                .with("mode", self.adaptive.mode().as_str()),
        );

        loop {
            if self.cancel.is_cancelled() {
                self.cancelled = true;
                break;
            }
            if self.goal_met {
                break;
            }

            let ready = self.ready_ids();
            if ready.is_empty() {
                // With an acyclic plan every non-ready pending task has a
                // failed chain and was already marked Blocked; nothing left.
                break;
            }

            let boundary_started = Instant::now();
            let completed_before = self.completed.len();

            match self.adaptive.mode() {
                Mode::Sequential => self.run_single(&ready[0]).await,
                Mode::Parallel => self.run_wave(ready).await,
            }

            let boundary_completed = self.completed.len() - completed_before;
            self.adaptive
                .record_boundary(boundary_completed, boundary_started.elapsed());

            if !self.goal_met && !self.cancelled && !self.cancel.is_cancelled() {
                let next_width = self.ready_ids().len();
                // No remaining work means no boundary to switch at.
                if next_width > 0
                    && let Some(from) = self.adaptive.evaluate_switch(next_width)
                {
                    let event =
                        PlanEvent::new(EventKind::StrategySwitched, self.started.elapsed())
                            .with("from", from.as_str())
                            .with("to", self.adaptive.mode().as_str());
                    self.push_event(event);
                }
            }
        }

        if self.cancelled {
            if self.dispatched == 0 {
                return Err(PlanError::Cancelled);
            }
        } else if !self.goal_met {
            // End-of-run goal check; also the only check when the interval
            // is zero.
            self.check_goal();
        }

        Ok(self.finish())
    }

    /// One sequential boundary: dispatch the single topologically-next ready
    /// task and wait for its terminal state.
    async fn run_single(&mut self, id: &str) {
        self.dispatch(id);
        while self.in_flight > 0 {
            self.receive_completion().await;
        }
    }

    /// One parallel boundary: the whole ready set is a wave; at most
    /// `max_parallel` members are in flight at once, the rest queue for a
    /// free slot. The wave ends when every member is terminal (members
    /// blocked by an in-wave failure count as terminal and are skipped),
    /// so the next wave sees all cascade effects.
    async fn run_wave(&mut self, ready: Vec<String>) {
        debug!(wave = ?ready, "starting wave");
        let mut queue: VecDeque<String> = ready.into();

        loop {
            let stop_dispatch = self.goal_met || self.cancel.is_cancelled();
            if !stop_dispatch {
                while self.in_flight < self.max_parallel {
                    match self.next_pending(&mut queue) {
                        Some(id) => self.dispatch(&id),
                        None => break,
                    }
                }
            }

            if self.in_flight == 0 {
                break;
            }
            // In-flight tasks are allowed to finish even when dispatch has
            // stopped; their executors received the cancellation token.
            self.receive_completion().await;
        }

        if self.cancel.is_cancelled() {
            self.cancelled = true;
        }
    }

    /// Pending tasks whose dependencies are all completed, in plan insertion
    /// order.
    fn ready_ids(&self) -> Vec<String> {
        dag::ready_tasks(self.plan, &self.completed)
            .iter()
            .map(|t| t.id.clone())
            .collect()
    }

    /// Pop queue entries until one is still Pending (cascades may have
    /// blocked members while they waited for a slot).
    fn next_pending(&mut self, queue: &mut VecDeque<String>) -> Option<String> {
        while let Some(id) = queue.pop_front() {
            let still_pending = self
                .plan
                .task(&id)
                .is_some_and(|t| t.status == TaskStatus::Pending);
            if still_pending {
                return Some(id);
            }
        }
        None
    }

    fn dispatch(&mut self, id: &str) {
        let Some(task) = self.plan.task_mut(id) else {
            warn!(task = %id, "dispatch requested for unknown task");
            return;
        };

        task.status = TaskStatus::Running;
        let snapshot = task.clone();

        debug!(task = %id, "dispatching task");
        self.push_event(
            PlanEvent::new(EventKind::TaskStarted, self.started.elapsed()).with("task", id),
        );

        spawn_worker(
            Arc::clone(&self.work),
            snapshot,
            self.cancel.clone(),
            self.results_tx.clone(),
        );
        self.in_flight += 1;
        self.dispatched += 1;
    }

    /// Consume one completion from the results channel and apply it. Only
    /// called with `in_flight > 0`, so a worker's send is always pending.
    async fn receive_completion(&mut self) {
        let Some(completion) = self.results_rx.recv().await else {
            // Cannot happen while we hold a sender; treat as a drained run.
            warn!("results channel closed unexpectedly");
            self.in_flight = 0;
            return;
        };
        self.in_flight -= 1;
        self.apply_completion(completion);
    }

    fn apply_completion(&mut self, completion: TaskCompletion) {
        let TaskCompletion {
            task_id,
            outcome,
            started_at,
            ended_at,
        } = completion;

        let elapsed = self.started.elapsed();
        let Some(task) = self.plan.task_mut(&task_id) else {
            warn!(task = %task_id, "completion for unknown task; ignoring");
            return;
        };

        task.started_at = Some(started_at);
        task.ended_at = Some(ended_at);
        self.run_durations.push(ended_at.duration_since(started_at));

        match outcome {
            Ok(result) => {
                task.status = TaskStatus::Completed;
                task.result = Some(result);
                info!(task = %task_id, "task completed");

                self.completed.insert(task_id.clone());
                self.push_event(
                    PlanEvent::new(EventKind::TaskCompleted, elapsed).with("task", &task_id),
                );

                self.completed_since_check += 1;
                if self.goal_check_interval > 0
                    && self.completed_since_check >= self.goal_check_interval
                {
                    self.check_goal();
                }
            }
            Err(error) => {
                task.status = TaskStatus::Failed;
                task.error = Some(error.clone());
                warn!(task = %task_id, error = %error, "task failed; blocking dependents");

                let blocked = self.block_dependents(&task_id);
                self.push_event(
                    PlanEvent::new(EventKind::TaskFailed, elapsed)
                        .with("task", &task_id)
                        .with("error", error)
                        .with("blocked", blocked.join(",")),
                );
            }
        }
    }

    /// Cascade: one graph traversal marks every pending transitive dependent
    /// of `failed_id` as Blocked. Independent branches are untouched and
    /// keep running.
    fn block_dependents(&mut self, failed_id: &str) -> Vec<String> {
        let graph = dag::DepGraph::from_plan(self.plan);
        let mut blocked = Vec::new();

        for id in graph.transitive_dependents(failed_id) {
            if let Some(task) = self.plan.task_mut(&id)
                && task.status == TaskStatus::Pending
            {
                task.status = TaskStatus::Blocked;
                task.error = Some(format!("blocked by failed dependency '{failed_id}'"));
                debug!(task = %id, failed = %failed_id, "task blocked by upstream failure");
                blocked.push(id);
            }
        }

        blocked
    }

    /// Evaluate goal criteria, emitting `goal_checked` and, on first full
    /// satisfaction, `goal_achieved`. After satisfaction no new tasks are
    /// dispatched; in-flight tasks finish normally.
    fn check_goal(&mut self) {
        let Some(goal_state) = self.goal_state.as_mut() else {
            return;
        };
        if self.goal_met {
            return;
        }

        self.completed_since_check = 0;
        let met = self.evaluator.evaluate(goal_state, self.plan);
        let elapsed = self.started.elapsed();
        self.timeline.push(
            PlanEvent::new(EventKind::GoalChecked, elapsed).with("met", met.to_string()),
        );

        if met {
            goal_state.met_at = Some(Instant::now());
            self.goal_met = true;
            info!(plan = %self.plan.id, "goal achieved; stopping dispatch");
            self.timeline
                .push(PlanEvent::new(EventKind::GoalAchieved, self.started.elapsed()));
        }
    }

    fn push_event(&mut self, event: PlanEvent) {
        self.timeline.push(event);
    }

    fn finish(mut self) -> PlanResult {
        self.plan.goal_state = self.goal_state.take();

        let terminal = self
            .plan
            .tasks
            .iter()
            .filter(|t| t.status.is_terminal())
            .count();
        let failed = self
            .plan
            .tasks
            .iter()
            .filter(|t| matches!(t.status, TaskStatus::Failed | TaskStatus::Blocked))
            .count();

        let status = if self.cancelled {
            PlanStatus::Cancelled
        } else if self.completed.is_empty() && failed > 0 {
            PlanStatus::Failed
        } else {
            PlanStatus::Completed
        };

        let final_strategy = match self.adaptive.mode() {
            Mode::Sequential => Strategy::Sequential,
            Mode::Parallel => Strategy::Parallel,
        };

        let metrics = PlanMetrics::compute(
            terminal,
            failed,
            self.started.elapsed(),
            &self.run_durations,
            final_strategy,
        );

        info!(
            plan = %self.plan.id,
            status = ?status,
            completed = self.completed.len(),
            failed,
            "plan execution finished"
        );

        PlanResult {
            plan_id: self.plan.id.clone(),
            status,
            goal_met: self.goal_met,
            metrics,
            timeline: self.timeline,
        }
    }
}
