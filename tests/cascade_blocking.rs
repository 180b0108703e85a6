// tests/cascade_blocking.rs

mod common;

use std::error::Error;
use std::time::Duration;

use tokio::time::timeout;

use planweave::config::PlannerConfig;
use planweave::engine::Executor;
use planweave::plan::{Plan, Strategy, TaskStatus};
use planweave::report::{EventKind, PlanStatus};

use common::fakes::FailingExecutor;
use common::{init_tracing, task};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn failure_blocks_all_transitive_dependents() -> TestResult {
    init_tracing();

    // x -> y -> z; x fails, both downstream tasks must be blocked.
    let mut plan = Plan::new("p", "chain").with_tasks(vec![
        task("x", &[]),
        task("y", &["x"]),
        task("z", &["y"]),
    ]);

    let executor = Executor::new(FailingExecutor::new(&["x"]), PlannerConfig::default());
    let result = timeout(Duration::from_secs(3), executor.execute(&mut plan)).await??;

    assert_eq!(plan.task("x").map(|t| t.status), Some(TaskStatus::Failed));
    assert_eq!(plan.task("y").map(|t| t.status), Some(TaskStatus::Blocked));
    assert_eq!(plan.task("z").map(|t| t.status), Some(TaskStatus::Blocked));

    // Blocked counts as failed in metrics but contributes no duration.
    assert_eq!(result.metrics.task_count, 3);
    assert_eq!(result.metrics.failed_task_count, 3);
    assert_eq!(result.metrics.success_rate, 0.0);
    assert_eq!(result.status, PlanStatus::Failed);

    // Blocked tasks record the upstream cause and never ran.
    let y = plan.task("y").ok_or("missing y")?;
    assert!(y.error.as_deref().is_some_and(|e| e.contains("x")));
    assert!(y.started_at.is_none());
    Ok(())
}

#[tokio::test]
async fn independent_branch_continues_after_failure() -> TestResult {
    init_tracing();

    // Two branches off nothing: x -> y fails out, a -> b succeeds.
    let mut plan = Plan::new("p", "branches")
        .with_strategy(Strategy::Parallel)
        .with_tasks(vec![
            task("x", &[]),
            task("y", &["x"]),
            task("a", &[]),
            task("b", &["a"]),
        ]);

    let executor = Executor::new(FailingExecutor::new(&["x"]), PlannerConfig::default());
    let result = timeout(Duration::from_secs(3), executor.execute(&mut plan)).await??;

    assert_eq!(plan.task("x").map(|t| t.status), Some(TaskStatus::Failed));
    assert_eq!(plan.task("y").map(|t| t.status), Some(TaskStatus::Blocked));
    assert_eq!(plan.task("a").map(|t| t.status), Some(TaskStatus::Completed));
    assert_eq!(plan.task("b").map(|t| t.status), Some(TaskStatus::Completed));

    assert_eq!(result.status, PlanStatus::Completed);
    assert_eq!(result.metrics.failed_task_count, 2);
    assert!((result.metrics.success_rate - 0.5).abs() < 1e-9);
    Ok(())
}

#[tokio::test]
async fn task_failed_event_lists_the_blocked_set() -> TestResult {
    init_tracing();

    let mut plan = Plan::new("p", "fan").with_tasks(vec![
        task("root", &[]),
        task("left", &["root"]),
        task("right", &["root"]),
    ]);

    let executor = Executor::new(FailingExecutor::new(&["root"]), PlannerConfig::default());
    let result = timeout(Duration::from_secs(3), executor.execute(&mut plan)).await??;

    let failed = result
        .timeline
        .iter()
        .find(|e| e.kind == EventKind::TaskFailed)
        .ok_or("no task_failed event")?;
    assert_eq!(failed.metadata.get("task").map(String::as_str), Some("root"));

    let blocked = failed.metadata.get("blocked").cloned().unwrap_or_default();
    let mut blocked: Vec<&str> = blocked.split(',').filter(|s| !s.is_empty()).collect();
    blocked.sort_unstable();
    assert_eq!(blocked, vec!["left", "right"]);
    Ok(())
}

#[tokio::test]
async fn blocked_tasks_are_excluded_from_average_duration() -> TestResult {
    init_tracing();

    let mut plan = Plan::new("p", "chain").with_tasks(vec![
        task("ok", &[]),
        task("bad", &["ok"]),
        task("never", &["bad"]),
    ]);

    let work = FailingExecutor::new(&["bad"]);
    let executor = Executor::new(work, PlannerConfig::default());
    let result = timeout(Duration::from_secs(3), executor.execute(&mut plan)).await??;

    // Only "ok" and "bad" actually ran; "never" is blocked with no duration.
    assert_eq!(plan.task("never").map(|t| t.status), Some(TaskStatus::Blocked));
    assert!(plan.task("never").and_then(|t| t.duration()).is_none());
    assert_eq!(result.metrics.failed_task_count, 2);
    Ok(())
}
