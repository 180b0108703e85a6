// tests/parallel_bound.rs

mod common;

use std::error::Error;
use std::time::Duration;

use tokio::time::timeout;

use planweave::config::PlannerConfig;
use planweave::engine::Executor;
use planweave::plan::{Plan, Strategy};
use planweave::report::{EventKind, PlanStatus};

use common::fakes::ConcurrencyProbe;
use common::{independent_tasks, init_tracing};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn in_flight_tasks_never_exceed_max_parallel() -> TestResult {
    init_tracing();

    let mut plan = Plan::new("p", "bounded fan-out")
        .with_strategy(Strategy::Parallel)
        .with_tasks(independent_tasks(10));

    let probe = ConcurrencyProbe::new(Duration::from_millis(10));
    let config = PlannerConfig {
        max_parallel: 2,
        ..PlannerConfig::default()
    };
    let executor = Executor::new(probe.clone(), config);
    let result = timeout(Duration::from_secs(5), executor.execute(&mut plan)).await??;

    assert_eq!(result.status, PlanStatus::Completed);
    assert_eq!(result.metrics.task_count, 10);
    assert!(
        probe.max_observed() <= 2,
        "observed {} concurrent executions",
        probe.max_observed()
    );
    Ok(())
}

#[tokio::test]
async fn freed_slots_are_refilled_within_a_wave() -> TestResult {
    init_tracing();

    let mut plan = Plan::new("p", "slot reuse")
        .with_strategy(Strategy::Parallel)
        .with_tasks(independent_tasks(6));

    let probe = ConcurrencyProbe::new(Duration::from_millis(10));
    let config = PlannerConfig {
        max_parallel: 3,
        ..PlannerConfig::default()
    };
    let executor = Executor::new(probe.clone(), config);
    let result = timeout(Duration::from_secs(5), executor.execute(&mut plan)).await??;

    // A single 6-wide wave with 3 slots still finishes everything.
    assert_eq!(result.metrics.task_count, 6);
    assert_eq!(result.metrics.success_rate, 1.0);
    assert!(probe.max_observed() <= 3);
    Ok(())
}

#[tokio::test]
async fn timeline_started_minus_terminal_stays_within_bound() -> TestResult {
    init_tracing();

    let mut plan = Plan::new("p", "timeline bound")
        .with_strategy(Strategy::Parallel)
        .with_tasks(independent_tasks(8));

    let config = PlannerConfig {
        max_parallel: 2,
        ..PlannerConfig::default()
    };
    let executor = Executor::new(ConcurrencyProbe::new(Duration::from_millis(5)), config);
    let result = timeout(Duration::from_secs(5), executor.execute(&mut plan)).await??;

    // Replaying the timeline, the number of started-but-not-terminal tasks
    // must never exceed the bound.
    let mut open = 0usize;
    for event in &result.timeline {
        match event.kind {
            EventKind::TaskStarted => {
                open += 1;
                assert!(open <= 2, "timeline shows {open} tasks in flight");
            }
            EventKind::TaskCompleted | EventKind::TaskFailed => open -= 1,
            _ => {}
        }
    }
    assert_eq!(open, 0);
    Ok(())
}

#[tokio::test]
async fn sequential_strategy_runs_one_at_a_time_regardless_of_bound() -> TestResult {
    init_tracing();

    let mut plan = Plan::new("p", "still sequential")
        .with_strategy(Strategy::Sequential)
        .with_tasks(independent_tasks(5));

    let probe = ConcurrencyProbe::new(Duration::from_millis(5));
    let config = PlannerConfig {
        max_parallel: 4,
        ..PlannerConfig::default()
    };
    let executor = Executor::new(probe.clone(), config);
    timeout(Duration::from_secs(5), executor.execute(&mut plan)).await??;

    assert_eq!(probe.max_observed(), 1);
    Ok(())
}
