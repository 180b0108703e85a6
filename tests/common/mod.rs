#![allow(dead_code)]

pub mod fakes;

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt};

use planweave::plan::{Plan, Task};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// A task depending on the given IDs.
pub fn task(id: &str, deps: &[&str]) -> Task {
    Task::new(id, format!("work for {id}")).with_dependencies(deps.iter().copied())
}

/// `n` tasks with no dependencies, named `t0..t{n-1}`.
pub fn independent_tasks(n: usize) -> Vec<Task> {
    (0..n).map(|i| Task::new(format!("t{i}"), "independent work")).collect()
}

/// Diamond graph: a -> {b, c} -> d.
pub fn diamond_plan() -> Plan {
    Plan::new("diamond", "diamond goal").with_tasks(vec![
        task("a", &[]),
        task("b", &["a"]),
        task("c", &["a"]),
        task("d", &["b", "c"]),
    ])
}
