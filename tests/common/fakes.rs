//! Fake capability implementations for integration tests.
//!
//! These never touch an LLM or a tool; they complete (or fail) on their own
//! and let the tests observe what the engine dispatched.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use planweave::decompose::GoalAnalyzer;
use planweave::exec::WorkExecutor;
use planweave::plan::Task;

/// Succeeds after an optional fixed delay, recording execution order.
pub struct EchoExecutor {
    pub delay: Duration,
    pub executed: Mutex<Vec<String>>,
}

impl EchoExecutor {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            executed: Mutex::new(Vec::new()),
        })
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkExecutor for EchoExecutor {
    async fn execute(&self, task: &Task, _cancel: CancellationToken) -> anyhow::Result<String> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.executed.lock().unwrap().push(task.id.clone());
        Ok(format!("done: {}", task.id))
    }
}

/// Fails the listed task IDs, succeeds on everything else.
pub struct FailingExecutor {
    pub fail: HashSet<String>,
    pub delay: Duration,
}

impl FailingExecutor {
    pub fn new(fail: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            fail: fail.iter().map(|s| s.to_string()).collect(),
            delay: Duration::ZERO,
        })
    }
}

#[async_trait]
impl WorkExecutor for FailingExecutor {
    async fn execute(&self, task: &Task, _cancel: CancellationToken) -> anyhow::Result<String> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail.contains(&task.id) {
            anyhow::bail!("simulated failure for {}", task.id)
        }
        Ok(format!("done: {}", task.id))
    }
}

/// Tracks how many invocations run concurrently and the high-water mark.
pub struct ConcurrencyProbe {
    pub delay: Duration,
    current: AtomicUsize,
    max: AtomicUsize,
}

impl ConcurrencyProbe {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            current: AtomicUsize::new(0),
            max: AtomicUsize::new(0),
        })
    }

    pub fn max_observed(&self) -> usize {
        self.max.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkExecutor for ConcurrencyProbe {
    async fn execute(&self, task: &Task, _cancel: CancellationToken) -> anyhow::Result<String> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok(format!("done: {}", task.id))
    }
}

/// Completes the listed tasks quickly; everything else parks until the
/// cancellation token fires and then reports failure, the way a
/// well-behaved long work call winds down.
pub struct SlowUnlessListed {
    pub fast: HashSet<String>,
    pub fast_delay: Duration,
}

impl SlowUnlessListed {
    pub fn new(fast: &[&str], fast_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            fast: fast.iter().map(|s| s.to_string()).collect(),
            fast_delay,
        })
    }
}

#[async_trait]
impl WorkExecutor for SlowUnlessListed {
    async fn execute(&self, task: &Task, cancel: CancellationToken) -> anyhow::Result<String> {
        if self.fast.contains(&task.id) {
            tokio::time::sleep(self.fast_delay).await;
            return Ok(format!("done: {}", task.id));
        }

        tokio::select! {
            () = cancel.cancelled() => anyhow::bail!("cancelled: {}", task.id),
            () = tokio::time::sleep(Duration::from_secs(60)) => {
                Ok(format!("done: {}", task.id))
            }
        }
    }
}

/// Returns a fixed JSON payload from `analyze`.
pub struct StaticAnalyzer(pub Value);

#[async_trait]
impl GoalAnalyzer for StaticAnalyzer {
    async fn analyze(&self, _goal: &str) -> anyhow::Result<Value> {
        Ok(self.0.clone())
    }
}
