// src/exec/mod.rs

//! Work-execution capability seam.
//!
//! The engine never performs a unit of work itself; it hands each task's
//! description to a [`WorkExecutor`] and treats the returned error as task
//! failure, not a system fault. Production implementations typically wrap an
//! LLM/tool pipeline; tests plug in fakes that complete instantly.

pub mod worker;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::plan::Task;

pub use worker::{TaskCompletion, spawn_worker};

/// Executes one atomic unit of work.
///
/// Synchronous from the engine's perspective (one call per task attempt,
/// awaited to completion). Implementations must honor the cancellation token
/// they are handed; the engine only stops *dispatching* on cancellation and
/// relies on in-flight calls to wind themselves down.
#[async_trait]
pub trait WorkExecutor: Send + Sync {
    async fn execute(&self, task: &Task, cancel: CancellationToken) -> anyhow::Result<String>;
}
