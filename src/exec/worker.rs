// src/exec/worker.rs

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::exec::WorkExecutor;
use crate::plan::Task;

/// Result of one task attempt, reported back to the run controller over the
/// single results channel. The controller is the only writer of task status,
/// so workers carry timing here instead of touching the plan.
#[derive(Debug)]
pub struct TaskCompletion {
    pub task_id: String,
    /// `Ok(result)` or `Err(error text)` recorded verbatim on the task.
    pub outcome: Result<String, String>,
    pub started_at: Instant,
    pub ended_at: Instant,
}

/// Run one task attempt on its own Tokio task.
///
/// The worker owns a clone of the task, awaits the work-execution capability
/// once and sends exactly one [`TaskCompletion`]. A closed results channel
/// means the controller already returned; the completion is dropped.
pub fn spawn_worker(
    executor: Arc<dyn WorkExecutor>,
    task: Task,
    cancel: CancellationToken,
    results_tx: mpsc::Sender<TaskCompletion>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let started_at = Instant::now();
        debug!(task = %task.id, "worker starting task attempt");

        let outcome = match executor.execute(&task, cancel).await {
            Ok(result) => {
                info!(task = %task.id, "task attempt succeeded");
                Ok(result)
            }
            Err(err) => {
                info!(task = %task.id, error = %err, "task attempt failed");
                Err(format!("{err:#}"))
            }
        };

        let completion = TaskCompletion {
            task_id: task.id.clone(),
            outcome,
            started_at,
            ended_at: Instant::now(),
        };

        if results_tx.send(completion).await.is_err() {
            error!(
                task = %task.id,
                "results channel closed before completion could be reported"
            );
        }
    })
}
