//! Job queue moving tasks from upload time to processing time.
//!
//! The producer enqueues a task reference; a pool of consumer workers
//! dequeues one job per worker slot and runs the full pipeline. Delivery
//! retries are an explicit per-job state machine (attempt count plus a
//! backoff deadline) and are orthogonal to the task-domain terminal
//! states: a redelivered task simply overwrites its status with the
//! latest outcome. A bounded history of recent completed and failed jobs
//! is kept for diagnostics.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use crate::error::IngestError;
use crate::models::Task;
use crate::services::file_processing::FileProcessingService;

/// One unit of queued work: a reference to the task, not a copy that is
/// later refreshed.
#[derive(Debug, Clone, Serialize)]
pub struct JobPayload {
    pub task_id: Uuid,
    pub file_path: String,
    pub enqueued_at: DateTime<Utc>,
    /// 1-based delivery attempt.
    pub attempt: u32,
}

/// Retry policy for failed job deliveries.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total delivery attempts before a job lands in the failed history.
    pub max_attempts: u32,
    /// First backoff delay; doubles on each further attempt.
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_millis(2000),
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff before redelivering after `attempt` failed.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.backoff_base * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// A job that exhausted its retry budget.
#[derive(Debug, Clone, Serialize)]
pub struct FailedJob {
    pub job: JobPayload,
    pub error: String,
}

/// Bounded record of recent job outcomes.
pub struct QueueHistory {
    completed: Mutex<VecDeque<JobPayload>>,
    failed: Mutex<VecDeque<FailedJob>>,
    keep_completed: usize,
    keep_failed: usize,
}

impl QueueHistory {
    fn new(keep_completed: usize, keep_failed: usize) -> Self {
        Self {
            completed: Mutex::new(VecDeque::new()),
            failed: Mutex::new(VecDeque::new()),
            keep_completed,
            keep_failed,
        }
    }

    async fn record_completed(&self, job: JobPayload) {
        let mut completed = self.completed.lock().await;
        completed.push_back(job);
        while completed.len() > self.keep_completed {
            completed.pop_front();
        }
    }

    async fn record_failed(&self, job: JobPayload, error: String) {
        let mut failed = self.failed.lock().await;
        failed.push_back(FailedJob { job, error });
        while failed.len() > self.keep_failed {
            failed.pop_front();
        }
    }

    /// Most recent successfully delivered jobs, oldest first.
    pub async fn recent_completed(&self) -> Vec<JobPayload> {
        self.completed.lock().await.iter().cloned().collect()
    }

    /// Most recent permanently failed jobs, oldest first.
    pub async fn recent_failed(&self) -> Vec<FailedJob> {
        self.failed.lock().await.iter().cloned().collect()
    }
}

/// Producer handle plus worker pool for task processing.
pub struct JobQueue {
    tx: mpsc::UnboundedSender<JobPayload>,
    history: Arc<QueueHistory>,
}

impl JobQueue {
    /// Start the consumer worker pool and return the producer handle.
    ///
    /// Workers process different tasks in parallel; rows within one task
    /// stay strictly sequential inside the processor.
    pub fn start(
        processor: Arc<FileProcessingService>,
        workers: usize,
        retry: RetryPolicy,
        keep_completed: usize,
        keep_failed: usize,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<JobPayload>();
        let rx = Arc::new(Mutex::new(rx));
        let history = Arc::new(QueueHistory::new(keep_completed, keep_failed));

        for worker in 0..workers.max(1) {
            tokio::spawn(worker_loop(
                worker,
                Arc::clone(&rx),
                tx.clone(),
                Arc::clone(&processor),
                retry.clone(),
                Arc::clone(&history),
            ));
        }

        Self { tx, history }
    }

    /// Enqueue a task for processing (first delivery attempt).
    pub fn enqueue(&self, task: &Task) -> Result<(), IngestError> {
        let payload = JobPayload {
            task_id: task.id,
            file_path: task.file_path.clone(),
            enqueued_at: Utc::now(),
            attempt: 1,
        };
        self.tx
            .send(payload)
            .map_err(|e| IngestError::Queue(e.to_string()))?;
        tracing::debug!(task_id = %task.id, "Task enqueued");
        Ok(())
    }

    /// Diagnostic history of recent job outcomes.
    #[must_use]
    pub fn history(&self) -> &Arc<QueueHistory> {
        &self.history
    }
}

async fn worker_loop(
    worker: usize,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<JobPayload>>>,
    tx: mpsc::UnboundedSender<JobPayload>,
    processor: Arc<FileProcessingService>,
    retry: RetryPolicy,
    history: Arc<QueueHistory>,
) {
    loop {
        // Lock only while dequeuing so other workers keep pulling.
        let job = { rx.lock().await.recv().await };
        let Some(job) = job else {
            tracing::debug!(worker, "Queue closed, worker stopping");
            break;
        };

        tracing::debug!(
            worker,
            task_id = %job.task_id,
            attempt = job.attempt,
            "Processing job"
        );

        match processor.process_task(job.task_id, &job.file_path).await {
            Ok(()) => {
                tracing::debug!(worker, task_id = %job.task_id, "Job completed");
                history.record_completed(job).await;
            }
            Err(e) => {
                tracing::error!(
                    worker,
                    task_id = %job.task_id,
                    attempt = job.attempt,
                    error = %e,
                    "Job failed"
                );
                if job.attempt < retry.max_attempts {
                    let delay = retry.backoff_delay(job.attempt);
                    let redelivery = JobPayload {
                        attempt: job.attempt + 1,
                        ..job
                    };
                    let tx = tx.clone();
                    // Redeliver after the backoff deadline without tying
                    // up this worker slot.
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        if tx.send(redelivery).is_err() {
                            tracing::warn!("Queue closed before redelivery");
                        }
                    });
                } else {
                    tracing::warn!(
                        task_id = %job.task_id,
                        attempts = job.attempt,
                        "Retry budget exhausted, recording failed job"
                    );
                    history.record_failed(job, e.to_string()).await;
                }
            }
        }
    }
}
