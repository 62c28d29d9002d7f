//! Pipeline facade: wires stores, queue workers, and status fan-out.

use std::path::Path;
use std::sync::Arc;

use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::models::{ErrorReport, TaskCreated, TaskStatusResponse};
use crate::services::file_processing::FileProcessingService;
use crate::services::job_queue::{JobQueue, QueueHistory};
use crate::services::reconciliation::ReconciliationService;
use crate::services::status_fanout::StatusFanout;
use crate::services::task_service::TaskService;
use crate::store::memory::{InMemoryReservationStore, InMemoryTaskStore};
use crate::store::{ReservationStore, TaskStore};

/// Accepted upload extension.
const SUPPORTED_EXTENSION: &str = "csv";

/// The assembled ingestion pipeline.
///
/// Construction spawns the queue consumer workers; the pipeline accepts
/// uploads synchronously and processes them asynchronously.
pub struct IngestPipeline {
    task_service: Arc<TaskService>,
    queue: JobQueue,
    fanout: Arc<StatusFanout>,
}

impl IngestPipeline {
    /// Assemble the pipeline on the given stores.
    pub fn new(
        tasks: Arc<dyn TaskStore>,
        reservations: Arc<dyn ReservationStore>,
        config: IngestConfig,
    ) -> Self {
        let fanout = Arc::new(StatusFanout::new());
        let task_service = Arc::new(TaskService::new(tasks, Arc::clone(&fanout)));
        let reconciliation = Arc::new(ReconciliationService::new(reservations));
        let processor = Arc::new(FileProcessingService::new(
            Arc::clone(&task_service),
            reconciliation,
            config.max_errors,
        ));
        let queue = JobQueue::start(
            processor,
            config.worker_count,
            config.retry.clone(),
            config.keep_completed,
            config.keep_failed,
        );
        Self {
            task_service,
            queue,
            fanout,
        }
    }

    /// Assemble the pipeline on in-memory stores.
    #[must_use]
    pub fn in_memory(config: IngestConfig) -> Self {
        Self::new(
            Arc::new(InMemoryTaskStore::new()),
            Arc::new(InMemoryReservationStore::new()),
            config,
        )
    }

    /// Accept an uploaded file: create a `PENDING` task and enqueue it.
    ///
    /// The file must already sit on durable local storage and carry a
    /// supported extension.
    pub async fn create_task(&self, file_path: &str) -> Result<TaskCreated, IngestError> {
        let extension = Path::new(file_path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        if !extension.eq_ignore_ascii_case(SUPPORTED_EXTENSION) {
            return Err(IngestError::WrongFileExtension(file_path.to_string()));
        }

        let task = self.task_service.create(file_path).await?;
        self.queue.enqueue(&task)?;
        Ok(TaskCreated { task_id: task.id })
    }

    /// Current status snapshot for a task.
    pub async fn get_task_status(&self, task_id: &str) -> Result<TaskStatusResponse, IngestError> {
        self.task_service.get_task_status(task_id).await
    }

    /// Full error report for a task.
    pub async fn get_task_report(&self, task_id: &str) -> Result<Vec<ErrorReport>, IngestError> {
        self.task_service.get_task_report(task_id).await
    }

    /// Push the current status snapshot to the task's subscribers.
    pub async fn notify_task_status_update(&self, task_id: &str) -> Result<(), IngestError> {
        let snapshot = self.task_service.get_task_status(task_id).await?;
        self.fanout.notify(snapshot).await;
        Ok(())
    }

    /// Subscription registry for live status updates.
    #[must_use]
    pub fn fanout(&self) -> &Arc<StatusFanout> {
        &self.fanout
    }

    /// Diagnostic history of recent queue outcomes.
    #[must_use]
    pub fn queue_history(&self) -> &Arc<QueueHistory> {
        self.queue.history()
    }
}
