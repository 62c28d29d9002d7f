//! Task lifecycle management and status queries.
//!
//! Owns the `PENDING → IN_PROGRESS → {COMPLETED, FAILED}` state machine.
//! Every transition is a point update against the task store, which is
//! the sole authority on current state; the service caches nothing
//! between calls. Each applied transition pushes a status snapshot to the
//! fan-out registry.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::IngestError;
use crate::models::{ErrorReport, Task, TaskStatus, TaskStatusResponse};
use crate::services::status_fanout::StatusFanout;
use crate::store::{TaskStore, TaskUpdate};

pub struct TaskService {
    tasks: Arc<dyn TaskStore>,
    fanout: Arc<StatusFanout>,
}

impl TaskService {
    #[must_use]
    pub fn new(tasks: Arc<dyn TaskStore>, fanout: Arc<StatusFanout>) -> Self {
        Self { tasks, fanout }
    }

    /// Create a task in `PENDING` state.
    pub async fn create(&self, file_path: &str) -> Result<Task, IngestError> {
        let task = self.tasks.create(file_path).await?;
        tracing::debug!(task_id = %task.id, file_path, "Task created");
        Ok(task)
    }

    /// Current status snapshot for a task.
    ///
    /// Fails with [`IngestError::InvalidId`] on a malformed identifier and
    /// [`IngestError::TaskNotFound`] when no such task exists.
    pub async fn get_task_status(&self, task_id: &str) -> Result<TaskStatusResponse, IngestError> {
        let id = parse_task_id(task_id)?;
        let task = self
            .tasks
            .find_by_id(id)
            .await?
            .ok_or(IngestError::TaskNotFound(id))?;
        Ok(TaskStatusResponse::from(&task))
    }

    /// Full error report for a task.
    ///
    /// Distinguishes "task unknown" ([`IngestError::TaskNotFound`]) from
    /// "task has no issues to report" ([`IngestError::ReportNotFound`],
    /// which also covers tasks still pending).
    pub async fn get_task_report(&self, task_id: &str) -> Result<Vec<ErrorReport>, IngestError> {
        let id = parse_task_id(task_id)?;
        let task = self
            .tasks
            .find_by_id(id)
            .await?
            .ok_or(IngestError::TaskNotFound(id))?;
        if task.error_report.is_empty() {
            return Err(IngestError::ReportNotFound(id));
        }
        Ok(task.error_report)
    }

    /// Transition a task to `IN_PROGRESS`.
    ///
    /// Allowed from `PENDING`, and from `FAILED` on queue redelivery.
    /// Returns `false` (without writing) when the task is missing or not
    /// in a startable state; `COMPLETED` tasks are never restarted.
    pub async fn mark_in_progress(&self, id: Uuid) -> Result<bool, IngestError> {
        self.transition(
            id,
            TaskStatus::InProgress,
            &[TaskStatus::Pending, TaskStatus::Failed],
            None,
        )
        .await
    }

    /// Record a finished run with its collected error reports.
    pub async fn mark_completed(
        &self,
        id: Uuid,
        errors: Vec<ErrorReport>,
    ) -> Result<bool, IngestError> {
        self.transition(
            id,
            TaskStatus::Completed,
            &[TaskStatus::InProgress],
            Some(errors),
        )
        .await
    }

    /// Record a failed run with its diagnostic reports.
    pub async fn mark_failed(
        &self,
        id: Uuid,
        errors: Vec<ErrorReport>,
    ) -> Result<bool, IngestError> {
        self.transition(
            id,
            TaskStatus::Failed,
            &[TaskStatus::InProgress],
            Some(errors),
        )
        .await
    }

    async fn transition(
        &self,
        id: Uuid,
        to: TaskStatus,
        allowed_from: &[TaskStatus],
        errors: Option<Vec<ErrorReport>>,
    ) -> Result<bool, IngestError> {
        let Some(current) = self.tasks.find_by_id(id).await? else {
            tracing::warn!(task_id = %id, to = %to, "Transition target task not found");
            return Ok(false);
        };
        if !allowed_from.contains(&current.status) {
            tracing::warn!(
                task_id = %id,
                from = %current.status,
                to = %to,
                "Refusing task status transition"
            );
            return Ok(false);
        }

        let updated = self
            .tasks
            .update_fields(
                id,
                TaskUpdate {
                    status: Some(to),
                    error_report: errors,
                },
            )
            .await?;

        match updated {
            Some(task) => {
                tracing::debug!(task_id = %id, status = %to, "Task status updated");
                self.fanout.notify(TaskStatusResponse::from(&task)).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn parse_task_id(task_id: &str) -> Result<Uuid, IngestError> {
    Uuid::parse_str(task_id).map_err(|_| IngestError::InvalidId(task_id.to_string()))
}
