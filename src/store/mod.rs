//! Persistence ports consumed by the pipeline.
//!
//! The pipeline never talks to a storage engine directly; it defines only
//! the operations it performs. [`memory`] provides implementations backed
//! by in-process maps for tests and single-node deployments.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ErrorReport, Reservation, ReservationDraft, Task, TaskStatus};

/// Failures reported by store implementations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The identifier is malformed for the backing store's key format.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A uniqueness constraint was violated, or the target record vanished
    /// between lookup and write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The store could not be reached or the operation failed.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Partial update applied to a task record. `None` fields are left as-is.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub status: Option<TaskStatus>,
    pub error_report: Option<Vec<ErrorReport>>,
}

/// Point operations against the task records. The store is the sole
/// authority on current task state.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Create a new task in `PENDING` state.
    async fn create(&self, file_path: &str) -> Result<Task, StoreError>;

    /// Look up a task by its identifier.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, StoreError>;

    /// Apply a partial update, returning the updated record, or `None` if
    /// no task with this id exists.
    async fn update_fields(&self, id: Uuid, update: TaskUpdate)
        -> Result<Option<Task>, StoreError>;
}

/// Point operations against the reservation records.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Look up a reservation by its external key.
    async fn find_by_external_id(
        &self,
        reservation_id: &str,
    ) -> Result<Option<Reservation>, StoreError>;

    /// Create a reservation from a validated draft. Fails with
    /// [`StoreError::Conflict`] if the external key is already taken.
    async fn create(&self, draft: &ReservationDraft) -> Result<Reservation, StoreError>;

    /// Overwrite all draft fields of an existing reservation and refresh
    /// `updated_at`. Returns `None` if no record with this internal id
    /// exists.
    async fn update(
        &self,
        id: Uuid,
        draft: &ReservationDraft,
    ) -> Result<Option<Reservation>, StoreError>;
}
