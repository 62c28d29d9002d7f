//! In-memory store implementations.
//!
//! Used by the integration tests and by single-node deployments that do
//! not need durable task history. All mutation goes through an async
//! `RwLock`, keeping each store operation atomic at the record level.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Reservation, ReservationDraft, Task, TaskStatus};

use super::{ReservationStore, StoreError, TaskStore, TaskUpdate};

/// Task store backed by an in-process map.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTaskStore {
    tasks: Arc<RwLock<HashMap<Uuid, Task>>>,
}

impl InMemoryTaskStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create(&self, file_path: &str) -> Result<Task, StoreError> {
        let task = Task {
            id: Uuid::new_v4(),
            file_path: file_path.to_string(),
            status: TaskStatus::Pending,
            created_at: Utc::now(),
            error_report: Vec::new(),
        };
        self.tasks.write().await.insert(task.id, task.clone());
        Ok(task)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks.read().await.get(&id).cloned())
    }

    async fn update_fields(
        &self,
        id: Uuid,
        update: TaskUpdate,
    ) -> Result<Option<Task>, StoreError> {
        let mut tasks = self.tasks.write().await;
        let Some(task) = tasks.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(status) = update.status {
            task.status = status;
        }
        if let Some(report) = update.error_report {
            task.error_report = report;
        }
        Ok(Some(task.clone()))
    }
}

/// Reservation store backed by an in-process map with a unique index on
/// the external reservation id.
#[derive(Debug, Default, Clone)]
pub struct InMemoryReservationStore {
    inner: Arc<RwLock<ReservationMap>>,
}

#[derive(Debug, Default)]
struct ReservationMap {
    by_id: HashMap<Uuid, Reservation>,
    by_external_id: HashMap<String, Uuid>,
}

impl InMemoryReservationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored reservations.
    pub async fn len(&self) -> usize {
        self.inner.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.by_id.is_empty()
    }
}

#[async_trait]
impl ReservationStore for InMemoryReservationStore {
    async fn find_by_external_id(
        &self,
        reservation_id: &str,
    ) -> Result<Option<Reservation>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_external_id
            .get(reservation_id)
            .and_then(|id| inner.by_id.get(id))
            .cloned())
    }

    async fn create(&self, draft: &ReservationDraft) -> Result<Reservation, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.by_external_id.contains_key(&draft.reservation_id) {
            return Err(StoreError::Conflict(format!(
                "reservation '{}' already exists",
                draft.reservation_id
            )));
        }
        let now = Utc::now();
        let reservation = Reservation {
            id: Uuid::new_v4(),
            reservation_id: draft.reservation_id.clone(),
            guest_name: draft.guest_name.clone(),
            status: draft.status,
            check_in_date: draft.check_in_date,
            check_out_date: draft.check_out_date,
            created_at: now,
            updated_at: now,
        };
        inner
            .by_external_id
            .insert(reservation.reservation_id.clone(), reservation.id);
        inner.by_id.insert(reservation.id, reservation.clone());
        Ok(reservation)
    }

    async fn update(
        &self,
        id: Uuid,
        draft: &ReservationDraft,
    ) -> Result<Option<Reservation>, StoreError> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;
        let Some(record) = inner.by_id.get_mut(&id) else {
            return Ok(None);
        };
        // The external key is the reconciliation key and never changes on
        // update, but keep the index consistent if a caller does rekey.
        if record.reservation_id != draft.reservation_id {
            inner.by_external_id.remove(&record.reservation_id);
            inner
                .by_external_id
                .insert(draft.reservation_id.clone(), id);
        }
        record.reservation_id = draft.reservation_id.clone();
        record.guest_name = draft.guest_name.clone();
        record.status = draft.status;
        record.check_in_date = draft.check_in_date;
        record.check_out_date = draft.check_out_date;
        record.updated_at = Utc::now();
        Ok(Some(record.clone()))
    }
}
