//! Reconciliation of validated rows against stored reservations.
//!
//! The decision is pure: a draft plus the current stored reservation (if
//! any) maps to create, update, or skip. Terminal booking statuses never
//! create new records. Concurrent uploads touching the same external id
//! have no ordering guarantee; the last writer wins at the store level.

use std::sync::Arc;

use crate::models::{Reservation, ReservationDraft};
use crate::store::{ReservationStore, StoreError};

/// Action decided for one validated draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileAction {
    /// No reservation with this external id exists; create one.
    Create(ReservationDraft),
    /// A reservation exists; overwrite its fields.
    Update {
        id: uuid::Uuid,
        draft: ReservationDraft,
    },
    /// Nothing to do; carries the reason.
    Skip(&'static str),
}

/// How one row ended up in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Created,
    Updated,
    Skipped,
}

/// Decide what to do with a draft given the current stored reservation.
#[must_use]
pub fn decide(draft: &ReservationDraft, existing: Option<&Reservation>) -> ReconcileAction {
    match existing {
        Some(reservation) => ReconcileAction::Update {
            id: reservation.id,
            draft: draft.clone(),
        },
        None if draft.status.is_terminal() => ReconcileAction::Skip("not found in database"),
        None => ReconcileAction::Create(draft.clone()),
    }
}

/// Applies reconciliation decisions against the reservation store.
pub struct ReconciliationService {
    reservations: Arc<dyn ReservationStore>,
}

impl ReconciliationService {
    #[must_use]
    pub fn new(reservations: Arc<dyn ReservationStore>) -> Self {
        Self { reservations }
    }

    /// Look up the stored reservation by external id, decide, and apply.
    ///
    /// Store failures are returned to the caller, which records them as a
    /// row-level error; they never abort the file.
    pub async fn process(
        &self,
        draft: ReservationDraft,
    ) -> Result<ReconcileOutcome, StoreError> {
        let existing = self
            .reservations
            .find_by_external_id(&draft.reservation_id)
            .await?;

        match decide(&draft, existing.as_ref()) {
            ReconcileAction::Create(draft) => {
                let created = self.reservations.create(&draft).await?;
                tracing::debug!(
                    reservation_id = %created.reservation_id,
                    "Created new reservation"
                );
                Ok(ReconcileOutcome::Created)
            }
            ReconcileAction::Update { id, draft } => {
                let updated = self.reservations.update(id, &draft).await?;
                if updated.is_none() {
                    // The record vanished between lookup and write.
                    return Err(StoreError::Conflict(format!(
                        "reservation '{}' no longer exists",
                        draft.reservation_id
                    )));
                }
                tracing::debug!(
                    reservation_id = %draft.reservation_id,
                    status = %draft.status,
                    "Updated existing reservation"
                );
                Ok(ReconcileOutcome::Updated)
            }
            ReconcileAction::Skip(reason) => {
                tracing::debug!(
                    reservation_id = %draft.reservation_id,
                    status = %draft.status,
                    reason,
                    "Skipping reservation"
                );
                Ok(ReconcileOutcome::Skipped)
            }
        }
    }
}
