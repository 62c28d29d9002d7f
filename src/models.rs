//! Domain models for the reservation ingest pipeline.
//!
//! All models carry serde derives for JSON serialization of status and
//! report payloads.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Task (one ingestion job)
// ---------------------------------------------------------------------------

/// Lifecycle state of an ingestion task.
///
/// `Completed` is strictly terminal. `Failed` may re-enter `InProgress`
/// only when the job queue redelivers the task within its retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Whether no further domain transition is expected from this state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file-ingestion job and its outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier, assigned at creation.
    pub id: Uuid,
    /// Path to the uploaded source file. Immutable.
    pub file_path: String,
    /// Current lifecycle state.
    pub status: TaskStatus,
    /// Creation timestamp. Immutable.
    pub created_at: DateTime<Utc>,
    /// Processing diagnostics, empty until the run finishes or fails.
    pub error_report: Vec<ErrorReport>,
}

// ---------------------------------------------------------------------------
// ErrorReport (one diagnosable failure)
// ---------------------------------------------------------------------------

/// One row- or file-level diagnostic with a corrective suggestion.
///
/// `row` is 1-based; row 0 signifies a file-level failure. Reports are
/// appended in row encounter order and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub row: u32,
    pub reason: String,
    pub suggestion: String,
}

/// Fallback suggestion when no field-specific hint applies.
pub const DEFAULT_SUGGESTION: &str = "Please check the data format and try again";

impl ErrorReport {
    /// Create a report with the generic suggestion.
    #[must_use]
    pub fn new(row: u32, reason: impl Into<String>) -> Self {
        Self {
            row,
            reason: reason.into(),
            suggestion: DEFAULT_SUGGESTION.to_string(),
        }
    }

    /// Create a report with a specific corrective hint.
    #[must_use]
    pub fn with_suggestion(
        row: u32,
        reason: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            row,
            reason: reason.into(),
            suggestion: suggestion.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Reservation (one guest booking)
// ---------------------------------------------------------------------------

/// Booking state carried by the spreadsheet. Distinct from [`TaskStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Pending,
    Cancelled,
    Completed,
}

/// All reservation status labels, for validation messages.
pub const RESERVATION_STATUS_LABELS: &[&str] = &["PENDING", "CANCELLED", "COMPLETED"];

impl ReservationStatus {
    /// Whether this status gates creation of new reservations.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ReservationStatus::Cancelled | ReservationStatus::Completed
        )
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ReservationStatus::Pending => "PENDING",
            ReservationStatus::Cancelled => "CANCELLED",
            ReservationStatus::Completed => "COMPLETED",
        }
    }
}

impl FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ReservationStatus::Pending),
            "CANCELLED" => Ok(ReservationStatus::Cancelled),
            "COMPLETED" => Ok(ReservationStatus::Completed),
            _ => Err(format!(
                "unknown status '{s}', expected one of: {}",
                RESERVATION_STATUS_LABELS.join(", ")
            )),
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One guest booking, keyed by the externally supplied `reservation_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    /// Internal identifier, generated by the store.
    pub id: Uuid,
    /// External unique key supplied by the spreadsheet.
    pub reservation_id: String,
    pub guest_name: String,
    pub status: ReservationStatus,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation.
    pub updated_at: DateTime<Utc>,
}

/// A validated reservation draft produced from one spreadsheet row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationDraft {
    pub reservation_id: String,
    pub guest_name: String,
    pub status: ReservationStatus,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Returned on task creation: synchronous acceptance, asynchronous processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCreated {
    pub task_id: Uuid,
}

/// Point-in-time status snapshot of a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatusResponse {
    pub id: Uuid,
    pub status: TaskStatus,
    pub error_report: Vec<ErrorReport>,
}

impl From<&Task> for TaskStatusResponse {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            status: task.status,
            error_report: task.error_report.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_terminality() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::InProgress.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
    }

    #[test]
    fn test_reservation_status_parse() {
        assert_eq!(
            "PENDING".parse::<ReservationStatus>().unwrap(),
            ReservationStatus::Pending
        );
        assert_eq!(
            "CANCELLED".parse::<ReservationStatus>().unwrap(),
            ReservationStatus::Cancelled
        );
        assert!("pending".parse::<ReservationStatus>().is_err());
        assert!("INVALID_STATUS".parse::<ReservationStatus>().is_err());
    }

    #[test]
    fn test_terminal_reservation_statuses() {
        assert!(!ReservationStatus::Pending.is_terminal());
        assert!(ReservationStatus::Cancelled.is_terminal());
        assert!(ReservationStatus::Completed.is_terminal());
    }

    #[test]
    fn test_error_report_default_suggestion() {
        let report = ErrorReport::new(3, "Invalid date format");
        assert_eq!(report.row, 3);
        assert_eq!(report.suggestion, DEFAULT_SUGGESTION);
    }

    #[test]
    fn test_status_serializes_screaming_snake() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
    }
}
