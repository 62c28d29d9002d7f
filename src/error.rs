//! Error types for the reservation ingest pipeline.

use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

/// Errors surfaced at the crate boundary.
///
/// Row-level problems never appear here: they become [`ErrorReport`]
/// entries on the task instead. Everything in this enum either aborts a
/// whole task run or is returned directly to the caller.
///
/// [`ErrorReport`]: crate::models::ErrorReport
#[derive(Debug, Error)]
pub enum IngestError {
    /// No task exists with the given identifier.
    #[error("Task {0} not found")]
    TaskNotFound(Uuid),

    /// The task exists but has no errors recorded (including tasks still
    /// pending or completed with zero errors).
    #[error("No report recorded for task {0}")]
    ReportNotFound(Uuid),

    /// The supplied identifier is not a well-formed task id.
    #[error("Invalid identifier format: {0}")]
    InvalidId(String),

    /// The uploaded file does not carry a supported extension.
    #[error("Unsupported file extension: {0}")]
    WrongFileExtension(String),

    /// The source file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// The source file exists but cannot be read as a spreadsheet.
    #[error("Unreadable file format: {0}")]
    UnreadableFormat(String),

    /// The job queue refused the payload.
    #[error("Queue error: {0}")]
    Queue(String),

    /// A configuration value is missing or malformed.
    #[error("Invalid configuration for {var}: {reason}")]
    Config { var: String, reason: String },

    /// A store operation failed outside the per-row recovery path.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
