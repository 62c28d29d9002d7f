//! Streaming spreadsheet processing.
//!
//! Reads a file as a forward-only row stream, runs validation and
//! reconciliation per row, and collects a capped list of error reports.
//! A single bad row never aborts the file; a file-level failure marks the
//! whole task as failed and re-raises for the queue's retry policy.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::error::IngestError;
use crate::models::ErrorReport;
use crate::services::reconciliation::ReconciliationService;
use crate::services::task_service::TaskService;
use crate::validation::{validate_row, RawRow};

/// Default cap on collected error reports per file.
pub const MAX_ERRORS: usize = 100;

/// Suggestion attached to row-level store failures.
const STORE_FAILURE_SUGGESTION: &str = "Please check the data and try again";

/// Suggestion attached to the synthetic file-level failure report.
const FILE_FAILURE_SUGGESTION: &str = "Please verify the data format and try again";

/// Recoverable failure while pulling one row. The stream stays usable.
#[derive(Debug, Error)]
#[error("row {line}: {message}")]
pub struct MalformedRecord {
    pub line: u32,
    pub message: String,
}

/// Forward-only lazy sequence of spreadsheet rows.
///
/// Finite and not restartable mid-stream; reopen the file to restart.
pub trait RowStream: Send {
    /// Pull the next data row, or `None` at end of file. An `Err` covers
    /// only the current record; the caller may keep pulling.
    fn next_row(&mut self) -> Result<Option<RawRow>, MalformedRecord>;
}

/// [`RowStream`] backed by a CSV file on disk.
///
/// The reader streams records without materializing the file. The header
/// row (row 1) is skipped; data rows are numbered from 2.
pub struct CsvRowStream {
    records: csv::StringRecordsIntoIter<std::fs::File>,
    next_line: u32,
}

impl std::fmt::Debug for CsvRowStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvRowStream")
            .field("next_line", &self.next_line)
            .finish_non_exhaustive()
    }
}

impl CsvRowStream {
    /// Open the file for streaming. File-level failures abort the parse.
    pub fn open(path: &str) -> Result<Self, IngestError> {
        if !Path::new(path).exists() {
            return Err(IngestError::FileNotFound(path.to_string()));
        }
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|e| IngestError::UnreadableFormat(e.to_string()))?;
        Ok(Self {
            records: reader.into_records(),
            next_line: 2,
        })
    }
}

impl RowStream for CsvRowStream {
    fn next_row(&mut self) -> Result<Option<RawRow>, MalformedRecord> {
        let line = self.next_line;
        match self.records.next() {
            None => Ok(None),
            Some(Ok(record)) => {
                self.next_line += 1;
                let cell = |idx: usize| record.get(idx).unwrap_or("").trim().to_string();
                Ok(Some(RawRow {
                    line_number: line,
                    reservation_id: cell(0),
                    guest_name: cell(1),
                    status: cell(2),
                    check_in_date: cell(3),
                    check_out_date: cell(4),
                }))
            }
            Some(Err(e)) => {
                self.next_line += 1;
                Err(MalformedRecord {
                    line,
                    message: e.to_string(),
                })
            }
        }
    }
}

/// Runs the full per-task pipeline: lifecycle transitions around a capped
/// streaming parse.
pub struct FileProcessingService {
    task_service: Arc<TaskService>,
    reconciliation: Arc<ReconciliationService>,
    max_errors: usize,
}

impl FileProcessingService {
    #[must_use]
    pub fn new(
        task_service: Arc<TaskService>,
        reconciliation: Arc<ReconciliationService>,
        max_errors: usize,
    ) -> Self {
        Self {
            task_service,
            reconciliation,
            max_errors,
        }
    }

    /// Process one task end to end.
    ///
    /// On a failure escaping the row loop the task is marked `FAILED`
    /// with a synthetic `row = 0` report, and the error is re-raised so
    /// the job queue can decide whether to redeliver.
    pub async fn process_task(&self, task_id: Uuid, file_path: &str) -> Result<(), IngestError> {
        let started = self.task_service.mark_in_progress(task_id).await?;
        if !started {
            tracing::warn!(task_id = %task_id, "Task not in a startable state, skipping run");
            return Ok(());
        }

        match self.process_file(file_path).await {
            Ok(errors) => {
                tracing::debug!(
                    task_id = %task_id,
                    errors = errors.len(),
                    "File processing completed"
                );
                self.task_service.mark_completed(task_id, errors).await?;
                Ok(())
            }
            Err(e) => {
                self.record_processing_failure(task_id, &e).await;
                Err(e)
            }
        }
    }

    /// Stream the file row by row, collecting at most `max_errors`
    /// reports in row encounter order.
    async fn process_file(&self, file_path: &str) -> Result<Vec<ErrorReport>, IngestError> {
        let mut stream = CsvRowStream::open(file_path)?;
        let mut errors: Vec<ErrorReport> = Vec::new();

        loop {
            if errors.len() >= self.max_errors {
                tracing::warn!(
                    max_errors = self.max_errors,
                    "Error cap reached, stopping file processing early"
                );
                break;
            }

            match stream.next_row() {
                Ok(None) => break,
                Ok(Some(row)) => {
                    if row.is_empty() {
                        continue;
                    }
                    self.process_row(&row, &mut errors).await;
                    if errors.len() >= self.max_errors {
                        errors.truncate(self.max_errors);
                    }
                }
                Err(e) => {
                    tracing::error!(line = e.line, error = %e.message, "Error processing row");
                    errors.push(ErrorReport::new(
                        e.line,
                        format!("Unexpected error: {}", e.message),
                    ));
                }
            }
        }

        Ok(errors)
    }

    async fn process_row(&self, row: &RawRow, errors: &mut Vec<ErrorReport>) {
        match validate_row(row) {
            Ok(draft) => {
                if let Err(e) = self.reconciliation.process(draft).await {
                    errors.push(ErrorReport::with_suggestion(
                        row.line_number,
                        format!("Database operation failed: {e}"),
                        STORE_FAILURE_SUGGESTION,
                    ));
                }
            }
            Err(violations) => {
                for violation in violations {
                    errors.push(ErrorReport::with_suggestion(
                        row.line_number,
                        format!(
                            "Validation error in {}: {}",
                            violation.field.as_str(),
                            violation.constraints.join(", ")
                        ),
                        violation.field.suggestion(),
                    ));
                }
            }
        }
    }

    async fn record_processing_failure(&self, task_id: Uuid, error: &IngestError) {
        tracing::error!(task_id = %task_id, error = %error, "File processing failed");
        let report = vec![ErrorReport::with_suggestion(
            0,
            format!("File processing failed: {error}"),
            FILE_FAILURE_SUGGESTION,
        )];
        if let Err(e) = self.task_service.mark_failed(task_id, report).await {
            tracing::error!(task_id = %task_id, error = %e, "Failed to record task failure");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_csv_stream_skips_header_and_numbers_rows() {
        let file = write_csv(
            "reservation_id,guest_name,status,check_in_date,check_out_date\n\
             RES1,Jan Nowak,PENDING,2024-05-01,2024-05-07\n\
             RES2,Anna Kowalska,PENDING,2024-05-02,2024-05-08\n",
        );
        let mut stream = CsvRowStream::open(file.path().to_str().unwrap()).unwrap();

        let first = stream.next_row().unwrap().unwrap();
        assert_eq!(first.line_number, 2);
        assert_eq!(first.reservation_id, "RES1");

        let second = stream.next_row().unwrap().unwrap();
        assert_eq!(second.line_number, 3);
        assert_eq!(second.guest_name, "Anna Kowalska");

        assert!(stream.next_row().unwrap().is_none());
    }

    #[test]
    fn test_csv_stream_tolerates_short_rows() {
        let file = write_csv(
            "reservation_id,guest_name,status,check_in_date,check_out_date\n\
             RES1,Jan Nowak\n",
        );
        let mut stream = CsvRowStream::open(file.path().to_str().unwrap()).unwrap();
        let row = stream.next_row().unwrap().unwrap();
        assert_eq!(row.reservation_id, "RES1");
        assert_eq!(row.status, "");
        assert_eq!(row.check_out_date, "");
    }

    #[test]
    fn test_csv_stream_missing_file() {
        let err = CsvRowStream::open("/nonexistent/path.csv").unwrap_err();
        assert!(matches!(err, IngestError::FileNotFound(_)));
    }
}
