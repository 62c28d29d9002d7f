//! Pipeline configuration.
//!
//! Defaults match the production behavior; every knob can be overridden
//! through `INGEST_*` environment variables or the builder.

use std::env;
use std::time::Duration;

use crate::error::IngestError;
use crate::services::file_processing::MAX_ERRORS;
use crate::services::job_queue::RetryPolicy;

/// Default number of queue consumer workers.
pub const DEFAULT_WORKER_COUNT: usize = 4;

/// Default number of completed job records retained for diagnostics.
pub const DEFAULT_KEEP_COMPLETED: usize = 10;

/// Default number of failed job records retained for diagnostics.
pub const DEFAULT_KEEP_FAILED: usize = 5;

/// Runtime configuration for the ingest pipeline.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Cap on collected error reports per file.
    pub max_errors: usize,
    /// Queue consumer pool size (parallelism across tasks).
    pub worker_count: usize,
    /// Job delivery retry policy.
    pub retry: RetryPolicy,
    /// Completed job records retained for diagnostics.
    pub keep_completed: usize,
    /// Failed job records retained for diagnostics.
    pub keep_failed: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_errors: MAX_ERRORS,
            worker_count: DEFAULT_WORKER_COUNT,
            retry: RetryPolicy::default(),
            keep_completed: DEFAULT_KEEP_COMPLETED,
            keep_failed: DEFAULT_KEEP_FAILED,
        }
    }
}

impl IngestConfig {
    /// Load configuration from the environment.
    ///
    /// Recognized variables (all optional):
    /// - `INGEST_MAX_ERRORS`: error report cap per file
    /// - `INGEST_WORKER_COUNT`: queue consumer pool size
    /// - `INGEST_RETRY_ATTEMPTS`: delivery attempts per job
    /// - `INGEST_RETRY_BACKOFF_MS`: first backoff delay in milliseconds
    /// - `INGEST_KEEP_COMPLETED` / `INGEST_KEEP_FAILED`: history sizes
    pub fn from_env() -> Result<Self, IngestError> {
        let mut config = Self::default();

        if let Some(v) = read_env("INGEST_MAX_ERRORS")? {
            config.max_errors = v;
        }
        if let Some(v) = read_env("INGEST_WORKER_COUNT")? {
            config.worker_count = v;
        }
        if let Some(v) = read_env("INGEST_RETRY_ATTEMPTS")? {
            config.retry.max_attempts = v;
        }
        if let Some(v) = read_env::<u64>("INGEST_RETRY_BACKOFF_MS")? {
            config.retry.backoff_base = Duration::from_millis(v);
        }
        if let Some(v) = read_env("INGEST_KEEP_COMPLETED")? {
            config.keep_completed = v;
        }
        if let Some(v) = read_env("INGEST_KEEP_FAILED")? {
            config.keep_failed = v;
        }

        Ok(config)
    }

    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder::default()
    }
}

fn read_env<T: std::str::FromStr>(var: &str) -> Result<Option<T>, IngestError> {
    match env::var(var) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| IngestError::Config {
                var: var.to_string(),
                reason: format!("cannot parse '{raw}'"),
            }),
        Err(_) => Ok(None),
    }
}

/// Builder for [`IngestConfig`].
#[derive(Debug, Default)]
pub struct IngestConfigBuilder {
    max_errors: Option<usize>,
    worker_count: Option<usize>,
    retry: Option<RetryPolicy>,
    keep_completed: Option<usize>,
    keep_failed: Option<usize>,
}

impl IngestConfigBuilder {
    #[must_use]
    pub fn max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = Some(max_errors);
        self
    }

    #[must_use]
    pub fn worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = Some(worker_count);
        self
    }

    #[must_use]
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    #[must_use]
    pub fn keep_completed(mut self, keep_completed: usize) -> Self {
        self.keep_completed = Some(keep_completed);
        self
    }

    #[must_use]
    pub fn keep_failed(mut self, keep_failed: usize) -> Self {
        self.keep_failed = Some(keep_failed);
        self
    }

    #[must_use]
    pub fn build(self) -> IngestConfig {
        let defaults = IngestConfig::default();
        IngestConfig {
            max_errors: self.max_errors.unwrap_or(defaults.max_errors),
            worker_count: self.worker_count.unwrap_or(defaults.worker_count),
            retry: self.retry.unwrap_or(defaults.retry),
            keep_completed: self.keep_completed.unwrap_or(defaults.keep_completed),
            keep_failed: self.keep_failed.unwrap_or(defaults.keep_failed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = IngestConfig::default();
        assert_eq!(config.max_errors, 100);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.backoff_base, Duration::from_millis(2000));
        assert_eq!(config.keep_completed, 10);
        assert_eq!(config.keep_failed, 5);
    }

    #[test]
    fn test_builder_overrides() {
        let config = IngestConfig::builder()
            .max_errors(10)
            .worker_count(1)
            .retry(RetryPolicy {
                max_attempts: 2,
                backoff_base: Duration::from_millis(10),
            })
            .build();
        assert_eq!(config.max_errors, 10);
        assert_eq!(config.worker_count, 1);
        assert_eq!(config.retry.max_attempts, 2);
        // Untouched knobs keep their defaults.
        assert_eq!(config.keep_failed, 5);
    }
}
