//! Asynchronous spreadsheet ingestion and reconciliation for hotel
//! reservations.
//!
//! This crate provides:
//! - a durable job queue decoupling upload from processing, with
//!   explicit per-job retry state
//! - a streaming spreadsheet parser with bounded memory and a capped
//!   error report list
//! - row-level validation and normalization, including ambiguous
//!   date-format resolution
//! - a status-aware reconciliation engine deciding create/update/skip
//!   per record
//! - a task-lifecycle state machine with live status fan-out
//!
//! # Example
//!
//! ```rust,ignore
//! use reservation_ingest::{IngestConfig, IngestPipeline};
//!
//! let pipeline = IngestPipeline::in_memory(IngestConfig::default());
//! let created = pipeline.create_task("/uploads/reservations.csv").await?;
//! let status = pipeline.get_task_status(&created.task_id.to_string()).await?;
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod store;
pub mod validation;

pub use config::IngestConfig;
pub use error::IngestError;
pub use pipeline::IngestPipeline;
