//! Pipeline stages: parsing, reconciliation, lifecycle, queueing, fan-out.

pub mod file_processing;
pub mod job_queue;
pub mod reconciliation;
pub mod status_fanout;
pub mod task_service;
