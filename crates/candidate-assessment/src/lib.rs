//! Timed coding assessments for job candidates: scheduling, the candidate
//! test-window lifecycle, and interviewer review of submissions.

pub mod access;
pub mod assessment;
pub mod config;
pub mod error;
pub mod telemetry;
