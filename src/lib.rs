// src/lib.rs
// Public library surface for the batch binary and integration tests.

pub mod classify;
pub mod config;
pub mod digest;
pub mod ingest;
pub mod notify;
pub mod query;
pub mod rank;
pub mod resolve;
pub mod topic;
pub mod window;

// ---- Re-exports for stable public API ----
pub use crate::config::DigestConfig;
pub use crate::ingest::types::{Candidate, FeedSource, RawEntry, Track};
pub use crate::ingest::{run_digest, DigestRun, RunStats};
pub use crate::notify::{deliver_chunks, Notifier};
pub use crate::window::{compute_window, HolidayCalendar, ReportingWindow};
