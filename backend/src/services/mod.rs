//! Business logic for the uptime report engine.
//!
//! The pure pieces (`status_timeline`, `business_hours`, the fold in
//! `store_metrics`) are deterministic functions over domain values; the
//! orchestration pieces (`report_runner`, `report_tracker`) own concurrency
//! and job state.

pub mod business_hours;
pub mod report_runner;
pub mod report_tracker;
pub mod status_timeline;
pub mod store_metrics;

pub use business_hours::expand_business_intervals;
pub use report_runner::{generate_report, run_and_store};
pub use report_tracker::{ReportRecord, ReportStatus, ReportTracker};
pub use status_timeline::build_status_intervals;
pub use store_metrics::compute_store_report;
