//! Report job tracking.
//!
//! In-memory registry of report runs keyed by an opaque report id. The
//! orchestrator is the sole writer (progress, completion, failure); HTTP
//! handlers only read. This is the single piece of cross-request state in
//! the process.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Report status enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ReportStatus {
    Running,
    Complete,
    Failed,
}

/// State of one report run.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ReportRecord {
    pub report_id: String,
    pub status: ReportStatus,
    pub percent_complete: f64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Path of the generated CSV once the run completes.
    pub csv_path: Option<String>,
}

/// In-memory report tracker.
#[derive(Clone, Default)]
pub struct ReportTracker {
    reports: Arc<RwLock<HashMap<String, ReportRecord>>>,
}

impl ReportTracker {
    /// Create a new report tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new running report and return its id.
    pub fn create_report(&self) -> String {
        let report_id = Uuid::new_v4().to_string();
        let record = ReportRecord {
            report_id: report_id.clone(),
            status: ReportStatus::Running,
            percent_complete: 0.0,
            created_at: chrono::Utc::now(),
            finished_at: None,
            csv_path: None,
        };
        self.reports.write().insert(report_id.clone(), record);
        report_id
    }

    /// Publish progress for a running report. Progress never moves backward.
    pub fn set_progress(&self, report_id: &str, percent_complete: f64) {
        let mut reports = self.reports.write();
        if let Some(record) = reports.get_mut(report_id) {
            record.percent_complete = record.percent_complete.max(percent_complete);
        }
    }

    /// Mark a report as complete with its output path.
    pub fn complete_report(&self, report_id: &str, csv_path: impl Into<String>) {
        let mut reports = self.reports.write();
        if let Some(record) = reports.get_mut(report_id) {
            record.status = ReportStatus::Complete;
            record.percent_complete = 100.0;
            record.finished_at = Some(chrono::Utc::now());
            record.csv_path = Some(csv_path.into());
        }
    }

    /// Mark a report as failed.
    pub fn fail_report(&self, report_id: &str) {
        let mut reports = self.reports.write();
        if let Some(record) = reports.get_mut(report_id) {
            record.status = ReportStatus::Failed;
            record.finished_at = Some(chrono::Utc::now());
        }
    }

    /// Get a report record by id.
    pub fn get(&self, report_id: &str) -> Option<ReportRecord> {
        self.reports.read().get(report_id).cloned()
    }
}
