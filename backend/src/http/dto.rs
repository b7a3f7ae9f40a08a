//! Data Transfer Objects for the HTTP API.

use serde::{Deserialize, Serialize};

/// Response for `POST /trigger_report`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerReportResponse {
    /// Opaque id to poll with `GET /get_report`
    pub report_id: String,
}

/// Response for `GET /get_report`.
///
/// `status` is one of `NotFound`, `Running`, `Complete`, `Failed`;
/// `percent_complete` accompanies `Running` and `csv_path` accompanies
/// `Complete`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportStatusResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_complete: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_path: Option<String>,
}

impl ReportStatusResponse {
    pub fn not_found() -> Self {
        Self {
            status: "NotFound".to_string(),
            percent_complete: None,
            csv_path: None,
        }
    }

    pub fn running(percent_complete: f64) -> Self {
        Self {
            status: "Running".to_string(),
            percent_complete: Some(percent_complete),
            csv_path: None,
        }
    }

    pub fn complete(csv_path: String) -> Self {
        Self {
            status: "Complete".to_string(),
            percent_complete: None,
            csv_path: Some(csv_path),
        }
    }

    pub fn failed() -> Self {
        Self {
            status: "Failed".to_string(),
            percent_complete: None,
            csv_path: None,
        }
    }
}

/// Query parameters for `GET /get_report`.
#[derive(Debug, Clone, Deserialize)]
pub struct GetReportQuery {
    pub report_id: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// Repository connection status
    pub database: String,
}
