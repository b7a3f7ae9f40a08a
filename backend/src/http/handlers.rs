//! HTTP handlers for the REST API.

use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, Sse},
    Json,
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;

use super::dto::{GetReportQuery, HealthResponse, ReportStatusResponse, TriggerReportResponse};
use super::error::AppError;
use super::state::AppState;
use crate::services::report_runner;
use crate::services::report_tracker::ReportStatus;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the
/// repository is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match state.repository.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Report Jobs
// =============================================================================

/// POST /trigger_report
///
/// Allocate a fresh report id, record it as running, and kick off report
/// generation in the background.
pub async fn trigger_report(
    State(state): State<AppState>,
) -> Result<(axum::http::StatusCode, Json<TriggerReportResponse>), AppError> {
    let report_id = state.reports.create_report();
    let out_path = state.config.reports_dir.join(format!("{}.csv", report_id));

    let repo = state.repository.clone();
    let tracker = state.reports.clone();
    let config = (*state.config).clone();
    tokio::spawn(report_runner::run_and_store(
        repo,
        tracker,
        config,
        report_id.clone(),
        out_path,
    ));

    Ok((
        axum::http::StatusCode::ACCEPTED,
        Json(TriggerReportResponse { report_id }),
    ))
}

/// GET /get_report?report_id=...
///
/// Report run status. Always a 200 JSON body; `status` distinguishes
/// `NotFound` / `Running` / `Complete` / `Failed`.
pub async fn get_report(
    State(state): State<AppState>,
    Query(query): Query<GetReportQuery>,
) -> HandlerResult<ReportStatusResponse> {
    let response = match state.reports.get(&query.report_id) {
        None => ReportStatusResponse::not_found(),
        Some(record) => match record.status {
            ReportStatus::Running => ReportStatusResponse::running(record.percent_complete),
            ReportStatus::Failed => ReportStatusResponse::failed(),
            ReportStatus::Complete => {
                ReportStatusResponse::complete(record.csv_path.unwrap_or_default())
            }
        },
    };
    Ok(Json(response))
}

/// GET /reports/{report_id}/progress
///
/// Stream progress snapshots via Server-Sent Events until the run reaches
/// a terminal status.
pub async fn stream_report_progress(
    State(state): State<AppState>,
    Path(report_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    if state.reports.get(&report_id).is_none() {
        return Err(AppError::NotFound(format!("Report {} not found", report_id)));
    }

    let tracker = state.reports.clone();
    let stream = async_stream::stream! {
        let mut last_percent = -1.0f64;
        loop {
            let Some(record) = tracker.get(&report_id) else { break };

            if record.percent_complete > last_percent {
                last_percent = record.percent_complete;
                let snapshot = serde_json::json!({
                    "status": record.status,
                    "percent_complete": record.percent_complete,
                });
                yield Ok(Event::default().data(snapshot.to_string()));
            }

            if record.status != ReportStatus::Running {
                let final_event = serde_json::json!({
                    "status": record.status,
                    "csv_path": record.csv_path,
                });
                yield Ok(Event::default()
                    .event("complete")
                    .data(final_event.to_string()));
                break;
            }

            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    };

    Ok(Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(1))
            .text("keep-alive"),
    ))
}
