//! Report orchestration.
//!
//! Samples the reference instant from the dataset horizon, fans out
//! per-store aggregation with bounded concurrency, publishes progress to
//! the report tracker, and writes the final CSV sorted by store id.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::db::repository::FullRepository;
use crate::models::StoreReport;
use crate::services::report_tracker::ReportTracker;
use crate::services::store_metrics::compute_store_report;

/// CSV header, in the exact output column order.
pub const CSV_COLUMNS: [&str; 7] = [
    "store_id",
    "uptime_last_hour_minutes",
    "uptime_last_day_hours",
    "uptime_last_week_hours",
    "downtime_last_hour_minutes",
    "downtime_last_day_hours",
    "downtime_last_week_hours",
];

/// Completions between progress publications: frequent enough for small
/// fleets, quiet enough for large ones.
fn progress_stride(total: usize) -> usize {
    (total / 20).min(5).max(1)
}

/// Reference instant for a report: the dataset's own horizon (max poll
/// timestamp), so a static dataset always yields the same report. Falls
/// back to the wall clock only when there are no polls at all.
async fn reference_instant(repo: &dyn FullRepository) -> crate::db::RepositoryResult<DateTime<Utc>> {
    Ok(repo
        .latest_poll_timestamp()
        .await?
        .unwrap_or_else(Utc::now))
}

/// Generate a report into `out_path`, publishing progress under `report_id`
/// when one is supplied.
///
/// Per-store failures (errors or panics) become zero-valued rows and never
/// abort the run; only report-level failures (store enumeration, output
/// write) surface as errors.
pub async fn generate_report(
    repo: Arc<dyn FullRepository>,
    tracker: &ReportTracker,
    config: &Config,
    report_id: Option<&str>,
    out_path: &Path,
) -> Result<()> {
    let now = reference_instant(repo.as_ref()).await?;

    let mut store_ids = repo.store_ids().await?;
    store_ids.sort();
    let total = store_ids.len();
    info!(total, %now, "Starting report generation");

    if total == 0 {
        write_csv(&[], out_path)?;
        if let Some(report_id) = report_id {
            tracker.set_progress(report_id, 100.0);
        }
        info!(path = %out_path.display(), "Wrote header-only report for empty store set");
        return Ok(());
    }

    let workers = config.max_workers.min(total).max(1);
    let stride = progress_stride(total);

    // Each worker runs in its own task with its own repository handle, so a
    // panicking store computation is isolated from its siblings.
    let mut completions = stream::iter(store_ids.into_iter().map(|store_id| {
        let repo = Arc::clone(&repo);
        let config = config.clone();
        async move {
            let handle = tokio::spawn(async move {
                let report = compute_store_report(repo.as_ref(), &config, &store_id, now).await;
                (store_id, report)
            });
            handle.await
        }
    }))
    .buffer_unordered(workers);

    let mut rows: Vec<StoreReport> = Vec::with_capacity(total);
    let mut done = 0usize;
    while let Some(joined) = completions.next().await {
        let row = match joined {
            Ok((_, Ok(report))) => report,
            Ok((store_id, Err(e))) => {
                warn!(%store_id, error = %e, "Store computation failed, emitting zero row");
                StoreReport::zeroed(store_id)
            }
            Err(join_error) => {
                // The task carried the store id away with it; the row count
                // invariant is restored below by re-deriving the missing ids.
                error!(error = %join_error, "Store computation panicked");
                continue;
            }
        };
        rows.push(row);
        done += 1;

        if let Some(report_id) = report_id {
            if done % stride == 0 || done == total {
                tracker.set_progress(report_id, done as f64 / total as f64 * 100.0);
            }
        }
    }

    // Panicked workers drop out of `completions` without a store id; emit
    // zero rows for any store missing from the collected set.
    if rows.len() < total {
        let seen: std::collections::HashSet<&str> =
            rows.iter().map(|r| r.store_id.as_str()).collect();
        let mut all_ids = repo.store_ids().await?;
        all_ids.sort();
        let missing: Vec<String> = all_ids
            .into_iter()
            .filter(|id| !seen.contains(id.as_str()))
            .collect();
        drop(seen);
        for store_id in missing {
            warn!(%store_id, "Emitting zero row for panicked store computation");
            rows.push(StoreReport::zeroed(store_id));
        }
        if let Some(report_id) = report_id {
            tracker.set_progress(report_id, 100.0);
        }
    }

    rows.sort_by(|a, b| a.store_id.cmp(&b.store_id));
    write_csv(&rows, out_path)?;
    info!(rows = rows.len(), path = %out_path.display(), "Report written");
    Ok(())
}

/// Run a report and drive the tracker to its terminal state. Designed to be
/// detached with `tokio::spawn` from the trigger endpoint.
pub async fn run_and_store(
    repo: Arc<dyn FullRepository>,
    tracker: ReportTracker,
    config: Config,
    report_id: String,
    out_path: PathBuf,
) {
    match generate_report(repo, &tracker, &config, Some(&report_id), &out_path).await {
        Ok(()) => {
            tracker.complete_report(&report_id, out_path.display().to_string());
        }
        Err(e) => {
            error!(%report_id, error = %e, "Report generation failed");
            tracker.fail_report(&report_id);
        }
    }
}

/// Write report rows as CSV. Rows are fully collected before the file is
/// created, so a failed run never leaves a partial CSV behind.
fn write_csv(rows: &[StoreReport], out_path: &Path) -> Result<()> {
    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create report directory {}", parent.display()))?;
        }
    }

    let mut writer = csv::Writer::from_path(out_path)
        .with_context(|| format!("Failed to create report file {}", out_path.display()))?;
    writer.write_record(CSV_COLUMNS)?;
    for row in rows {
        writer.write_record([
            row.store_id.clone(),
            format!("{:.2}", row.uptime_last_hour_minutes),
            format!("{:.2}", row.uptime_last_day_hours),
            format!("{:.2}", row.uptime_last_week_hours),
            format!("{:.2}", row.downtime_last_hour_minutes),
            format!("{:.2}", row.downtime_last_day_hours),
            format!("{:.2}", row.downtime_last_week_hours),
        ])?;
    }
    writer.flush().context("Failed to flush report CSV")?;
    Ok(())
}
