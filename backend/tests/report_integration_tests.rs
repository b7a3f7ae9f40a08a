//! End-to-end report generation tests against the in-memory repository.

mod support;

use std::sync::Arc;

use storewatch::db::repository::FullRepository;
use storewatch::db::LocalRepository;
use storewatch::services::report_runner::CSV_COLUMNS;
use storewatch::services::report_tracker::ReportStatus;

use support::*;

fn as_full(repo: &LocalRepository) -> Arc<dyn FullRepository> {
    Arc::new(repo.clone())
}

/// A store open around the clock, polled active twice in the last 90
/// minutes, is fully up for the trailing hour.
#[tokio::test]
async fn test_always_open_store_with_active_polls_is_fully_up() {
    let repo = LocalRepository::new();
    let now = utc(2024, 5, 6, 12, 0); // Monday

    let all_day: Vec<_> = (0..7)
        .map(|d| hours_row("store_a", d, "00:00:00", "23:59:59"))
        .collect();
    seed_hours(&repo, all_day).await;
    seed_timezone(&repo, "store_a", "UTC").await;
    seed_polls(
        &repo,
        vec![
            poll("store_a", now - chrono::Duration::minutes(90), "active"),
            poll("store_a", now - chrono::Duration::minutes(30), "active"),
            // Pins the dataset horizon to `now`.
            poll("zz_clock", now, "active"),
        ],
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let (tracker, report_id, out_path) = run_tracked_report(as_full(&repo), dir.path()).await;

    assert_eq!(tracker.get(&report_id).unwrap().status, ReportStatus::Complete);
    let (_, rows) = read_report(&out_path);
    let store_a = &rows["store_a"];
    assert_eq!(store_a["uptime_last_hour_minutes"], 60.0);
    assert_eq!(store_a["downtime_last_hour_minutes"], 0.0);
}

/// A 24/7 store whose only recent poll is inactive gets a fully-down hour.
#[tokio::test]
async fn test_inactive_poll_counts_as_downtime() {
    let repo = LocalRepository::new();
    let now = utc(2024, 5, 6, 12, 0);

    seed_polls(
        &repo,
        vec![
            poll("store_b", now - chrono::Duration::minutes(30), "inactive"),
            poll("zz_clock", now, "active"),
        ],
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let (_, _, out_path) = run_tracked_report(as_full(&repo), dir.path()).await;

    let (_, rows) = read_report(&out_path);
    let store_b = &rows["store_b"];
    assert_eq!(store_b["uptime_last_hour_minutes"], 0.0);
    assert_eq!(store_b["downtime_last_hour_minutes"], 60.0);
    // 24/7 store: uptime + downtime covers the whole window for every span.
    assert_eq!(
        store_b["uptime_last_day_hours"] + store_b["downtime_last_day_hours"],
        24.0
    );
    assert_eq!(
        store_b["uptime_last_week_hours"] + store_b["downtime_last_week_hours"],
        168.0
    );
}

/// A scheduled store with no polls at all: every business second in the
/// window is downtime.
#[tokio::test]
async fn test_no_polls_scheduled_store_is_all_downtime() {
    let repo = LocalRepository::new();
    // Monday 18:00 in Chicago (CDT) = 23:00 UTC, 2024-06-03.
    let now = utc(2024, 6, 3, 23, 0);

    seed_hours(&repo, vec![hours_row("store_c", 0, "09:00:00", "17:00:00")]).await;
    seed_timezone(&repo, "store_c", "America/Chicago").await;
    seed_polls(&repo, vec![poll("zz_clock", now, "active")]).await;

    let dir = tempfile::tempdir().unwrap();
    let (_, _, out_path) = run_tracked_report(as_full(&repo), dir.path()).await;

    let (_, rows) = read_report(&out_path);
    let store_c = &rows["store_c"];
    assert_eq!(store_c["uptime_last_day_hours"], 0.0);
    assert_eq!(store_c["downtime_last_day_hours"], 8.0);
}

/// An overnight schedule row spans local midnight and is attributed across
/// both dates.
#[tokio::test]
async fn test_overnight_schedule_merged_across_dates() {
    let repo = LocalRepository::new();
    // Friday 22:00 -> Saturday 02:00 UTC; now is Saturday 03:00.
    let now = utc(2024, 5, 11, 3, 0);

    seed_hours(&repo, vec![hours_row("store_d", 4, "22:00:00", "02:00:00")]).await;
    seed_timezone(&repo, "store_d", "UTC").await;
    seed_polls(
        &repo,
        vec![
            poll("store_d", utc(2024, 5, 11, 0, 30), "active"),
            poll("zz_clock", now, "active"),
        ],
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let (_, _, out_path) = run_tracked_report(as_full(&repo), dir.path()).await;

    let (_, rows) = read_report(&out_path);
    let store_d = &rows["store_d"];
    assert!((store_d["uptime_last_day_hours"] - 4.0).abs() < 0.01);
    assert!((store_d["downtime_last_day_hours"] - 0.0).abs() < 0.01);
}

/// One store's computation failing produces a zero row for it without
/// aborting the report.
#[tokio::test]
async fn test_failing_store_gets_zero_row_and_report_completes() {
    let repo = LocalRepository::new();
    let now = utc(2024, 5, 6, 12, 0);

    seed_polls(
        &repo,
        vec![
            poll("store_e", now - chrono::Duration::minutes(30), "active"),
            poll("store_f", now - chrono::Duration::minutes(30), "active"),
            poll("zz_clock", now, "active"),
        ],
    )
    .await;
    repo.fail_store("store_f");

    let dir = tempfile::tempdir().unwrap();
    let (tracker, report_id, out_path) = run_tracked_report(as_full(&repo), dir.path()).await;

    assert_eq!(tracker.get(&report_id).unwrap().status, ReportStatus::Complete);
    let (order, rows) = read_report(&out_path);
    assert!(order.contains(&"store_e".to_string()));
    assert!(order.contains(&"store_f".to_string()));

    assert_eq!(rows["store_e"]["uptime_last_hour_minutes"], 60.0);
    for column in CSV_COLUMNS.iter().skip(1) {
        assert_eq!(rows["store_f"][*column], 0.0);
    }
}

/// An empty dataset yields a header-only CSV and a Complete report.
#[tokio::test]
async fn test_empty_dataset_header_only_csv() {
    let repo = LocalRepository::new();

    let dir = tempfile::tempdir().unwrap();
    let (tracker, report_id, out_path) = run_tracked_report(as_full(&repo), dir.path()).await;

    let record = tracker.get(&report_id).unwrap();
    assert_eq!(record.status, ReportStatus::Complete);
    assert_eq!(record.percent_complete, 100.0);
    assert!(record.finished_at.is_some());

    let content = std::fs::read_to_string(&out_path).unwrap();
    assert_eq!(content.trim_end(), CSV_COLUMNS.join(","));
}

/// Output contains one row per store id seen in any input table, in
/// ascending order.
#[tokio::test]
async fn test_row_per_store_sorted_ascending() {
    let repo = LocalRepository::new();
    let now = utc(2024, 5, 6, 12, 0);

    // One store per source table.
    seed_polls(&repo, vec![poll("store_polls_only", now, "active")]).await;
    seed_hours(
        &repo,
        vec![hours_row("store_hours_only", 0, "09:00:00", "17:00:00")],
    )
    .await;
    seed_timezone(&repo, "store_tz_only", "UTC").await;

    let dir = tempfile::tempdir().unwrap();
    let (_, _, out_path) = run_tracked_report(as_full(&repo), dir.path()).await;

    let (order, rows) = read_report(&out_path);
    assert_eq!(
        order,
        vec!["store_hours_only", "store_polls_only", "store_tz_only"]
    );
    assert_eq!(rows.len(), 3);
}

/// Progress reaches 100% and the record carries the output path.
#[tokio::test]
async fn test_completed_report_record() {
    let repo = LocalRepository::new();
    let now = utc(2024, 5, 6, 12, 0);
    let polls = (0..30)
        .map(|i| poll(&format!("store_{:02}", i), now, "active"))
        .collect();
    seed_polls(&repo, polls).await;

    let dir = tempfile::tempdir().unwrap();
    let (tracker, report_id, out_path) = run_tracked_report(as_full(&repo), dir.path()).await;

    let record = tracker.get(&report_id).unwrap();
    assert_eq!(record.status, ReportStatus::Complete);
    assert_eq!(record.percent_complete, 100.0);
    assert_eq!(
        record.csv_path.as_deref(),
        Some(out_path.display().to_string().as_str())
    );

    let (order, _) = read_report(&out_path);
    assert_eq!(order.len(), 30);
    let mut sorted = order.clone();
    sorted.sort();
    assert_eq!(order, sorted);
}

/// Poll ingestion order does not change the report.
#[tokio::test]
async fn test_report_independent_of_ingestion_order() {
    let now = utc(2024, 5, 6, 12, 0);
    let polls = vec![
        poll("store_x", now - chrono::Duration::hours(5), "active"),
        poll("store_x", now - chrono::Duration::hours(3), "inactive"),
        poll("store_x", now - chrono::Duration::hours(1), "active"),
        poll("store_y", now - chrono::Duration::minutes(10), "inactive"),
        poll("zz_clock", now, "active"),
    ];

    let forward = LocalRepository::new();
    seed_polls(&forward, polls.clone()).await;

    let reversed = LocalRepository::new();
    seed_polls(&reversed, polls.into_iter().rev().collect()).await;

    let dir = tempfile::tempdir().unwrap();
    let (_, _, forward_path) = run_tracked_report(as_full(&forward), dir.path()).await;
    let (_, _, reversed_path) = run_tracked_report(as_full(&reversed), dir.path()).await;

    let forward_csv = std::fs::read_to_string(forward_path).unwrap();
    let reversed_csv = std::fs::read_to_string(reversed_path).unwrap();
    assert_eq!(forward_csv, reversed_csv);
}

/// The uptime/downtime split respects the business-hours intersection for
/// a partially-open store.
#[tokio::test]
async fn test_uptime_plus_downtime_equals_business_intersection() {
    let repo = LocalRepository::new();
    let now = utc(2024, 5, 6, 12, 0); // Monday noon

    seed_hours(&repo, vec![hours_row("store_g", 0, "08:00:00", "18:00:00")]).await;
    seed_timezone(&repo, "store_g", "UTC").await;
    seed_polls(
        &repo,
        vec![
            poll("store_g", utc(2024, 5, 6, 9, 0), "active"),
            poll("store_g", utc(2024, 5, 6, 11, 0), "inactive"),
            poll("zz_clock", now, "active"),
        ],
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let (_, _, out_path) = run_tracked_report(as_full(&repo), dir.path()).await;

    let (_, rows) = read_report(&out_path);
    let store_g = &rows["store_g"];
    // Monday business seen so far in the day window: 08:00-12:00 = 4h.
    let day_total = store_g["uptime_last_day_hours"] + store_g["downtime_last_day_hours"];
    assert!((day_total - 4.0).abs() < 0.01);
    // Midpoint between the polls is 10:00: active 08:00-10:00, then down.
    assert!((store_g["uptime_last_day_hours"] - 2.0).abs() < 0.01);
    assert!((store_g["downtime_last_day_hours"] - 2.0).abs() < 0.01);
}
