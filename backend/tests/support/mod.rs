//! Shared helpers for integration tests.

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use storewatch::config::Config;
use storewatch::db::repository::{FullRepository, IngestRepository};
use storewatch::db::LocalRepository;
use storewatch::models::{BusinessHour, Poll, PollStatus, StoreTimezone};
use storewatch::services::report_runner;
use storewatch::services::report_tracker::ReportTracker;

pub fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

pub fn poll(store_id: &str, timestamp_utc: DateTime<Utc>, status: &str) -> Poll {
    Poll {
        store_id: store_id.to_string(),
        timestamp_utc,
        status: PollStatus::parse(status),
    }
}

pub fn hours_row(store_id: &str, day_of_week: u8, start: &str, end: &str) -> BusinessHour {
    BusinessHour {
        store_id: store_id.to_string(),
        day_of_week,
        start_local: NaiveTime::parse_from_str(start, "%H:%M:%S").unwrap(),
        end_local: NaiveTime::parse_from_str(end, "%H:%M:%S").unwrap(),
    }
}

pub async fn seed_polls(repo: &LocalRepository, polls: Vec<Poll>) {
    repo.store_polls(polls, false).await.unwrap();
}

pub async fn seed_hours(repo: &LocalRepository, rows: Vec<BusinessHour>) {
    repo.store_business_hours(rows, false).await.unwrap();
}

pub async fn seed_timezone(repo: &LocalRepository, store_id: &str, timezone: &str) {
    repo.store_timezones(
        vec![StoreTimezone {
            store_id: store_id.to_string(),
            timezone: timezone.to_string(),
        }],
        false,
    )
    .await
    .unwrap();
}

/// Run a full tracked report into `dir`, returning the tracker, the report
/// id, and the output path.
pub async fn run_tracked_report(
    repo: Arc<dyn FullRepository>,
    dir: &Path,
) -> (ReportTracker, String, PathBuf) {
    let tracker = ReportTracker::new();
    let report_id = tracker.create_report();
    let out_path = dir.join(format!("{}.csv", report_id));
    report_runner::run_and_store(
        repo,
        tracker.clone(),
        Config::default(),
        report_id.clone(),
        out_path.clone(),
    )
    .await;
    (tracker, report_id, out_path)
}

/// Parse a report CSV into store id -> (column name -> value).
pub fn read_report(path: &Path) -> (Vec<String>, HashMap<String, HashMap<String, f64>>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();

    let mut order = Vec::new();
    let mut rows = HashMap::new();
    for record in reader.records() {
        let record = record.unwrap();
        let store_id = record.get(0).unwrap().to_string();
        let mut columns = HashMap::new();
        for (idx, header) in headers.iter().enumerate().skip(1) {
            columns.insert(header.clone(), record.get(idx).unwrap().parse().unwrap());
        }
        order.push(store_id.clone());
        rows.insert(store_id, columns);
    }
    (order, rows)
}
