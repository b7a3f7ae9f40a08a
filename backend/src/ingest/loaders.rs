//! CSV loaders for polls, business hours, and timezones.
//!
//! Each loader is tolerant of malformed rows: a row that fails to parse is
//! skipped with a warning and ingestion continues. Timestamps may carry a
//! zone designator or be naive; naive timestamps are interpreted as UTC.
//! Every loaded file's SHA-256 checksum is recorded so an unchanged
//! re-ingest can be spotted in the logs.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};
use std::path::Path;
use tracing::{info, warn};

use crate::db::checksum::calculate_checksum;
use crate::db::repository::FullRepository;
use crate::models::{BusinessHour, Poll, PollStatus, StoreTimezone};

/// Well-known source file names inside a data directory.
pub const POLLS_FILE: &str = "store_status.csv";
pub const HOURS_FILE: &str = "menu_hours.csv";
pub const TIMEZONES_FILE: &str = "timezones.csv";

/// Parse an ISO-8601 timestamp, accepting a trailing zone designator or a
/// naive wall-clock (interpreted as UTC).
pub fn parse_utc_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let trimmed = raw.trim().trim_end_matches(" UTC");

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }
    anyhow::bail!("Unrecognized timestamp: {raw:?}")
}

/// Parse a local wall-clock time of day (`HH:MM:SS` or `HH:MM`).
pub fn parse_local_time(raw: &str) -> Result<NaiveTime> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .with_context(|| format!("Unrecognized time of day: {raw:?}"))
}

fn field<'r>(record: &'r csv::StringRecord, headers: &csv::StringRecord, name: &str) -> Option<&'r str> {
    headers
        .iter()
        .position(|h| h == name)
        .and_then(|idx| record.get(idx))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

async fn record_checksum(
    repo: &dyn FullRepository,
    csv_path: &Path,
    content: &[u8],
) -> Result<()> {
    let name = csv_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| csv_path.display().to_string());
    let checksum = calculate_checksum(content);
    if repo.source_checksum(&name).await?.as_deref() == Some(checksum.as_str()) {
        info!(file = %name, "Source file unchanged since last ingest");
    }
    repo.record_source_checksum(&name, &checksum).await?;
    Ok(())
}

/// Load status polls from `store_status.csv`. Returns the number of rows
/// stored.
pub async fn load_polls(
    repo: &dyn FullRepository,
    csv_path: &Path,
    replace: bool,
) -> Result<usize> {
    let content = std::fs::read(csv_path)
        .with_context(|| format!("Failed to read {}", csv_path.display()))?;
    let mut reader = csv::Reader::from_reader(content.as_slice());
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for result in reader.records() {
        let record = result?;
        let (store_id, ts_raw, status) = match (
            field(&record, &headers, "store_id"),
            field(&record, &headers, "timestamp_utc"),
            field(&record, &headers, "status"),
        ) {
            (Some(store_id), Some(ts), Some(status)) => (store_id, ts, status),
            _ => {
                skipped += 1;
                continue;
            }
        };
        match parse_utc_timestamp(ts_raw) {
            Ok(timestamp_utc) => rows.push(Poll {
                store_id: store_id.to_string(),
                timestamp_utc,
                status: PollStatus::parse(status),
            }),
            Err(e) => {
                warn!(store_id, error = %e, "Skipping poll row");
                skipped += 1;
            }
        }
    }

    let stored = repo.store_polls(rows, replace).await?;
    record_checksum(repo, csv_path, &content).await?;
    info!(stored, skipped, file = %csv_path.display(), "Loaded poll rows");
    Ok(stored)
}

/// Load weekly schedules from `menu_hours.csv`. Accepts both `dayOfWeek`
/// and `day_of_week` headers. Returns the number of rows stored.
pub async fn load_business_hours(
    repo: &dyn FullRepository,
    csv_path: &Path,
    replace: bool,
) -> Result<usize> {
    let content = std::fs::read(csv_path)
        .with_context(|| format!("Failed to read {}", csv_path.display()))?;
    let mut reader = csv::Reader::from_reader(content.as_slice());
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for result in reader.records() {
        let record = result?;
        let store_id = field(&record, &headers, "store_id");
        let dow_raw = field(&record, &headers, "dayOfWeek")
            .or_else(|| field(&record, &headers, "day_of_week"));
        let start_raw = field(&record, &headers, "start_time_local");
        let end_raw = field(&record, &headers, "end_time_local");

        let (store_id, dow_raw, start_raw, end_raw) = match (store_id, dow_raw, start_raw, end_raw)
        {
            (Some(a), Some(b), Some(c), Some(d)) => (a, b, c, d),
            _ => {
                skipped += 1;
                continue;
            }
        };

        let parsed = dow_raw
            .parse::<u8>()
            .ok()
            .filter(|dow| *dow <= 6)
            .and_then(|dow| {
                Some((
                    dow,
                    parse_local_time(start_raw).ok()?,
                    parse_local_time(end_raw).ok()?,
                ))
            });
        match parsed {
            Some((day_of_week, start_local, end_local)) => rows.push(BusinessHour {
                store_id: store_id.to_string(),
                day_of_week,
                start_local,
                end_local,
            }),
            None => {
                warn!(store_id, dow = dow_raw, "Skipping business-hour row");
                skipped += 1;
            }
        }
    }

    let stored = repo.store_business_hours(rows, replace).await?;
    record_checksum(repo, csv_path, &content).await?;
    info!(stored, skipped, file = %csv_path.display(), "Loaded business-hour rows");
    Ok(stored)
}

/// Load timezone assignments from `timezones.csv`. Returns the number of
/// rows stored.
pub async fn load_timezones(
    repo: &dyn FullRepository,
    csv_path: &Path,
    replace: bool,
) -> Result<usize> {
    let content = std::fs::read(csv_path)
        .with_context(|| format!("Failed to read {}", csv_path.display()))?;
    let mut reader = csv::Reader::from_reader(content.as_slice());
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for result in reader.records() {
        let record = result?;
        match field(&record, &headers, "store_id") {
            Some(store_id) => {
                let timezone = field(&record, &headers, "timezone_str")
                    .unwrap_or(crate::config::DEFAULT_TIMEZONE);
                rows.push(StoreTimezone {
                    store_id: store_id.to_string(),
                    timezone: timezone.to_string(),
                });
            }
            None => skipped += 1,
        }
    }

    let stored = repo.store_timezones(rows, replace).await?;
    record_checksum(repo, csv_path, &content).await?;
    info!(stored, skipped, file = %csv_path.display(), "Loaded timezone rows");
    Ok(stored)
}

/// Load the three well-known files from `data_dir`, skipping any that are
/// absent. Returns the total number of rows stored.
pub async fn load_data_dir(
    repo: &dyn FullRepository,
    data_dir: &Path,
    replace: bool,
) -> Result<usize> {
    let mut total = 0usize;

    let polls_path = data_dir.join(POLLS_FILE);
    if polls_path.exists() {
        total += load_polls(repo, &polls_path, replace).await?;
    } else {
        info!(path = %polls_path.display(), "No poll file found");
    }

    let hours_path = data_dir.join(HOURS_FILE);
    if hours_path.exists() {
        total += load_business_hours(repo, &hours_path, replace).await?;
    } else {
        info!(path = %hours_path.display(), "No business-hours file found");
    }

    let tz_path = data_dir.join(TIMEZONES_FILE);
    if tz_path.exists() {
        total += load_timezones(repo, &tz_path, replace).await?;
    } else {
        info!(path = %tz_path.display(), "No timezone file found");
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{IngestRepository, StoreDataRepository};
    use crate::db::LocalRepository;
    use chrono::TimeZone;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let expected = Utc.with_ymd_and_hms(2023, 1, 25, 18, 13, 22).unwrap();
        assert_eq!(
            parse_utc_timestamp("2023-01-25 18:13:22 UTC").unwrap(),
            expected
        );
        assert_eq!(parse_utc_timestamp("2023-01-25 18:13:22").unwrap(), expected);
        assert_eq!(
            parse_utc_timestamp("2023-01-25T18:13:22Z").unwrap(),
            expected
        );
        assert_eq!(
            parse_utc_timestamp("2023-01-25T13:13:22-05:00").unwrap(),
            expected
        );
    }

    #[test]
    fn test_parse_timestamp_fractional_seconds() {
        let parsed = parse_utc_timestamp("2023-01-25 18:13:22.479220 UTC").unwrap();
        assert_eq!(
            parsed.timestamp_millis(),
            Utc.with_ymd_and_hms(2023, 1, 25, 18, 13, 22)
                .unwrap()
                .timestamp_millis()
                + 479
        );
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_utc_timestamp("yesterday").is_err());
        assert!(parse_utc_timestamp("").is_err());
    }

    #[test]
    fn test_parse_local_time() {
        assert_eq!(
            parse_local_time("09:30:00").unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );
        assert_eq!(
            parse_local_time("09:30").unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );
        assert!(parse_local_time("25:00:00").is_err());
    }

    #[tokio::test]
    async fn test_load_polls_skips_bad_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            POLLS_FILE,
            "store_id,timestamp_utc,status\n\
             s1,2023-01-25 10:00:00 UTC,active\n\
             s1,not-a-timestamp,active\n\
             ,2023-01-25 11:00:00 UTC,active\n\
             s2,2023-01-25 12:00:00 UTC,INACTIVE\n",
        );

        let repo = LocalRepository::new();
        let stored = load_polls(&repo, &path, true).await.unwrap();
        assert_eq!(stored, 2);
        assert_eq!(repo.poll_count(), 2);
    }

    #[tokio::test]
    async fn test_load_business_hours_both_header_spellings() {
        let dir = tempfile::tempdir().unwrap();
        let repo = LocalRepository::new();

        let camel = write_file(
            dir.path(),
            "camel.csv",
            "store_id,dayOfWeek,start_time_local,end_time_local\ns1,0,09:00:00,17:00:00\n",
        );
        assert_eq!(load_business_hours(&repo, &camel, true).await.unwrap(), 1);

        let snake = write_file(
            dir.path(),
            "snake.csv",
            "store_id,day_of_week,start_time_local,end_time_local\ns1,1,09:00:00,17:00:00\n",
        );
        assert_eq!(load_business_hours(&repo, &snake, false).await.unwrap(), 1);

        let rows = repo.business_hours("s1").await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_load_business_hours_rejects_bad_dow() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            HOURS_FILE,
            "store_id,dayOfWeek,start_time_local,end_time_local\n\
             s1,7,09:00:00,17:00:00\n\
             s1,3,09:00:00,17:00:00\n",
        );
        let repo = LocalRepository::new();
        assert_eq!(load_business_hours(&repo, &path, true).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_load_timezones_defaults_missing_zone() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            TIMEZONES_FILE,
            "store_id,timezone_str\ns1,America/Denver\ns2,\n",
        );
        let repo = LocalRepository::new();
        assert_eq!(load_timezones(&repo, &path, true).await.unwrap(), 2);
        assert_eq!(
            repo.timezone("s1").await.unwrap().as_deref(),
            Some("America/Denver")
        );
        assert_eq!(
            repo.timezone("s2").await.unwrap().as_deref(),
            Some(crate::config::DEFAULT_TIMEZONE)
        );
    }

    #[tokio::test]
    async fn test_load_data_dir_records_checksums() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            POLLS_FILE,
            "store_id,timestamp_utc,status\ns1,2023-01-25 10:00:00 UTC,active\n",
        );
        let repo = LocalRepository::new();
        let total = load_data_dir(&repo, dir.path(), true).await.unwrap();
        assert_eq!(total, 1);
        assert!(repo.source_checksum(POLLS_FILE).await.unwrap().is_some());
        assert!(repo.source_checksum(HOURS_FILE).await.unwrap().is_none());
    }
}
