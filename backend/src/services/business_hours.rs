//! Business-hours expansion.
//!
//! Expands a store's weekly wall-clock schedule into concrete UTC intervals
//! over a requested window, honoring the store's IANA timezone. Overnight
//! rows (`end <= start`) cross local midnight; the date walk is padded by
//! one local day on each side so such rows and partially-covered days are
//! not missed.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::collections::HashMap;

use crate::models::{merge_sorted, BusinessHour, TimeInterval};

/// Expand `rows` into sorted, disjoint UTC intervals intersected with
/// `window`. A store with no schedule rows is open 24/7.
pub fn expand_business_intervals(
    rows: &[BusinessHour],
    window: TimeInterval,
    tz: Tz,
) -> Vec<TimeInterval> {
    if rows.is_empty() {
        return vec![window];
    }

    let mut by_dow: HashMap<u8, Vec<&BusinessHour>> = HashMap::new();
    for row in rows {
        by_dow.entry(row.day_of_week).or_default().push(row);
    }

    // One-day pads: overnight rows start the prior local day, and the window
    // may begin or end partway through a local day.
    let first_date = window.start.with_timezone(&tz).date_naive() - Duration::days(1);
    let last_date = window.end.with_timezone(&tz).date_naive() + Duration::days(1);

    let mut intervals = Vec::new();
    let mut date = first_date;
    while date <= last_date {
        let dow = date.weekday().num_days_from_monday() as u8;
        for row in by_dow.get(&dow).map(Vec::as_slice).unwrap_or(&[]) {
            let start_local = date.and_time(row.start_local);
            let mut end_local = date.and_time(row.end_local);
            if end_local <= start_local {
                end_local += Duration::days(1);
            }

            let start_utc = local_to_utc(tz, start_local);
            let end_utc = local_to_utc(tz, end_local);
            if let Some(interval) =
                TimeInterval::new(start_utc, end_utc).and_then(|i| i.clip(&window))
            {
                intervals.push(interval);
            }
        }
        date = match date.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    intervals.sort_by_key(|interval| interval.start);
    merge_sorted(intervals)
}

/// Resolve a local wall-clock time to UTC. Fall-back ambiguity takes the
/// earlier occurrence; a time inside a spring-forward gap advances to the
/// first valid instant after the gap.
fn local_to_utc(tz: Tz, local: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earlier, _) => earlier.with_timezone(&Utc),
        LocalResult::None => {
            let mut probe = local;
            // Gaps in real zones are at most a couple of hours wide.
            for _ in 0..48 {
                probe += Duration::minutes(30);
                match tz.from_local_datetime(&probe) {
                    LocalResult::Single(dt) => return dt.with_timezone(&Utc),
                    LocalResult::Ambiguous(earlier, _) => return earlier.with_timezone(&Utc),
                    LocalResult::None => {}
                }
            }
            Utc.from_utc_datetime(&local)
        }
    }
}
