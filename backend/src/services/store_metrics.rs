//! Per-store uptime aggregation.
//!
//! Combines the reconstructed status timeline with the expanded business
//! hours for one store and one reference instant, producing the six report
//! aggregates (uptime/downtime over the trailing hour, day, and week).

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::config::Config;
use crate::db::repository::FullRepository;
use crate::db::RepositoryResult;
use crate::models::{StatusInterval, StoreReport, TimeInterval};
use crate::services::business_hours::expand_business_intervals;
use crate::services::status_timeline::build_status_intervals;

/// Uptime/downtime totals for one window, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowTotals {
    pub uptime_seconds: f64,
    pub downtime_seconds: f64,
}

/// Compute the report row for one store at reference instant `now`.
///
/// Runs on its own repository handle; callers give each concurrent
/// invocation its own clone so sessions are never shared across workers.
pub async fn compute_store_report(
    repo: &dyn FullRepository,
    config: &Config,
    store_id: &str,
    now: DateTime<Utc>,
) -> RepositoryResult<StoreReport> {
    let margin = config.margin();

    // Reconstruction window: the week of interest padded by a day behind
    // (harmonizes with the local-date pad in schedule expansion) and an hour
    // ahead (polls past `now` are folded in by the midpoint rule).
    let reconstruction = TimeInterval {
        start: now - Duration::days(8),
        end: now + Duration::hours(1),
    };

    let polls = repo
        .polls_for_store(
            store_id,
            reconstruction.start - margin,
            reconstruction.end + margin,
        )
        .await?;
    let timeline = build_status_intervals(&polls, reconstruction, margin);

    let tz = resolve_timezone(repo, store_id, config).await?;
    let schedule = repo.business_hours(store_id).await?;

    let hour = window_totals(
        &timeline,
        &expand_business_intervals(&schedule, TimeInterval::trailing(now, Duration::hours(1)), tz),
        store_id,
    );
    let day = window_totals(
        &timeline,
        &expand_business_intervals(&schedule, TimeInterval::trailing(now, Duration::hours(24)), tz),
        store_id,
    );
    let week = window_totals(
        &timeline,
        &expand_business_intervals(&schedule, TimeInterval::trailing(now, Duration::days(7)), tz),
        store_id,
    );

    Ok(StoreReport {
        store_id: store_id.to_string(),
        uptime_last_hour_minutes: round2(hour.uptime_seconds / 60.0),
        uptime_last_day_hours: round2(day.uptime_seconds / 3600.0),
        uptime_last_week_hours: round2(week.uptime_seconds / 3600.0),
        downtime_last_hour_minutes: round2(hour.downtime_seconds / 60.0),
        downtime_last_day_hours: round2(day.downtime_seconds / 3600.0),
        downtime_last_week_hours: round2(week.downtime_seconds / 3600.0),
    })
}

/// Resolve a store's zone, falling back to the configured default when the
/// store has no row or the stored name does not parse.
async fn resolve_timezone(
    repo: &dyn FullRepository,
    store_id: &str,
    config: &Config,
) -> RepositoryResult<Tz> {
    Ok(match repo.timezone(store_id).await? {
        Some(name) => name.parse().unwrap_or_else(|_| {
            warn!(store_id, zone = %name, "Unparseable timezone, using default");
            config.default_timezone
        }),
        None => config.default_timezone,
    })
}

/// Fold the status timeline over one window's business intervals.
///
/// `uptime + downtime` always equals the total business seconds; an empty
/// timeline attributes all business time to downtime.
pub fn window_totals(
    timeline: &[StatusInterval],
    business: &[TimeInterval],
    store_id: &str,
) -> WindowTotals {
    let business_seconds: f64 = business.iter().map(TimeInterval::duration_seconds).sum();
    if business_seconds <= 0.0 {
        return WindowTotals {
            uptime_seconds: 0.0,
            downtime_seconds: 0.0,
        };
    }
    if timeline.is_empty() {
        return WindowTotals {
            uptime_seconds: 0.0,
            downtime_seconds: business_seconds,
        };
    }

    let mut uptime_seconds = 0.0;
    for interval in business {
        for status_interval in timeline {
            if !status_interval.status.is_active() {
                continue;
            }
            uptime_seconds += status_interval.interval.overlap_seconds(interval);
        }
    }

    if uptime_seconds > business_seconds + 1e-6 {
        warn!(
            store_id,
            uptime_seconds, business_seconds, "Uptime exceeded business time, clamping"
        );
    }
    let uptime_seconds = uptime_seconds.min(business_seconds);
    let downtime_seconds = (business_seconds - uptime_seconds).clamp(0.0, business_seconds);

    WindowTotals {
        uptime_seconds,
        downtime_seconds,
    }
}

/// Round half-to-even to two decimals.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
