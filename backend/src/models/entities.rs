//! Domain entities for store uptime monitoring.
//!
//! The stored entities (`Poll`, `BusinessHour`, `StoreTimezone`) are written
//! only by the ingest layer and read-only to the report engine. `StoreReport`
//! is the per-store output row.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Observed store status at a poll instant.
///
/// Statuses are parsed case-insensitively. Anything other than `active` /
/// `inactive` is preserved verbatim but never counts toward uptime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PollStatus {
    Active,
    Inactive,
    Other(String),
}

impl PollStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "active" => PollStatus::Active,
            "inactive" => PollStatus::Inactive,
            _ => PollStatus::Other(raw.trim().to_string()),
        }
    }

    /// Only `Active` contributes to uptime.
    pub fn is_active(&self) -> bool {
        matches!(self, PollStatus::Active)
    }

    pub fn as_str(&self) -> &str {
        match self {
            PollStatus::Active => "active",
            PollStatus::Inactive => "inactive",
            PollStatus::Other(s) => s,
        }
    }
}

impl From<String> for PollStatus {
    fn from(s: String) -> Self {
        PollStatus::parse(&s)
    }
}

impl From<PollStatus> for String {
    fn from(status: PollStatus) -> Self {
        status.as_str().to_string()
    }
}

/// A discrete status observation for one store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poll {
    pub store_id: String,
    pub timestamp_utc: DateTime<Utc>,
    pub status: PollStatus,
}

/// One weekly schedule row: the store is open `[start_local, end_local)` on
/// `day_of_week` (0 = Monday). `end_local <= start_local` means the interval
/// crosses midnight into the next local day. Multiple rows per (store, day)
/// are allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessHour {
    pub store_id: String,
    pub day_of_week: u8,
    pub start_local: NaiveTime,
    pub end_local: NaiveTime,
}

/// IANA timezone assignment for a store. Stores without a row use the
/// configured default zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreTimezone {
    pub store_id: String,
    pub timezone: String,
}

/// Per-store report row: uptime/downtime over the three trailing windows,
/// minutes for the last hour and hours for the last day/week, rounded
/// half-to-even to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreReport {
    pub store_id: String,
    pub uptime_last_hour_minutes: f64,
    pub uptime_last_day_hours: f64,
    pub uptime_last_week_hours: f64,
    pub downtime_last_hour_minutes: f64,
    pub downtime_last_day_hours: f64,
    pub downtime_last_week_hours: f64,
}

impl StoreReport {
    /// Zero-valued row, used when a store's computation fails.
    pub fn zeroed(store_id: impl Into<String>) -> Self {
        Self {
            store_id: store_id.into(),
            uptime_last_hour_minutes: 0.0,
            uptime_last_day_hours: 0.0,
            uptime_last_week_hours: 0.0,
            downtime_last_hour_minutes: 0.0,
            downtime_last_day_hours: 0.0,
            downtime_last_week_hours: 0.0,
        }
    }
}
