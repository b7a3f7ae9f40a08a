//! Half-open UTC time intervals and the operations the report engine is
//! built from: duration, overlap, clipping, and union-merge of sorted
//! sequences.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::PollStatus;

/// Half-open interval `[start, end)` of UTC instants. Invariant: `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeInterval {
    /// Build an interval, rejecting empty or inverted ranges.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// Trailing window of `length` ending at `end`.
    pub fn trailing(end: DateTime<Utc>, length: Duration) -> Self {
        debug_assert!(length > Duration::zero());
        Self {
            start: end - length,
            end,
        }
    }

    pub fn duration_seconds(&self) -> f64 {
        (self.end - self.start).num_milliseconds() as f64 / 1000.0
    }

    /// Overlap with `other` in seconds: `max(0, min(ends) - max(starts))`.
    pub fn overlap_seconds(&self, other: &TimeInterval) -> f64 {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        ((end - start).num_milliseconds() as f64 / 1000.0).max(0.0)
    }

    /// Intersect with `bounds`, returning `None` if nothing remains.
    pub fn clip(&self, bounds: &TimeInterval) -> Option<TimeInterval> {
        TimeInterval::new(self.start.max(bounds.start), self.end.min(bounds.end))
    }
}

/// A time range during which a store is attributed a single status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusInterval {
    pub interval: TimeInterval,
    pub status: PollStatus,
}

/// Union of intervals already sorted by `start`. Touching intervals
/// (`next.start <= running.end`) are absorbed; the result is pairwise
/// disjoint and covers the same point-set as the input.
pub fn merge_sorted(intervals: Vec<TimeInterval>) -> Vec<TimeInterval> {
    let mut merged: Vec<TimeInterval> = Vec::with_capacity(intervals.len());
    for interval in intervals {
        match merged.last_mut() {
            Some(last) if interval.start <= last.end => {
                last.end = last.end.max(interval.end);
            }
            _ => merged.push(interval),
        }
    }
    merged
}
