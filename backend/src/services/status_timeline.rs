//! Status timeline reconstruction.
//!
//! Turns a store's sparse, irregular poll sequence into a continuous
//! status signal via midpoint interpolation: each poll owns the time from
//! the midpoint toward its predecessor up to the midpoint toward its
//! successor. Edge polls are extended by the reconstruction margin so the
//! signal stays defined at the window boundaries.

use chrono::Duration;

use crate::models::{Poll, StatusInterval, TimeInterval};

/// Reconstruct status intervals for `window`, extended by `margin` on both
/// sides. `polls` must be sorted ascending by timestamp (the repository
/// returns them that way); output intervals are sorted, non-overlapping,
/// and clipped to `[window.start - margin, window.end + margin)`.
///
/// No polls means no signal: the caller treats all business time in the
/// window as downtime.
pub fn build_status_intervals(
    polls: &[Poll],
    window: TimeInterval,
    margin: Duration,
) -> Vec<StatusInterval> {
    if polls.is_empty() {
        return Vec::new();
    }
    debug_assert!(
        polls
            .windows(2)
            .all(|p| p[0].timestamp_utc <= p[1].timestamp_utc),
        "polls must be sorted ascending"
    );

    let bounds = TimeInterval {
        start: window.start - margin,
        end: window.end + margin,
    };

    let midpoints: Vec<_> = polls
        .windows(2)
        .map(|pair| pair[0].timestamp_utc + (pair[1].timestamp_utc - pair[0].timestamp_utc) / 2)
        .collect();

    let n = polls.len();
    let mut intervals = Vec::with_capacity(n);
    for (i, poll) in polls.iter().enumerate() {
        let start = if i > 0 {
            midpoints[i - 1]
        } else {
            poll.timestamp_utc - margin
        };
        let end = if i < n - 1 {
            midpoints[i]
        } else {
            poll.timestamp_utc + margin
        };

        let candidate = match TimeInterval::new(start, end) {
            Some(interval) => interval,
            // Duplicate timestamps collapse the midpoint span to zero.
            None => continue,
        };
        if let Some(clipped) = candidate.clip(&bounds) {
            intervals.push(StatusInterval {
                interval: clipped,
                status: poll.status.clone(),
            });
        }
    }

    intervals
}
