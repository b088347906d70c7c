//! `TimeWindow`: a half-open wall-clock interval value object (§4.1).

use super::duration::Duration as SchedDuration;
use crate::error::{SchedulerError, SchedulerResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A half-open `[start, end)` wall-clock interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> SchedulerResult<Self> {
        if end < start {
            return Err(SchedulerError::Validation(format!(
                "time window end {end} precedes start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Half-open overlap: `self.start < other.end && other.start < self.end`.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }

    pub fn duration(&self) -> SchedDuration {
        let minutes = (self.end - self.start).num_seconds() as f64 / 60.0;
        SchedDuration::from_minutes_f64(minutes.max(0.0))
            .expect("end >= start guarantees a non-negative duration")
    }

    /// True iff the windows touch with no gap and no overlap, in either order.
    pub fn is_adjacent_to(&self, other: &TimeWindow) -> bool {
        self.end == other.start || other.end == self.start
    }
}
