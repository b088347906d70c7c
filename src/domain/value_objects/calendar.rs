//! `BusinessCalendar`: weekday working hours, lunch, and holidays (§3, §4.1).
//!
//! Shape grounded on the teacher's `ResourceCalendar`/`WorkingHours`
//! (`resourcing`/`scheduling::calendar`), generalized from hour-of-day
//! integers to per-weekday `TimeWindow`s plus an explicit lunch window and
//! holiday-date set, per spec.

use super::duration::Duration;
use super::time_window::TimeWindow;
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Start/end clock time for a single weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessCalendar {
    /// Working hours keyed by `chrono::Weekday::num_days_from_monday()` (0..6).
    weekday_hours: HashMap<u8, DayHours>,
    holidays: Vec<NaiveDate>,
    lunch: Option<(NaiveTime, NaiveTime)>,
}

impl BusinessCalendar {
    pub fn new(
        weekday_hours: HashMap<u8, DayHours>,
        holidays: Vec<NaiveDate>,
        lunch: Option<(NaiveTime, NaiveTime)>,
    ) -> Self {
        Self {
            weekday_hours,
            holidays,
            lunch,
        }
    }

    /// Mon-Fri 07:00-16:00 with a 12:00-12:45 lunch, per §3 default.
    pub fn default_calendar() -> Self {
        let hours = DayHours {
            start: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
        };
        let mut weekday_hours = HashMap::new();
        for day in 0..5 {
            weekday_hours.insert(day, hours);
        }
        Self::new(
            weekday_hours,
            Vec::new(),
            Some((
                NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(12, 45, 0).unwrap(),
            )),
        )
    }

    fn day_index(at: DateTime<Utc>) -> u8 {
        at.weekday().num_days_from_monday() as u8
    }

    fn is_holiday(&self, at: DateTime<Utc>) -> bool {
        self.holidays.contains(&at.date_naive())
    }

    fn is_lunch(&self, at: DateTime<Utc>) -> bool {
        match self.lunch {
            Some((start, end)) => {
                let t = at.time();
                t >= start && t < end
            }
            None => false,
        }
    }

    /// Whether `t` falls within configured working hours, outside the
    /// lunch window, and not on a holiday.
    pub fn is_working_time(&self, at: DateTime<Utc>) -> bool {
        if self.is_holiday(at) {
            return false;
        }
        if self.is_lunch(at) {
            return false;
        }
        match self.weekday_hours.get(&Self::day_index(at)) {
            Some(hours) => {
                let t = at.time();
                t >= hours.start && t < hours.end
            }
            None => false,
        }
    }

    /// The number of working minutes within the calendar day containing `at`,
    /// net of the lunch window.
    pub fn working_minutes_in_day(&self, at: DateTime<Utc>) -> Duration {
        if self.is_holiday(at) {
            return Duration::ZERO;
        }
        let Some(hours) = self.weekday_hours.get(&Self::day_index(at)) else {
            return Duration::ZERO;
        };
        let mut minutes = (hours.end - hours.start).num_minutes();
        if let Some((lstart, lend)) = self.lunch {
            if lstart >= hours.start && lend <= hours.end {
                minutes -= (lend - lstart).num_minutes();
            }
        }
        Duration::from_minutes(minutes.max(0))
            .expect("working minutes in a calendar day are never negative")
    }

    /// Whether every instant of the half-open `[start, end)` interval is
    /// working time: the interval must fall on a single non-holiday
    /// calendar day, within that day's configured hours, and must not
    /// overlap the lunch window. `end` is treated as an exclusive bound,
    /// so an interval ending exactly at the day's close is in bounds.
    pub fn is_working_interval(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        if end <= start {
            return self.is_working_time(start);
        }
        if start.date_naive() != end.date_naive() {
            return false;
        }
        if self.is_holiday(start) {
            return false;
        }
        let Some(hours) = self.weekday_hours.get(&Self::day_index(start)) else {
            return false;
        };
        let (t_start, t_end) = (start.time(), end.time());
        if t_start < hours.start || t_end > hours.end {
            return false;
        }
        if let Some((lstart, lend)) = self.lunch {
            if t_start < lend && lstart < t_end {
                return false;
            }
        }
        true
    }

    /// Advance `from` to the next instant that is working time, by probing
    /// in 15-minute steps for up to 2 weeks, then falling back to a
    /// day-start search, per §4.1.
    pub fn next_working_time(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        if self.is_working_time(from) {
            return from;
        }

        let step = chrono::Duration::minutes(15);
        let bound = from + chrono::Duration::weeks(2);
        let mut probe = from;
        while probe < bound {
            if self.is_working_time(probe) {
                return probe;
            }
            probe += step;
        }

        // Fallback: search day-by-day for the next day with configured
        // hours, landing exactly on that day's start time.
        let mut day = from.date_naive();
        for _ in 0..366 {
            day = day.succ_opt().expect("date arithmetic within calendar year range");
            if self.holidays.contains(&day) {
                continue;
            }
            let weekday_idx = day_of_week_index(day.weekday());
            if let Some(hours) = self.weekday_hours.get(&weekday_idx) {
                let naive = day.and_time(hours.start);
                return Utc.from_utc_datetime(&naive);
            }
        }
        from
    }
}

fn day_of_week_index(w: Weekday) -> u8 {
    w.num_days_from_monday() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn working_hours_respected() {
        let cal = BusinessCalendar::default_calendar();
        // 2024-01-01 is a Monday.
        assert!(cal.is_working_time(dt(2024, 1, 1, 9, 0)));
        assert!(!cal.is_working_time(dt(2024, 1, 1, 6, 0)));
        assert!(!cal.is_working_time(dt(2024, 1, 1, 12, 15))); // lunch
    }

    #[test]
    fn weekend_is_not_working_time() {
        let cal = BusinessCalendar::default_calendar();
        // 2024-01-06 is a Saturday.
        assert!(!cal.is_working_time(dt(2024, 1, 6, 9, 0)));
    }

    #[test]
    fn next_working_time_advances_past_lunch() {
        let cal = BusinessCalendar::default_calendar();
        let noon = dt(2024, 1, 1, 12, 10);
        let next = cal.next_working_time(noon);
        assert!(cal.is_working_time(next));
        assert!(next >= dt(2024, 1, 1, 12, 45));
    }

    #[test]
    fn next_working_time_is_idempotent() {
        let cal = BusinessCalendar::default_calendar();
        let at = dt(2024, 1, 6, 3, 0); // Saturday
        let once = cal.next_working_time(at);
        let twice = cal.next_working_time(once);
        assert_eq!(once, twice);
    }

    #[test]
    fn working_interval_rejects_span_crossing_lunch() {
        let cal = BusinessCalendar::default_calendar();
        assert!(!cal.is_working_interval(dt(2024, 1, 1, 11, 30), dt(2024, 1, 1, 13, 0)));
    }

    #[test]
    fn working_interval_accepts_exact_close_as_exclusive_end() {
        let cal = BusinessCalendar::default_calendar();
        assert!(cal.is_working_interval(dt(2024, 1, 1, 15, 0), dt(2024, 1, 1, 16, 0)));
    }

    #[test]
    fn working_interval_rejects_start_before_open() {
        let cal = BusinessCalendar::default_calendar();
        assert!(!cal.is_working_interval(dt(2024, 1, 1, 6, 30), dt(2024, 1, 1, 8, 0)));
    }

    #[test]
    fn working_interval_rejects_span_crossing_day_boundary() {
        let cal = BusinessCalendar::default_calendar();
        assert!(!cal.is_working_interval(dt(2024, 1, 1, 15, 0), dt(2024, 1, 2, 8, 0)));
    }

    #[test]
    fn working_minutes_in_day_nets_out_lunch() {
        let cal = BusinessCalendar::default_calendar();
        let minutes = cal.working_minutes_in_day(dt(2024, 1, 1, 9, 0));
        // 07:00-16:00 = 540m, minus 45m lunch = 495m.
        assert_eq!(minutes, Duration::from_minutes(495).unwrap());
    }
}
