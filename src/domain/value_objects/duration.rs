//! `Duration`: a non-negative, minute-resolution quantity (§4.1).
//!
//! Internally stored as hundredths of a minute so the "fixed-point
//! rational allowed" clause of §3 holds while conversion to integer
//! minutes for the solver still rounds half-to-even.

use crate::error::{SchedulerError, SchedulerResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

const SCALE: i64 = 100;

/// A non-negative duration, stored at 1/100-minute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Duration {
    hundredths_of_minute: i64,
}

impl Duration {
    pub const ZERO: Duration = Duration {
        hundredths_of_minute: 0,
    };

    /// Construct from whole minutes.
    pub fn from_minutes(minutes: i64) -> SchedulerResult<Self> {
        if minutes < 0 {
            return Err(SchedulerError::Validation(format!(
                "duration cannot be negative: {minutes} minutes"
            )));
        }
        Ok(Self {
            hundredths_of_minute: minutes * SCALE,
        })
    }

    /// Construct from a fractional number of minutes.
    pub fn from_minutes_f64(minutes: f64) -> SchedulerResult<Self> {
        if minutes < 0.0 {
            return Err(SchedulerError::Validation(format!(
                "duration cannot be negative: {minutes} minutes"
            )));
        }
        Ok(Self {
            hundredths_of_minute: (minutes * SCALE as f64).round() as i64,
        })
    }

    pub fn as_minutes_f64(&self) -> f64 {
        self.hundredths_of_minute as f64 / SCALE as f64
    }

    /// Convert to integer minutes for the CP solver, rounding half-to-even.
    pub fn to_minutes_round_half_even(&self) -> i64 {
        let scaled = self.hundredths_of_minute;
        let whole = scaled / SCALE;
        let remainder = scaled % SCALE;
        let half = SCALE / 2;
        if remainder.abs() < half {
            whole
        } else if remainder.abs() > half {
            whole + remainder.signum()
        } else if whole % 2 == 0 {
            whole
        } else {
            whole + remainder.signum()
        }
    }

    /// Equality within 1e-9 minutes, as required by §4.1.
    pub fn approx_eq(&self, other: &Duration) -> bool {
        (self.as_minutes_f64() - other.as_minutes_f64()).abs() < 1e-9
    }

    pub fn checked_sub(self, other: Duration) -> SchedulerResult<Duration> {
        let diff = self.hundredths_of_minute - other.hundredths_of_minute;
        if diff < 0 {
            return Err(SchedulerError::Validation(format!(
                "duration subtraction would go negative: {} - {}",
                self.as_minutes_f64(),
                other.as_minutes_f64()
            )));
        }
        Ok(Duration {
            hundredths_of_minute: diff,
        })
    }

    pub fn checked_mul(self, scalar: f64) -> SchedulerResult<Duration> {
        if scalar < 0.0 {
            return Err(SchedulerError::Validation(
                "duration cannot be scaled by a negative factor".to_string(),
            ));
        }
        Ok(Duration {
            hundredths_of_minute: (self.hundredths_of_minute as f64 * scalar).round() as i64,
        })
    }

    pub fn checked_div(self, scalar: f64) -> SchedulerResult<Duration> {
        if scalar <= 0.0 {
            return Err(SchedulerError::Validation(
                "duration cannot be divided by a non-positive factor".to_string(),
            ));
        }
        Ok(Duration {
            hundredths_of_minute: (self.hundredths_of_minute as f64 / scalar).round() as i64,
        })
    }
}

impl Add for Duration {
    type Output = Duration;
    fn add(self, rhs: Duration) -> Duration {
        Duration {
            hundredths_of_minute: self.hundredths_of_minute + rhs.hundredths_of_minute,
        }
    }
}

impl Sub for Duration {
    type Output = Duration;
    /// Panics on underflow; use `checked_sub` at validation boundaries.
    fn sub(self, rhs: Duration) -> Duration {
        self.checked_sub(rhs)
            .expect("Duration subtraction underflow: use checked_sub at validation boundaries")
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}m", self.as_minutes_f64())
    }
}
