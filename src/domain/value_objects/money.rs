//! `Money`: operator cost accounting, represented as integer minor units.

use crate::error::{SchedulerError, SchedulerResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// An amount of money in minor units (cents). Never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money {
    cents: i64,
}

impl Money {
    pub const ZERO: Money = Money { cents: 0 };

    pub fn from_cents(cents: i64) -> SchedulerResult<Self> {
        if cents < 0 {
            return Err(SchedulerError::Validation(format!(
                "money amount cannot be negative: {cents} cents"
            )));
        }
        Ok(Self { cents })
    }

    pub fn from_dollars(dollars: f64) -> SchedulerResult<Self> {
        if dollars < 0.0 {
            return Err(SchedulerError::Validation(format!(
                "money amount cannot be negative: {dollars} dollars"
            )));
        }
        Ok(Self {
            cents: (dollars * 100.0).round() as i64,
        })
    }

    pub fn as_dollars(&self) -> f64 {
        self.cents as f64 / 100.0
    }

    pub fn checked_mul_rate(self, rate_per_minute_dollars: f64, minutes: f64) -> SchedulerResult<Money> {
        if rate_per_minute_dollars < 0.0 || minutes < 0.0 {
            return Err(SchedulerError::Validation(
                "cost rate and minutes must be non-negative".to_string(),
            ));
        }
        Money::from_dollars(rate_per_minute_dollars * minutes)
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money {
            cents: self.cents + rhs.cents,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.as_dollars())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative() {
        assert!(Money::from_cents(-1).is_err());
    }

    #[test]
    fn sums_correctly() {
        let a = Money::from_dollars(1.50).unwrap();
        let b = Money::from_dollars(2.25).unwrap();
        assert_eq!((a + b).as_dollars(), 3.75);
    }
}
