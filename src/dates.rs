use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Closed interval `[start, end]` of calendar dates. Both ends are booked days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateInterval {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeError {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl std::fmt::Display for RangeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid range: end {} is before start {}", self.end, self.start)
    }
}

impl std::error::Error for RangeError {}

impl DateInterval {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RangeError> {
        if end < start {
            return Err(RangeError { start, end });
        }
        Ok(Self { start, end })
    }

    /// One-day interval.
    pub fn single(date: NaiveDate) -> Self {
        Self { start: date, end: date }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn overlaps(&self, other: &DateInterval) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn days(&self) -> Days {
        Days {
            next: Some(self.start),
            end: self.end,
        }
    }
}

/// Lazy walk over every date of an interval, both ends included.
#[derive(Debug, Clone)]
pub struct Days {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl Iterator for Days {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next?;
        if current > self.end {
            self.next = None;
            return None;
        }
        self.next = if current == self.end { None } else { current.succ_opt() };
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.next {
            Some(n) if n <= self.end => {
                let len = (self.end - n).num_days() as usize + 1;
                (len, Some(len))
            }
            _ => (0, Some(0)),
        }
    }
}

impl ExactSizeIterator for Days {}

pub fn days_between(start: NaiveDate, end: NaiveDate) -> Result<Days, RangeError> {
    Ok(DateInterval::new(start, end)?.days())
}

pub fn is_within(date: NaiveDate, interval: &DateInterval) -> bool {
    interval.contains(date)
}

pub fn overlaps(a: &DateInterval, b: &DateInterval) -> bool {
    a.overlaps(b)
}
