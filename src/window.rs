//! Time intervals and the day-aligned windows views are computed over.
//!
//! Windows are built from civil dates in a time zone: a window covering
//! June 3rd to June 10th starts at local midnight on the 3rd and ends at the
//! last nanosecond of the 10th.

use std::fmt;
use std::str::FromStr;

use jiff::civil::Date;
use jiff::tz::TimeZone;
use jiff::{SignedDuration, Timestamp, ToSpan};
use serde::Serialize;

/// Errors that can occur while building a window.
#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    #[error("unsupported window of {0} days (expected one of 1, 3, 7, 14, 30, 60, 90)")]
    UnsupportedDays(String),

    #[error("start date {start} and end date {end} are inverted")]
    Inverted { start: Date, end: Date },

    #[error("date arithmetic failed: {0}")]
    Time(#[from] jiff::Error),
}

pub type Result<T> = core::result::Result<T, WindowError>;

/// A closed time interval. Both endpoints are included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Interval {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl Interval {
    /// A zero-length interval at a single instant.
    pub fn point(at: Timestamp) -> Self {
        Self { start: at, end: at }
    }

    /// Whether two intervals share at least one instant.
    ///
    /// Intervals that only touch at an endpoint intersect.
    pub fn intersects(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// The shared part of two intervals, if any.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        self.intersects(other).then(|| Self {
            start: self.start.max(other.start),
            end: self.end.min(other.end),
        })
    }

    pub fn contains(&self, at: Timestamp) -> bool {
        self.start <= at && at <= self.end
    }
}

/// A number of days a window may span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowDays(u32);

impl WindowDays {
    pub const SUPPORTED: [u32; 7] = [1, 3, 7, 14, 30, 60, 90];

    pub const ONE: Self = Self(1);
    pub const WEEK: Self = Self(7);

    pub fn new(days: u32) -> Result<Self> {
        if Self::SUPPORTED.contains(&days) {
            Ok(Self(days))
        } else {
            Err(WindowError::UnsupportedDays(days.to_string()))
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Days from the first day to the last one.
    fn span_back(self) -> i64 {
        i64::from(self.0) - 1
    }
}

impl FromStr for WindowDays {
    type Err = WindowError;

    fn from_str(s: &str) -> Result<Self> {
        let days = s
            .trim()
            .parse::<u32>()
            .map_err(|_| WindowError::UnsupportedDays(s.to_string()))?;
        Self::new(days)
    }
}

impl fmt::Display for WindowDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A run of whole days in a time zone.
#[derive(Debug, Clone)]
pub struct DateWindow {
    first: Date,
    last: Date,
    tz: TimeZone,
    bounds: Interval,
}

impl DateWindow {
    /// The `days` days ending on `anchor`, inclusive.
    pub fn trailing(anchor: Date, days: WindowDays, tz: &TimeZone) -> Result<Self> {
        let first = anchor.checked_sub(days.span_back().days())?;
        Self::build(first, anchor, tz)
    }

    /// Everything from midnight `days` days before `anchor` through the end
    /// of `anchor`.
    ///
    /// This is the timeline's "last N days": one calendar day wider than
    /// [`DateWindow::trailing`], so a week back from the 10th includes the 3rd.
    pub fn lookback(anchor: Date, days: WindowDays, tz: &TimeZone) -> Result<Self> {
        let first = anchor.checked_sub(i64::from(days.get()).days())?;
        Self::build(first, anchor, tz)
    }

    /// The `days` days starting on `anchor`, inclusive.
    pub fn leading(anchor: Date, days: WindowDays, tz: &TimeZone) -> Result<Self> {
        let last = anchor.checked_add(days.span_back().days())?;
        Self::build(anchor, last, tz)
    }

    /// From the start of `first` to the end of `last`.
    pub fn custom(first: Date, last: Date, tz: &TimeZone) -> Result<Self> {
        if last < first {
            return Err(WindowError::Inverted {
                start: first,
                end: last,
            });
        }
        Self::build(first, last, tz)
    }

    /// The current day in `tz`.
    pub fn today(tz: &TimeZone) -> Result<Self> {
        Self::trailing(today(tz), WindowDays::ONE, tz)
    }

    fn build(first: Date, last: Date, tz: &TimeZone) -> Result<Self> {
        let bounds = Interval {
            start: start_of_day(first, tz)?,
            end: end_of_day(last, tz)?,
        };
        Ok(Self {
            first,
            last,
            tz: tz.clone(),
            bounds,
        })
    }

    pub fn start(&self) -> Timestamp {
        self.bounds.start
    }

    pub fn end(&self) -> Timestamp {
        self.bounds.end
    }

    pub fn first_day(&self) -> Date {
        self.first
    }

    pub fn last_day(&self) -> Date {
        self.last
    }

    pub fn contains(&self, at: Timestamp) -> bool {
        self.bounds.contains(at)
    }

    pub fn intersects(&self, interval: &Interval) -> bool {
        self.bounds.intersects(interval)
    }

    /// Every civil day in the window, in order.
    pub fn days(&self) -> impl Iterator<Item = Date> + '_ {
        self.first
            .series(1.day())
            .take_while(move |day| *day <= self.last)
    }

    /// The civil date of an instant in this window's time zone.
    pub fn local_date(&self, at: Timestamp) -> Date {
        at.to_zoned(self.tz.clone()).date()
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first == self.last {
            write!(f, "{}", self.first)
        } else {
            write!(f, "{} to {}", self.first, self.last)
        }
    }
}

/// The current civil date in `tz`.
pub fn today(tz: &TimeZone) -> Date {
    Timestamp::now().to_zoned(tz.clone()).date()
}

/// The first instant of `date` in `tz`.
pub fn start_of_day(date: Date, tz: &TimeZone) -> Result<Timestamp> {
    Ok(date.to_zoned(tz.clone())?.timestamp())
}

/// The last instant of `date` in `tz`: one nanosecond before the next midnight.
pub fn end_of_day(date: Date, tz: &TimeZone) -> Result<Timestamp> {
    let next = start_of_day(date.tomorrow()?, tz)?;
    Ok(next.checked_sub(SignedDuration::from_nanos(1))?)
}
