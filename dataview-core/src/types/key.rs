//! Cache key derivation.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{DataviewError, Result};

/// Query parameters that map to a cache key.
///
/// Keys must be deterministic and collision-free: two distinct queries never share a
/// key, and the same query always produces the same key.
pub trait QueryKey: Clone + Send + Sync + 'static {
    /// Returns the cache key for these parameters.
    fn cache_key(&self) -> String;

    /// Keys a view is likely to want next. Prefetched after a successful load.
    fn adjacent(&self) -> Vec<Self> {
        Vec::new()
    }
}

impl QueryKey for String {
    fn cache_key(&self) -> String {
        self.clone()
    }
}

/// A calendar month.
///
/// Renders as `"YYYY-MM"`, which is also its cache key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    /// Creates a month key. `month` is 1-based.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(DataviewError::ConfigError(format!(
                "month must be between 1 and 12, got {}",
                month
            )));
        }
        Ok(Self { year, month })
    }

    /// Returns the month containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Returns the current month in local time.
    pub fn current() -> Self {
        Self::from_date(chrono::Local::now().date_naive())
    }

    /// Year component.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Month component (1-12).
    pub fn month(&self) -> u32 {
        self.month
    }

    /// Returns the month `delta` months away (negative goes back).
    pub fn offset(&self, delta: i32) -> Self {
        let index = self.year * 12 + (self.month as i32 - 1) + delta;
        Self {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    /// The previous month.
    pub fn previous(&self) -> Self {
        self.offset(-1)
    }

    /// The next month.
    pub fn next(&self) -> Self {
        self.offset(1)
    }

    /// Months from `radius` before to `radius` after this one, in order.
    ///
    /// `around(1)` is the three-month window a bulk calendar request covers.
    pub fn around(&self, radius: u32) -> Vec<Self> {
        let radius = radius as i32;
        (-radius..=radius).map(|delta| self.offset(delta)).collect()
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = DataviewError;

    /// Parses `"YYYY-MM"`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || DataviewError::ConfigError(format!("expected YYYY-MM, got '{}'", s));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

impl QueryKey for MonthKey {
    fn cache_key(&self) -> String {
        self.to_string()
    }

    fn adjacent(&self) -> Vec<Self> {
        vec![self.previous(), self.next()]
    }
}
