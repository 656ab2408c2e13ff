//! Calendar years covered by a classification time series

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::error::{Error, Result};

/// A calendar year
pub type Year = i32;

/// First year of the default series
pub const FIRST_YEAR: Year = 1985;
/// Last year of the default series
pub const LAST_YEAR: Year = 2020;

/// Contiguous, inclusive range of years.
///
/// Every pixel sequence and label stack carries exactly one label per year
/// of its range; the range is fixed for the lifetime of the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    first: Year,
    last: Year,
}

impl YearRange {
    /// Create the range `first..=last`
    pub fn new(first: Year, last: Year) -> Result<Self> {
        if first > last {
            return Err(Error::InvalidParameter {
                name: "year_range",
                value: format!("{}..={}", first, last),
                reason: "first year must not be after last year".into(),
            });
        }
        Ok(Self { first, last })
    }

    /// Range starting at `first` and spanning `len` years
    pub fn with_len(first: Year, len: usize) -> Result<Self> {
        if len == 0 {
            return Err(Error::InvalidParameter {
                name: "year_range",
                value: "0".into(),
                reason: "a series needs at least one year".into(),
            });
        }
        let span = Year::try_from(len - 1).map_err(|_| Error::InvalidParameter {
            name: "year_range",
            value: len.to_string(),
            reason: "too many years".into(),
        })?;
        Self::new(first, first + span)
    }

    pub fn first(&self) -> Year {
        self.first
    }

    pub fn last(&self) -> Year {
        self.last
    }

    /// Number of years in the range
    pub fn len(&self) -> usize {
        (self.last - self.first) as usize + 1
    }

    /// Always false: a range holds at least one year
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, year: Year) -> bool {
        (self.first..=self.last).contains(&year)
    }

    /// Whether `other` lies entirely within this range
    pub fn covers(&self, other: &YearRange) -> bool {
        self.first <= other.first && other.last <= self.last
    }

    /// Position of `year` within the range
    pub fn index_of(&self, year: Year) -> Result<usize> {
        if self.contains(year) {
            Ok((year - self.first) as usize)
        } else {
            Err(Error::YearOutOfRange {
                year,
                first: self.first,
                last: self.last,
            })
        }
    }

    /// Year at position `index`
    pub fn year_at(&self, index: usize) -> Option<Year> {
        if index < self.len() {
            Some(self.first + index as Year)
        } else {
            None
        }
    }

    /// Iterate the years in ascending order
    pub fn iter(&self) -> RangeInclusive<Year> {
        self.first..=self.last
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self {
            first: FIRST_YEAR,
            last: LAST_YEAR,
        }
    }
}

impl std::fmt::Display for YearRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.first, self.last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_range() {
        let range = YearRange::default();
        assert_eq!(range.len(), 36);
        assert_eq!(range.index_of(1985).unwrap(), 0);
        assert_eq!(range.index_of(2020).unwrap(), 35);
        assert_eq!(range.year_at(35), Some(2020));
        assert_eq!(range.year_at(36), None);
    }

    #[test]
    fn test_out_of_range() {
        let range = YearRange::default();
        assert!(matches!(
            range.index_of(1984),
            Err(Error::YearOutOfRange { year: 1984, .. })
        ));
        assert!(range.index_of(2021).is_err());
    }

    #[test]
    fn test_with_len_and_covers() {
        let range = YearRange::with_len(2000, 5).unwrap();
        assert_eq!(range.last(), 2004);
        assert!(YearRange::default().covers(&range));
        assert!(!range.covers(&YearRange::default()));
        assert!(YearRange::with_len(2000, 0).is_err());
        assert!(YearRange::new(2001, 2000).is_err());
    }
}
