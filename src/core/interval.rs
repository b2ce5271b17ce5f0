//! Closed integer intervals
//!
//! All annotation coordinates are 1-based and inclusive on both ends,
//! exactly as they appear in GTF files.

use crate::core::error::IntervalError;

/// A closed interval `[start, end]` with `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Interval {
    pub start: u64,
    pub end: u64,
}

impl Interval {
    /// Create an interval, rejecting `start > end`
    ///
    /// # Examples
    /// ```
    /// use fast_peakmap::core::Interval;
    /// assert!(Interval::new(5, 10).is_ok());
    /// assert!(Interval::new(10, 5).is_err());
    /// ```
    pub fn new(start: u64, end: u64) -> Result<Self, IntervalError> {
        if start > end {
            return Err(IntervalError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// `floor((start + end) / 2)`, computed without overflow
    pub fn center(&self) -> u64 {
        self.start + (self.end - self.start) / 2
    }

    /// Number of bases covered
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Always false; a closed interval covers at least one base
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Inclusive containment test
    pub fn contains(&self, point: u64) -> bool {
        self.start <= point && point <= self.end
    }

    /// True when the two intervals share at least one position
    pub fn overlaps(&self, other: &Interval) -> bool {
        overlaps((self.start, self.end), (other.start, other.end))
    }

    /// Minimal interval covering every interval in `intervals`
    ///
    /// Returns `None` for an empty group.
    pub fn spanning<I>(intervals: I) -> Option<Interval>
    where
        I: IntoIterator<Item = Interval>,
    {
        intervals.into_iter().fold(None, |acc, iv| match acc {
            None => Some(iv),
            Some(span) => Some(Interval {
                start: span.start.min(iv.start),
                end: span.end.max(iv.end),
            }),
        })
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl From<Interval> for (u64, u64) {
    fn from(iv: Interval) -> Self {
        (iv.start, iv.end)
    }
}

/// Overlap predicate on raw `(start, end)` pairs
///
/// True when `max(a.start, b.start) <= min(a.end, b.end)`.
///
/// # Examples
/// ```
/// use fast_peakmap::core::overlaps;
/// assert!(overlaps((0, 10), (5, 15)));
/// assert!(!overlaps((0, 5), (6, 10)));
/// ```
pub fn overlaps(a: (u64, u64), b: (u64, u64)) -> bool {
    a.0.max(b.0) <= a.1.min(b.1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_reversed() {
        assert_eq!(
            Interval::new(10, 5),
            Err(IntervalError::InvalidRange { start: 10, end: 5 })
        );
        assert!(Interval::new(5, 5).is_ok());
    }

    #[test]
    fn test_center_floors() {
        assert_eq!(Interval::new(10, 20).unwrap().center(), 15);
        assert_eq!(Interval::new(10, 21).unwrap().center(), 15);
        assert_eq!(Interval::new(7, 7).unwrap().center(), 7);
        assert_eq!(Interval::new(u64::MAX - 1, u64::MAX).unwrap().center(), u64::MAX - 1);
    }

    #[test]
    fn test_contains_is_inclusive() {
        let iv = Interval::new(10, 20).unwrap();
        assert!(iv.contains(10));
        assert!(iv.contains(20));
        assert!(!iv.contains(9));
        assert!(!iv.contains(21));
        assert_eq!(iv.len(), 11);
    }

    #[test]
    fn test_overlaps_fixed_cases() {
        assert!(overlaps((0, 10), (5, 15)));
        assert!(!overlaps((0, 5), (6, 10)));
        // touching endpoints share a base
        assert!(overlaps((0, 5), (5, 10)));
        assert!(overlaps((0, 100), (40, 50)));
    }

    #[test]
    fn test_spanning() {
        let ivs = vec![
            Interval::new(10, 20).unwrap(),
            Interval::new(25, 30).unwrap(),
            Interval::new(5, 8).unwrap(),
        ];
        assert_eq!(Interval::spanning(ivs), Some(Interval { start: 5, end: 30 }));
        assert_eq!(Interval::spanning(Vec::new()), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Interval::new(1, 9).unwrap().to_string(), "1-9");
    }
}
