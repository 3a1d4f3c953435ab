// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Integer variable domains.
//!
//! A domain is a non-empty union of disjoint, sorted inclusive intervals.
//! The local search only reads domains (membership, bounds, boundedness);
//! narrowing is the host solver's business.

use kedge_core::math::interval::ClosedInterval;
use smallvec::SmallVec;

/// The set of values an integer decision variable may take.
///
/// # Invariants
///
/// The interval list is non-empty, sorted by lower bound, and gap-separated:
/// consecutive intervals neither overlap nor touch.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Domain {
    intervals: SmallVec<[ClosedInterval<i64>; 2]>,
}

impl Domain {
    /// Creates the domain `[lo, hi]`.
    ///
    /// # Panics
    ///
    /// Panics if `lo > hi`.
    #[inline]
    pub fn interval(lo: i64, hi: i64) -> Self {
        Self {
            intervals: smallvec::smallvec![ClosedInterval::new(lo, hi)],
        }
    }

    /// Creates the single-value domain `{v}`.
    #[inline]
    pub fn singleton(v: i64) -> Self {
        Self {
            intervals: smallvec::smallvec![ClosedInterval::singleton(v)],
        }
    }

    /// Creates a domain from an explicit value list.
    ///
    /// Adjacent and duplicate values are merged into intervals.
    ///
    /// # Panics
    ///
    /// Panics if `values` is empty.
    pub fn values(values: &[i64]) -> Self {
        assert!(
            !values.is_empty(),
            "called `Domain::values` with an empty value list"
        );
        let mut sorted = values.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut intervals: SmallVec<[ClosedInterval<i64>; 2]> = SmallVec::new();
        let mut lo = sorted[0];
        let mut hi = sorted[0];
        for &v in &sorted[1..] {
            if v == hi + 1 {
                hi = v;
            } else {
                intervals.push(ClosedInterval::new(lo, hi));
                lo = v;
                hi = v;
            }
        }
        intervals.push(ClosedInterval::new(lo, hi));
        Self { intervals }
    }

    /// Returns the smallest value in the domain.
    #[inline]
    pub fn min(&self) -> i64 {
        self.intervals[0].lo()
    }

    /// Returns the largest value in the domain.
    #[inline]
    pub fn max(&self) -> i64 {
        self.intervals[self.intervals.len() - 1].hi()
    }

    /// Returns `true` if `v` is a member of the domain.
    pub fn contains(&self, v: i64) -> bool {
        self.intervals
            .binary_search_by(|iv| {
                if v < iv.lo() {
                    std::cmp::Ordering::Greater
                } else if v > iv.hi() {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    /// Returns `true` if the domain holds exactly one value.
    #[inline]
    pub fn bound(&self) -> bool {
        self.intervals.len() == 1 && self.intervals[0].is_singleton()
    }

    /// Returns the number of values in the domain, saturating at `u64::MAX`.
    pub fn size(&self) -> u64 {
        self.intervals
            .iter()
            .fold(0u64, |acc, iv| acc.saturating_add(iv.len()))
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, iv) in self.intervals.iter().enumerate() {
            if i > 0 {
                write!(f, " ∪ ")?;
            }
            write!(f, "{}", iv)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_domain_bounds() {
        let d = Domain::interval(-2, 7);
        assert_eq!(d.min(), -2);
        assert_eq!(d.max(), 7);
        assert_eq!(d.size(), 10);
        assert!(!d.bound());
    }

    #[test]
    fn test_singleton_is_bound() {
        let d = Domain::singleton(4);
        assert!(d.bound());
        assert_eq!(d.min(), 4);
        assert_eq!(d.max(), 4);
        assert_eq!(d.size(), 1);
    }

    #[test]
    fn test_values_merges_runs() {
        let d = Domain::values(&[5, 1, 2, 3, 9, 2]);
        assert_eq!(d.min(), 1);
        assert_eq!(d.max(), 9);
        assert_eq!(d.size(), 5);
        assert!(d.contains(1));
        assert!(d.contains(3));
        assert!(d.contains(5));
        assert!(d.contains(9));
        assert!(!d.contains(4));
        assert!(!d.contains(6));
    }

    #[test]
    #[should_panic(expected = "empty value list")]
    fn test_values_empty_panics() {
        let _ = Domain::values(&[]);
    }

    #[test]
    fn test_contains_on_interval_edges() {
        let d = Domain::interval(0, 3);
        assert!(d.contains(0));
        assert!(d.contains(3));
        assert!(!d.contains(-1));
        assert!(!d.contains(4));
    }

    #[test]
    fn test_display_lists_intervals() {
        let d = Domain::values(&[0, 1, 5]);
        assert_eq!(d.to_string(), "[0, 1] ∪ [5, 5]");
    }
}
