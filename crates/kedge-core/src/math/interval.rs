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

//! Inclusive integer intervals.
//!
//! A `ClosedInterval<T>` is the contiguous set of integers `[lo, hi]` with
//! both bounds included. Integer-variable domains are unions of such
//! intervals, so the operations here are the ones domains need: membership,
//! cardinality, intersection and adjacency.

use num_traits::PrimInt;

/// An inclusive interval `[lo, hi]`.
///
/// # Invariants
///
/// `lo <= hi` always holds; an empty set is represented by the absence of
/// an interval, never by an inverted one.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClosedInterval<T>
where
    T: PrimInt,
{
    lo: T,
    hi: T,
}

impl<T> ClosedInterval<T>
where
    T: PrimInt,
{
    /// Creates a new interval.
    ///
    /// # Panics
    ///
    /// Panics if `lo > hi`.
    #[inline]
    pub fn new(lo: T, hi: T) -> Self {
        assert!(
            lo <= hi,
            "called `ClosedInterval::new` with an inverted interval: lo must be less than or equal to hi"
        );
        Self { lo, hi }
    }

    /// Creates a new interval if the bounds are ordered, `None` otherwise.
    #[inline]
    pub fn try_new(lo: T, hi: T) -> Option<Self> {
        if lo <= hi { Some(Self { lo, hi }) } else { None }
    }

    /// Creates a single-point interval `[v, v]`.
    #[inline]
    pub fn singleton(v: T) -> Self {
        Self { lo: v, hi: v }
    }

    /// Returns the inclusive lower bound.
    #[inline]
    pub const fn lo(&self) -> T {
        self.lo
    }

    /// Returns the inclusive upper bound.
    #[inline]
    pub const fn hi(&self) -> T {
        self.hi
    }

    /// Returns `true` if `v` lies within the interval.
    #[inline]
    pub fn contains(&self, v: T) -> bool {
        self.lo <= v && v <= self.hi
    }

    /// Returns `true` if the interval holds exactly one value.
    #[inline]
    pub fn is_singleton(&self) -> bool {
        self.lo == self.hi
    }

    /// Returns the number of integers in the interval.
    ///
    /// Saturates at `u64::MAX` for intervals wider than `u64` can count.
    #[inline]
    pub fn len(&self) -> u64 {
        let width = self.hi.to_i128().unwrap_or(i128::MAX) - self.lo.to_i128().unwrap_or(0);
        u64::try_from(width + 1).unwrap_or(u64::MAX)
    }

    /// Returns `true` if `other` overlaps this interval.
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.lo <= other.hi && other.lo <= self.hi
    }

    /// Returns the intersection of two intervals, `None` when disjoint.
    #[inline]
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        Self::try_new(
            if self.lo > other.lo { self.lo } else { other.lo },
            if self.hi < other.hi { self.hi } else { other.hi },
        )
    }
}

impl<T> std::fmt::Debug for ClosedInterval<T>
where
    T: PrimInt + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}, {:?}]", self.lo, self.hi)
    }
}

impl<T> std::fmt::Display for ClosedInterval<T>
where
    T: PrimInt + std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.lo, self.hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_valid_bounds() {
        let iv = ClosedInterval::new(2, 5);
        assert_eq!(iv.lo(), 2);
        assert_eq!(iv.hi(), 5);
        assert_eq!(iv.len(), 4);
    }

    #[test]
    #[should_panic(expected = "inverted interval")]
    fn test_new_inverted_bounds_panics() {
        let _ = ClosedInterval::new(5, 2);
    }

    #[test]
    fn test_try_new_rejects_inverted() {
        assert!(ClosedInterval::try_new(0, 0).is_some());
        assert!(ClosedInterval::try_new(1, 0).is_none());
    }

    #[test]
    fn test_contains_and_singleton() {
        let iv = ClosedInterval::new(-3, 3);
        assert!(iv.contains(-3));
        assert!(iv.contains(0));
        assert!(iv.contains(3));
        assert!(!iv.contains(4));
        assert!(!iv.is_singleton());
        assert!(ClosedInterval::singleton(7).is_singleton());
    }

    #[test]
    fn test_intersect() {
        let a = ClosedInterval::new(0, 10);
        let b = ClosedInterval::new(5, 15);
        assert_eq!(a.intersect(&b), Some(ClosedInterval::new(5, 10)));
        let c = ClosedInterval::new(11, 12);
        assert_eq!(a.intersect(&c), None);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_len_of_full_i64_range_saturates() {
        let iv = ClosedInterval::new(i64::MIN, i64::MAX);
        assert_eq!(iv.len(), u64::MAX);
    }

    #[test]
    fn test_display() {
        assert_eq!(ClosedInterval::new(1, 2).to_string(), "[1, 2]");
    }
}
