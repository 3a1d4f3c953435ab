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

//! Phantom-tagged index types.
//!
//! A local-search pipeline juggles several index spaces at once: decision
//! variables, path nodes, operator slots. Raw `usize` invites accidental
//! mixing, so indices are wrapped in `TypedIndex<T>` where the tag type `T`
//! records intent at the type level. The wrapper is `#[repr(transparent)]`
//! over `usize` and compiles away entirely.

/// Names a typed index for `Display` and `Debug` output.
pub trait IndexTag: Copy {
    const NAME: &'static str;
}

/// A strongly typed index tied to a tag type `T`.
///
/// Two `TypedIndex` values with different tags are different types and
/// cannot be compared or substituted for one another.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypedIndex<T> {
    index: usize,
    _marker: std::marker::PhantomData<T>,
}

impl<T> TypedIndex<T> {
    /// Wraps a raw `usize` index.
    #[inline(always)]
    pub const fn new(index: usize) -> Self {
        Self {
            index,
            _marker: std::marker::PhantomData,
        }
    }

    /// Returns the raw `usize` index.
    #[inline(always)]
    pub const fn get(&self) -> usize {
        self.index
    }
}

impl<T> From<usize> for TypedIndex<T> {
    #[inline(always)]
    fn from(index: usize) -> Self {
        Self::new(index)
    }
}

impl<T> From<TypedIndex<T>> for usize {
    #[inline(always)]
    fn from(index: TypedIndex<T>) -> Self {
        index.index
    }
}

impl<T> std::ops::Add<usize> for TypedIndex<T> {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: usize) -> Self {
        Self::new(self.index + rhs)
    }
}

impl<T> std::ops::Sub<usize> for TypedIndex<T> {
    type Output = Self;

    #[inline(always)]
    fn sub(self, rhs: usize) -> Self {
        Self::new(self.index - rhs)
    }
}

impl<T> std::fmt::Display for TypedIndex<T>
where
    T: IndexTag,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", T::NAME, self.index)
    }
}

impl<T> std::fmt::Debug for TypedIndex<T>
where
    T: IndexTag,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", T::NAME, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
    struct TestTag;

    impl IndexTag for TestTag {
        const NAME: &'static str = "TestIndex";
    }

    type TestIndex = TypedIndex<TestTag>;

    #[test]
    fn test_new_and_get_roundtrip() {
        let i = TestIndex::new(7);
        assert_eq!(i.get(), 7);
    }

    #[test]
    fn test_display_uses_tag_name() {
        let i = TestIndex::new(3);
        assert_eq!(format!("{}", i), "TestIndex(3)");
        assert_eq!(format!("{:?}", i), "TestIndex(3)");
    }

    #[test]
    fn test_conversions() {
        let i: TestIndex = 5usize.into();
        let raw: usize = i.into();
        assert_eq!(raw, 5);
    }

    #[test]
    fn test_arithmetic_with_usize() {
        let i = TestIndex::new(4);
        assert_eq!((i + 2).get(), 6);
        assert_eq!((i - 1).get(), 3);
    }

    #[test]
    fn test_ordering_follows_raw_index() {
        assert!(TestIndex::new(1) < TestIndex::new(2));
        assert_eq!(TestIndex::new(2), TestIndex::new(2));
    }
}
