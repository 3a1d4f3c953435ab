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

//! Statistics reporting for local search runs.
//!
//! A lightweight container for the counters the driver maintains across
//! neighbor attempts: candidates generated, candidates that passed the
//! filters, candidates the nested solve committed, and nested-solve
//! failures. Updates use saturating arithmetic so the hot loop never traps
//! on overflow; monitors and outcome reporting consume the counters for
//! visibility into convergence behavior.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SearchStatistics {
    /// Number of candidate neighbors produced by the operator.
    pub neighbors: u64,

    /// Number of candidates accepted by the filters and the metaheuristic.
    pub filtered_neighbors: u64,

    /// Number of candidates committed by the nested solve.
    pub accepted_neighbors: u64,

    /// Number of nested solves that failed propagation.
    pub failures: u64,
}

impl SearchStatistics {
    /// Creates zeroed statistics.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called when the operator emits a candidate neighbor.
    #[inline]
    pub fn on_neighbor(&mut self) {
        self.neighbors = self.neighbors.saturating_add(1);
    }

    /// Called when a candidate passes all filters.
    #[inline]
    pub fn on_filtered_neighbor(&mut self) {
        self.filtered_neighbors = self.filtered_neighbors.saturating_add(1);
    }

    /// Called when a candidate is committed.
    #[inline]
    pub fn on_accepted_neighbor(&mut self) {
        self.accepted_neighbors = self.accepted_neighbors.saturating_add(1);
    }

    /// Called when a nested solve fails.
    #[inline]
    pub fn on_failure(&mut self) {
        self.failures = self.failures.saturating_add(1);
    }

    /// Number of candidates the filters rejected.
    #[inline]
    pub fn rejected_neighbors(&self) -> u64 {
        self.neighbors.saturating_sub(self.filtered_neighbors)
    }
}

impl std::fmt::Display for SearchStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Kedge-LS Statistics:")?;
        writeln!(f, "   Neighbors:          {}", self.neighbors)?;
        writeln!(f, "   Filtered Neighbors: {}", self.filtered_neighbors)?;
        writeln!(f, "   Accepted Neighbors: {}", self.accepted_neighbors)?;
        writeln!(f, "   Failures:           {}", self.failures)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let stats = SearchStatistics::new();
        assert_eq!(stats.neighbors, 0);
        assert_eq!(stats.filtered_neighbors, 0);
        assert_eq!(stats.accepted_neighbors, 0);
        assert_eq!(stats.failures, 0);
    }

    #[test]
    fn test_counters_increment() {
        let mut stats = SearchStatistics::new();
        stats.on_neighbor();
        stats.on_neighbor();
        stats.on_filtered_neighbor();
        stats.on_accepted_neighbor();
        stats.on_failure();
        assert_eq!(stats.neighbors, 2);
        assert_eq!(stats.filtered_neighbors, 1);
        assert_eq!(stats.accepted_neighbors, 1);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.rejected_neighbors(), 1);
    }

    #[test]
    fn test_saturation_at_max() {
        let mut stats = SearchStatistics {
            neighbors: u64::MAX,
            ..SearchStatistics::new()
        };
        stats.on_neighbor();
        assert_eq!(stats.neighbors, u64::MAX);
    }
}
