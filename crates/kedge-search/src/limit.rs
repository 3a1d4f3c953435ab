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

//! Polled search limits.
//!
//! A `SearchLimit` caps a local-search episode by wall time, explored
//! neighbors, nested-solve failures or committed solutions. Limits are
//! cooperative: the driver polls `check` between neighbor attempts and an
//! exceeded budget terminates the episode cleanly, discarding any in-flight
//! delta. `init` re-arms the limit against the current statistics so each
//! episode gets a fresh budget.

use crate::stats::SearchStatistics;
use std::time::{Duration, Instant};

/// A cooperative budget over time, neighbors, failures and solutions.
///
/// Budgets are optional; an absent budget never triggers. Counter budgets
/// are measured relative to the statistics snapshot taken by [`init`].
///
/// [`init`]: SearchLimit::init
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchLimit {
    time: Option<Duration>,
    neighbors: Option<u64>,
    failures: Option<u64>,
    solutions: Option<u64>,
    start_time: Instant,
    base: SearchStatistics,
}

impl Default for SearchLimit {
    #[inline]
    fn default() -> Self {
        Self::new(None, None, None, None)
    }
}

impl SearchLimit {
    /// Creates a limit with the given optional budgets.
    #[inline]
    pub fn new(
        time: Option<Duration>,
        neighbors: Option<u64>,
        failures: Option<u64>,
        solutions: Option<u64>,
    ) -> Self {
        Self {
            time,
            neighbors,
            failures,
            solutions,
            start_time: Instant::now(),
            base: SearchStatistics::new(),
        }
    }

    /// Creates a wall-clock limit.
    #[inline]
    pub fn time_limit(time: Duration) -> Self {
        Self::new(Some(time), None, None, None)
    }

    /// Creates a neighbor-count limit.
    #[inline]
    pub fn neighbor_limit(neighbors: u64) -> Self {
        Self::new(None, Some(neighbors), None, None)
    }

    /// Creates a committed-solution limit.
    #[inline]
    pub fn solution_limit(solutions: u64) -> Self {
        Self::new(None, None, None, Some(solutions))
    }

    /// Re-arms the limit: restarts the clock and snapshots the counters.
    #[inline]
    pub fn init(&mut self, stats: &SearchStatistics) {
        self.start_time = Instant::now();
        self.base = *stats;
    }

    /// Copies the budgets of `other` without touching the armed state.
    #[inline]
    pub fn copy_budgets_from(&mut self, other: &SearchLimit) {
        self.time = other.time;
        self.neighbors = other.neighbors;
        self.failures = other.failures;
        self.solutions = other.solutions;
    }

    /// Returns `true` if any budget has been exhausted.
    pub fn check(&self, stats: &SearchStatistics) -> bool {
        if let Some(time) = self.time {
            if self.start_time.elapsed() >= time {
                return true;
            }
        }
        if let Some(neighbors) = self.neighbors {
            if stats.neighbors.saturating_sub(self.base.neighbors) >= neighbors {
                return true;
            }
        }
        if let Some(failures) = self.failures {
            if stats.failures.saturating_sub(self.base.failures) >= failures {
                return true;
            }
        }
        if let Some(solutions) = self.solutions {
            if stats
                .accepted_neighbors
                .saturating_sub(self.base.accepted_neighbors)
                >= solutions
            {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limit_never_triggers() {
        let limit = SearchLimit::default();
        let mut stats = SearchStatistics::new();
        stats.neighbors = u64::MAX;
        stats.failures = u64::MAX;
        assert!(!limit.check(&stats));
    }

    #[test]
    fn test_neighbor_budget_relative_to_init() {
        let mut stats = SearchStatistics::new();
        stats.neighbors = 100;

        let mut limit = SearchLimit::neighbor_limit(5);
        limit.init(&stats);
        assert!(!limit.check(&stats));

        stats.neighbors = 104;
        assert!(!limit.check(&stats));
        stats.neighbors = 105;
        assert!(limit.check(&stats));
    }

    #[test]
    fn test_solution_budget() {
        let mut stats = SearchStatistics::new();
        let mut limit = SearchLimit::solution_limit(1);
        limit.init(&stats);
        assert!(!limit.check(&stats));
        stats.on_accepted_neighbor();
        assert!(limit.check(&stats));
    }

    #[test]
    fn test_zero_time_budget_triggers_immediately() {
        let stats = SearchStatistics::new();
        let mut limit = SearchLimit::time_limit(Duration::ZERO);
        limit.init(&stats);
        assert!(limit.check(&stats));
    }

    #[test]
    fn test_copy_budgets() {
        let original = SearchLimit::new(None, Some(3), Some(4), None);
        let mut clone = SearchLimit::default();
        clone.copy_budgets_from(&original);

        let mut stats = SearchStatistics::new();
        clone.init(&stats);
        stats.neighbors = 3;
        assert!(clone.check(&stats));
    }
}
