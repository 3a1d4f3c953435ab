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

//! Outcome reporting of a local-search phase.

use kedge_search::stats::SearchStatistics;

/// Why the phase stopped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TerminationReason {
    /// The operator produced no accepted neighbor across a full episode
    /// and no metaheuristic claimed the optimum.
    LocalOptimum,

    /// A search limit interrupted the exploration.
    LimitReached,

    /// A monitor requested termination.
    Aborted(String),

    /// The first-solution decision failed; there is nothing to improve.
    NoFirstSolution,
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationReason::LocalOptimum => write!(f, "local optimum reached"),
            TerminationReason::LimitReached => write!(f, "search limit reached"),
            TerminationReason::Aborted(reason) => write!(f, "aborted: {}", reason),
            TerminationReason::NoFirstSolution => write!(f, "no first solution"),
        }
    }
}

/// Final transport object of a phase run. The improved assignment itself
/// stays in the caller's buffer; the outcome carries the bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSearchOutcome {
    termination_reason: TerminationReason,
    statistics: SearchStatistics,
}

impl LocalSearchOutcome {
    /// Bundles a termination reason with the final statistics.
    #[inline]
    pub fn new(termination_reason: TerminationReason, statistics: SearchStatistics) -> Self {
        Self {
            termination_reason,
            statistics,
        }
    }

    /// Returns why the phase stopped.
    #[inline]
    pub fn termination_reason(&self) -> &TerminationReason {
        &self.termination_reason
    }

    /// Returns the final statistics.
    #[inline]
    pub fn statistics(&self) -> &SearchStatistics {
        &self.statistics
    }
}

impl std::fmt::Display for LocalSearchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Termination: {}", self.termination_reason)?;
        write!(f, "{}", self.statistics)
    }
}
