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

//! The nested verification solve.
//!
//! Candidates that pass the filters are verified by a sub-solver: the
//! candidate assignment (reference overlaid with the delta) is completed
//! and propagated, and the result is reported as an explicit status the
//! driver pattern-matches on instead of unwinding. `NestedSolveDecision`
//! is the latch the phase builder wraps around each nested solve.

use kedge_model::{assignment::Assignment, store::VariableStore};

/// Result of a nested solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// The candidate was completed and committed.
    Found,
    /// Propagation failed; the candidate is infeasible.
    Failed,
    /// A limit or monitor interrupted the solve.
    LimitHit,
}

/// Completes and verifies a candidate assignment.
pub trait SubDecisionBuilder {
    /// Attempts to complete `candidate` into a feasible assignment.
    ///
    /// Deactivated elements are the sub-solver's to decide; activated
    /// elements are fixed. Infeasibility is reported as
    /// [`SolveStatus::Failed`], never as a panic.
    fn solve(&mut self, store: &VariableStore, candidate: &mut Assignment) -> SolveStatus;
}

/// The default sub-solver: re-activates every freed element at its stored
/// value and verifies all values against the domains. Hosts plug in a
/// propagating builder for real completion.
#[derive(Debug, Clone, Copy, Default)]
pub struct RestoreAssignment;

impl SubDecisionBuilder for RestoreAssignment {
    fn solve(&mut self, store: &VariableStore, candidate: &mut Assignment) -> SolveStatus {
        let vars: Vec<_> = candidate
            .int_container()
            .iter()
            .filter(|e| !e.activated())
            .map(|e| e.var())
            .collect();
        for var in vars {
            candidate.activate(var);
        }
        for element in candidate.int_container().iter() {
            if !store.contains(element.var(), element.value()) {
                return SolveStatus::Failed;
            }
        }
        SolveStatus::Found
    }
}

/// State of a nested-solve latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionState {
    /// The nested solve has not run yet.
    Pending,
    /// The nested solve failed.
    Failed,
    /// The nested solve found a solution.
    Found,
}

/// A two-outcome latch around a nested solve.
///
/// `apply` runs the solve once and latches `Pending → Found | Failed`;
/// `refute` is a no-op. In restore mode the caller snapshots the
/// assignment before applying and puts it back on failure; in commit mode
/// the solve's mutations stand.
#[derive(Debug)]
pub struct NestedSolveDecision {
    state: DecisionState,
    restore: bool,
}

impl NestedSolveDecision {
    /// Creates a latch; `restore` selects restore over commit mode.
    pub fn new(restore: bool) -> Self {
        Self {
            state: DecisionState::Pending,
            restore,
        }
    }

    /// Returns the latched state.
    #[inline]
    pub fn state(&self) -> DecisionState {
        self.state
    }

    /// Returns `true` in restore mode.
    #[inline]
    pub fn is_restoring(&self) -> bool {
        self.restore
    }

    /// Re-arms the latch for another nested solve.
    #[inline]
    pub fn reset(&mut self) {
        self.state = DecisionState::Pending;
    }

    /// Runs the nested solve and latches its outcome.
    pub fn apply<F>(&mut self, solve: F) -> SolveStatus
    where
        F: FnOnce() -> SolveStatus,
    {
        debug_assert_eq!(
            self.state,
            DecisionState::Pending,
            "called `NestedSolveDecision::apply` on a decided latch"
        );
        let status = solve();
        self.state = match status {
            SolveStatus::Found => DecisionState::Found,
            SolveStatus::Failed | SolveStatus::LimitHit => DecisionState::Failed,
        };
        status
    }

    /// The right branch of the decision does nothing.
    #[inline]
    pub fn refute(&mut self) {}
}
