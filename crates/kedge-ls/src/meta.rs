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

//! The metaheuristic hook.
//!
//! The driver consults a metaheuristic at three points: as an additional
//! delta filter before the local filters, after a full episode that
//! produced at least one accepted neighbor, and at a local optimum, where
//! the metaheuristic may claim the search should continue (tabu lists,
//! restarts, penalties). The default policy is plain greedy descent.

use kedge_model::assignment::Assignment;

/// Acceptance strategy hooks around the neighbor loop.
pub trait Metaheuristic {
    /// Returns the strategy name for identification purposes.
    fn name(&self) -> &str;

    /// Votes on a delta before the local filters run.
    fn accept_delta(&mut self, delta: &Assignment, deltadelta: &Assignment) -> bool;

    /// Called once per episode that ended after accepting a neighbor.
    fn on_neighbor_accepted(&mut self);

    /// Called when an episode ends without any accepted neighbor.
    ///
    /// Returning `true` claims the local optimum: the driver keeps
    /// exploring instead of halting.
    fn at_local_optimum(&mut self) -> bool;
}

impl std::fmt::Debug for dyn Metaheuristic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Metaheuristic {{ name: {} }}", self.name())
    }
}

/// Accepts everything and stops at the first local optimum.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyDescent;

impl Metaheuristic for GreedyDescent {
    fn name(&self) -> &str {
        "GreedyDescent"
    }

    fn accept_delta(&mut self, _delta: &Assignment, _deltadelta: &Assignment) -> bool {
        true
    }

    fn on_neighbor_accepted(&mut self) {}

    fn at_local_optimum(&mut self) -> bool {
        false
    }
}
