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

//! Solution pools.
//!
//! A pool decouples the driver from the policy of which solution to
//! explore next: it is seeded with the initial assignment, told about
//! every committed neighbor, asked for the next reference, and polled
//! periodically for whether the reference should be refreshed mid-episode.

use kedge_model::assignment::Assignment;

/// The reference-selection policy of the driver.
pub trait SolutionPool {
    /// Seeds the pool from the initial assignment.
    fn initialize(&mut self, assignment: &Assignment);

    /// Records a committed neighbor.
    fn register_new_solution(&mut self, assignment: &Assignment);

    /// Writes the next reference to explore into `assignment`.
    fn get_next_solution(&self, assignment: &mut Assignment);

    /// Polled periodically; `true` asks the driver to refresh its
    /// reference right away.
    fn sync_needed(&mut self, reference: &Assignment) -> bool;
}

/// Stores a single reference assignment and never requests a refresh.
#[derive(Debug, Clone, Default)]
pub struct DefaultSolutionPool {
    reference: Assignment,
}

impl DefaultSolutionPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SolutionPool for DefaultSolutionPool {
    fn initialize(&mut self, assignment: &Assignment) {
        self.reference.copy_from(assignment);
    }

    fn register_new_solution(&mut self, assignment: &Assignment) {
        self.reference.copy_from(assignment);
    }

    fn get_next_solution(&self, assignment: &mut Assignment) {
        assignment.copy_from(&self.reference);
    }

    fn sync_needed(&mut self, _reference: &Assignment) -> bool {
        false
    }
}
