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

//! Plain large neighborhood search.
//!
//! LNS operators do not build a candidate themselves: they deactivate a
//! *fragment* of the variables and leave completion to the nested solve.
//! `SimpleLns` frees consecutive index windows, `RandomLns` frees uniformly
//! random ones.

use crate::operator::{LocalSearchOperator, OperatorVars, SkipPolicy};
use kedge_model::{assignment::Assignment, index::VarIndex};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Frees a window of `chunk` consecutive variables, sliding the window by
/// one per candidate and wrapping around the end of the variable set.
pub struct SimpleLns {
    vars: OperatorVars,
    index: usize,
    chunk: usize,
}

impl SimpleLns {
    /// Creates the operator.
    ///
    /// # Panics
    ///
    /// Panics if `chunk` is zero.
    pub fn new(vars: Vec<VarIndex>, chunk: usize) -> Self {
        assert!(chunk > 0, "called `SimpleLns::new` with a zero-length chunk");
        Self {
            vars: OperatorVars::new(vars),
            index: 0,
            chunk,
        }
    }
}

impl LocalSearchOperator for SimpleLns {
    fn name(&self) -> &str {
        "SimpleLns"
    }

    fn start(&mut self, assignment: &Assignment) {
        self.vars.start_from(assignment);
        self.index = 0;
    }

    fn make_next_neighbor(&mut self, delta: &mut Assignment, deltadelta: &mut Assignment) -> bool {
        self.vars.revert_changes(true, false);
        let size = self.vars.len();
        if self.index >= size {
            return false;
        }
        for i in self.index..self.index + self.chunk {
            self.vars.deactivate(i % size);
        }
        self.index += 1;
        self.vars
            .apply_changes(delta, deltadelta, false, SkipPolicy::Never);
        true
    }
}

/// Frees `chunk` uniformly random variables per candidate, repetition
/// allowed. The neighborhood never exhausts on its own; a search limit has
/// to stop it.
pub struct RandomLns<R: Rng> {
    vars: OperatorVars,
    rng: R,
    chunk: usize,
}

impl RandomLns<StdRng> {
    /// Creates the operator with a seeded standard generator.
    pub fn with_seed(vars: Vec<VarIndex>, chunk: usize, seed: u64) -> Self {
        Self::new(vars, chunk, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomLns<R> {
    /// Creates the operator over an explicit generator.
    ///
    /// # Panics
    ///
    /// Panics if `chunk` is zero or exceeds the number of variables.
    pub fn new(vars: Vec<VarIndex>, chunk: usize, rng: R) -> Self {
        assert!(chunk > 0, "called `RandomLns::new` with a zero-length chunk");
        assert!(
            chunk <= vars.len(),
            "called `RandomLns::new` with a chunk larger than the variable set: {} > {}",
            chunk,
            vars.len()
        );
        Self {
            vars: OperatorVars::new(vars),
            rng,
            chunk,
        }
    }
}

impl<R: Rng> LocalSearchOperator for RandomLns<R> {
    fn name(&self) -> &str {
        "RandomLns"
    }

    fn start(&mut self, assignment: &Assignment) {
        self.vars.start_from(assignment);
    }

    fn make_next_neighbor(&mut self, delta: &mut Assignment, deltadelta: &mut Assignment) -> bool {
        self.vars.revert_changes(true, false);
        let size = self.vars.len();
        for _ in 0..self.chunk {
            let index = self.rng.random_range(0..size);
            self.vars.deactivate(index);
        }
        self.vars
            .apply_changes(delta, deltadelta, false, SkipPolicy::Never);
        true
    }
}
