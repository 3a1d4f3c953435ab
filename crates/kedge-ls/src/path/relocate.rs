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

//! Relocation.

use crate::{operator::LocalSearchOperator, path::PathState};
use kedge_model::{assignment::Assignment, index::VarIndex};

/// Moves a fixed-length chain to another position. With a chain length of
/// one this simply moves a node.
///
/// Neighbors for the route `0 → 1 → 2 → 3 → 4` and chain length two (route
/// ends cannot move) visit the nodes in the orders `0,3,1,2,4` and
/// `0,2,3,1,4`.
///
/// Chaining lengths one to three on a single route yields the classical
/// Or-opt operator, a restricted 3-opt.
pub struct Relocate {
    path: PathState,
    chain_length: usize,
    single_path: bool,
}

impl Relocate {
    /// Creates the operator.
    ///
    /// With `single_path` set, both cursors stay on one route.
    ///
    /// # Panics
    ///
    /// Panics if `chain_length` is zero.
    pub fn new(
        next_vars: Vec<VarIndex>,
        path_vars: Option<Vec<VarIndex>>,
        chain_length: usize,
        single_path: bool,
    ) -> Self {
        assert!(
            chain_length > 0,
            "called `Relocate::new` with a zero chain length"
        );
        Self {
            path: PathState::new(next_vars, path_vars, 2, vec![false, single_path]),
            chain_length,
            single_path,
        }
    }
}

impl LocalSearchOperator for Relocate {
    fn name(&self) -> &str {
        "Relocate"
    }

    fn start(&mut self, assignment: &Assignment) {
        self.path.start(assignment);
    }

    fn make_next_neighbor(&mut self, delta: &mut Assignment, deltadelta: &mut Assignment) -> bool {
        let chain_length = self.chain_length;
        let single_path = self.single_path;
        self.path.next_neighbor(delta, deltadelta, false, |p| {
            debug_assert!(!single_path || p.start_node(0) == p.start_node(1));
            let before_chain = p.base_node(0);
            let mut chain_end = before_chain;
            for _ in 0..chain_length {
                if p.is_path_end(chain_end) {
                    return false;
                }
                chain_end = p.next(chain_end);
            }
            let destination = p.base_node(1);
            p.move_chain(before_chain, chain_end, destination)
        })
    }
}
