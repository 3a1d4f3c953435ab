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

//! Route crossing.

use crate::{operator::LocalSearchOperator, path::PathState};
use kedge_model::{assignment::Assignment, index::VarIndex};

/// Exchanges the starting chains of two distinct routes, up to and
/// including exchanging the whole routes. Route heads and ends stay put.
pub struct Cross {
    path: PathState,
}

impl Cross {
    /// Creates the operator; the cursors roam routes independently.
    pub fn new(next_vars: Vec<VarIndex>, path_vars: Option<Vec<VarIndex>>) -> Self {
        Self {
            path: PathState::new(next_vars, path_vars, 2, vec![false, false]),
        }
    }
}

impl LocalSearchOperator for Cross {
    fn name(&self) -> &str {
        "Cross"
    }

    fn start(&mut self, assignment: &Assignment) {
        self.path.start(assignment);
    }

    fn make_next_neighbor(&mut self, delta: &mut Assignment, deltadelta: &mut Assignment) -> bool {
        self.path.next_neighbor(delta, deltadelta, false, |p| {
            let node0 = p.base_node(0);
            let start0 = p.start_node(0);
            let node1 = p.base_node(1);
            let start1 = p.start_node(1);
            if start1 == start0 {
                return false;
            }
            if !p.is_path_end(node0) && !p.is_path_end(node1) {
                p.move_chain(start0, node0, start1) && p.move_chain(node0, node1, start0)
            } else if !p.is_path_end(node0) {
                p.move_chain(start0, node0, start1)
            } else if !p.is_path_end(node1) {
                p.move_chain(start1, node1, start0)
            } else {
                false
            }
        })
    }
}
