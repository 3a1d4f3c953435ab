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

//! Node exchange.

use crate::{operator::LocalSearchOperator, path::PathState};
use kedge_model::{assignment::Assignment, index::VarIndex};

/// Exchanges the positions of two nodes: the successors of the two
/// cursors swap places.
pub struct Exchange {
    path: PathState,
}

impl Exchange {
    /// Creates the operator; the cursors roam routes independently.
    pub fn new(next_vars: Vec<VarIndex>, path_vars: Option<Vec<VarIndex>>) -> Self {
        Self {
            path: PathState::new(next_vars, path_vars, 2, vec![false, false]),
        }
    }
}

impl LocalSearchOperator for Exchange {
    fn name(&self) -> &str {
        "Exchange"
    }

    fn start(&mut self, assignment: &Assignment) {
        self.path.start(assignment);
    }

    fn make_next_neighbor(&mut self, delta: &mut Assignment, deltadelta: &mut Assignment) -> bool {
        self.path.next_neighbor(delta, deltadelta, false, |p| {
            let prev_node0 = p.base_node(0);
            if p.is_path_end(prev_node0) {
                return false;
            }
            let node0 = p.next(prev_node0);
            let prev_node1 = p.base_node(1);
            if p.is_path_end(prev_node1) {
                return false;
            }
            let node1 = p.next(prev_node1);
            if node0 == prev_node1 {
                p.move_chain(prev_node1, node1, prev_node0)
            } else if node1 == prev_node0 {
                p.move_chain(prev_node0, node0, prev_node1)
            } else {
                p.move_chain(prev_node0, node0, prev_node1)
                    && p.move_chain(node0, p.next(node0), prev_node0)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::testing::{
        assert_route_closure, collect_next_vectors, next_assignment, next_vars, walk,
    };

    #[test]
    fn test_exchange_swaps_nodes_on_a_route() {
        // Route 0→1→2→3→4(end): node orders containing adjacent and
        // non-adjacent swaps, all route-closed.
        let reference = [1usize, 2, 3, 4];
        let mut op = Exchange::new(next_vars(4), None);
        op.start(&next_assignment(&reference));

        let candidates = collect_next_vectors(&mut op, &reference, 64);
        assert!(!candidates.is_empty());
        let orders: Vec<Vec<usize>> = candidates.iter().map(|c| walk(c, 0)).collect();
        for candidate in &candidates {
            assert_route_closure(candidate);
        }
        // Swapping the successors of cursors 0 and 1 yields 0,2,1,3 and
        // 0,3,2,1 and 0,1,3,2 among the enumerated orders.
        assert!(orders.contains(&vec![0, 2, 1, 3]));
        assert!(orders.contains(&vec![0, 3, 2, 1]));
        assert!(orders.contains(&vec![0, 1, 3, 2]));
    }

    #[test]
    fn test_exchange_across_routes() {
        // Routes 0→1→4(end) and 2→3→4(end): swapping nodes 1 and 3 gives
        // 0→3 and 2→1.
        let reference = [1usize, 4, 3, 4];
        let mut op = Exchange::new(next_vars(4), None);
        op.start(&next_assignment(&reference));

        let candidates = collect_next_vectors(&mut op, &reference, 64);
        for candidate in &candidates {
            assert_route_closure(candidate);
        }
        assert!(
            candidates
                .iter()
                .any(|c| walk(c, 0) == vec![0, 3] && walk(c, 2) == vec![2, 1])
        );
    }
}
