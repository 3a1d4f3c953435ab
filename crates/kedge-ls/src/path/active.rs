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

//! Activation moves: inserting inactive nodes, detaching active ones, and
//! swapping between the two sets.

use crate::{operator::LocalSearchOperator, path::PathState};
use kedge_model::{assignment::Assignment, index::VarIndex};

/// Iterates the inactive nodes of the reference; for each one, the path
/// cursors sweep their full range before the next inactive node is tried.
struct InactiveNodeCursor {
    node: usize,
}

impl InactiveNodeCursor {
    fn new() -> Self {
        Self { node: 0 }
    }

    fn initialize(&mut self, path: &PathState) {
        self.node = (0..path.number_of_nexts())
            .find(|&i| path.is_inactive(i))
            .unwrap_or(path.number_of_nexts());
    }

    fn make_one_neighbor<F>(&mut self, path: &mut PathState, mut make: F) -> bool
    where
        F: FnMut(&mut PathState, usize) -> bool,
    {
        while self.node < path.number_of_nexts() {
            let node = self.node;
            if !path.is_inactive(node)
                || !path.make_one_neighbor(false, |p| make(p, node))
            {
                path.reset_position();
                self.node += 1;
            } else {
                return true;
            }
        }
        false
    }
}

/// Inserts an inactive node into a route, trying every position.
///
/// Neighbors for the route `0 → 1 → 2` with node `3` inactive visit the
/// nodes in the orders `0,3,1,2`, `0,1,3,2` and `0,1,2,3`.
pub struct MakeActiveOperator {
    path: PathState,
    cursor: InactiveNodeCursor,
}

impl MakeActiveOperator {
    /// Creates the operator.
    pub fn new(next_vars: Vec<VarIndex>, path_vars: Option<Vec<VarIndex>>) -> Self {
        Self {
            path: PathState::new(next_vars, path_vars, 1, vec![false]),
            cursor: InactiveNodeCursor::new(),
        }
    }
}

impl LocalSearchOperator for MakeActiveOperator {
    fn name(&self) -> &str {
        "MakeActiveOperator"
    }

    fn start(&mut self, assignment: &Assignment) {
        self.path.start(assignment);
        self.cursor.initialize(&self.path);
    }

    fn make_next_neighbor(&mut self, delta: &mut Assignment, deltadelta: &mut Assignment) -> bool {
        let Self { path, cursor } = self;
        path.next_neighbor_with(delta, deltadelta, false, |p| {
            cursor.make_one_neighbor(p, |p, inactive| p.make_active(inactive, p.base_node(0)))
        })
    }
}

/// Detaches one route node into a self-loop per candidate.
///
/// Neighbors for the route `0 → 1 → 2` drop node `1` (order `0,2`) or
/// node `2` (order `0,1`).
pub struct MakeInactiveOperator {
    path: PathState,
}

impl MakeInactiveOperator {
    /// Creates the operator.
    pub fn new(next_vars: Vec<VarIndex>, path_vars: Option<Vec<VarIndex>>) -> Self {
        Self {
            path: PathState::new(next_vars, path_vars, 1, vec![false]),
        }
    }
}

impl LocalSearchOperator for MakeInactiveOperator {
    fn name(&self) -> &str {
        "MakeInactiveOperator"
    }

    fn start(&mut self, assignment: &Assignment) {
        self.path.start(assignment);
    }

    fn make_next_neighbor(&mut self, delta: &mut Assignment, deltadelta: &mut Assignment) -> bool {
        self.path.next_neighbor(delta, deltadelta, false, |p| {
            let base = p.base_node(0);
            if p.is_path_end(base) {
                return false;
            }
            p.make_chain_inactive(base, p.next(base))
        })
    }
}

/// Replaces an active node by an inactive one at the same position.
pub struct SwapActiveOperator {
    path: PathState,
    cursor: InactiveNodeCursor,
}

impl SwapActiveOperator {
    /// Creates the operator.
    pub fn new(next_vars: Vec<VarIndex>, path_vars: Option<Vec<VarIndex>>) -> Self {
        Self {
            path: PathState::new(next_vars, path_vars, 1, vec![false]),
            cursor: InactiveNodeCursor::new(),
        }
    }
}

impl LocalSearchOperator for SwapActiveOperator {
    fn name(&self) -> &str {
        "SwapActiveOperator"
    }

    fn start(&mut self, assignment: &Assignment) {
        self.path.start(assignment);
        self.cursor.initialize(&self.path);
    }

    fn make_next_neighbor(&mut self, delta: &mut Assignment, deltadelta: &mut Assignment) -> bool {
        let Self { path, cursor } = self;
        path.next_neighbor_with(delta, deltadelta, false, |p| {
            cursor.make_one_neighbor(p, |p, inactive| {
                let base = p.base_node(0);
                if p.is_path_end(base) {
                    return false;
                }
                p.make_chain_inactive(base, p.next(base)) && p.make_active(inactive, base)
            })
        })
    }
}

/// Makes an inactive node active and an active one inactive, trying every
/// insertion position instead of just the vacated one.
pub struct ExtendedSwapActiveOperator {
    path: PathState,
    cursor: InactiveNodeCursor,
}

impl ExtendedSwapActiveOperator {
    /// Creates the operator.
    pub fn new(next_vars: Vec<VarIndex>, path_vars: Option<Vec<VarIndex>>) -> Self {
        Self {
            path: PathState::new(next_vars, path_vars, 2, vec![false, false]),
            cursor: InactiveNodeCursor::new(),
        }
    }
}

impl LocalSearchOperator for ExtendedSwapActiveOperator {
    fn name(&self) -> &str {
        "ExtendedSwapActiveOperator"
    }

    fn start(&mut self, assignment: &Assignment) {
        self.path.start(assignment);
        self.cursor.initialize(&self.path);
    }

    fn make_next_neighbor(&mut self, delta: &mut Assignment, deltadelta: &mut Assignment) -> bool {
        let Self { path, cursor } = self;
        path.next_neighbor_with(delta, deltadelta, false, |p| {
            cursor.make_one_neighbor(p, |p, inactive| {
                let base0 = p.base_node(0);
                if p.is_path_end(base0) {
                    return false;
                }
                let base1 = p.base_node(1);
                if p.is_path_end(base1) {
                    return false;
                }
                if p.next(base0) == base1 {
                    return false;
                }
                p.make_chain_inactive(base0, p.next(base0)) && p.make_active(inactive, base1)
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::testing::{
        assert_route_closure, collect_next_vectors, next_assignment, next_vars, walk,
    };

    // Route 0→1→2→(4 end), node 3 inactive.
    const REFERENCE: [usize; 4] = [1, 2, 4, 3];

    #[test]
    fn test_make_active_tries_every_insertion_position() {
        let mut op = MakeActiveOperator::new(next_vars(4), None);
        op.start(&next_assignment(&REFERENCE));
        let candidates = collect_next_vectors(&mut op, &REFERENCE, 32);
        let orders: Vec<Vec<usize>> = candidates.iter().map(|c| walk(c, 0)).collect();
        assert_eq!(
            orders,
            vec![vec![0, 3, 1, 2], vec![0, 1, 3, 2], vec![0, 1, 2, 3]]
        );
        for candidate in &candidates {
            assert_route_closure(candidate);
        }
    }

    #[test]
    fn test_make_active_without_inactive_nodes_is_empty() {
        let reference = [1usize, 2, 3];
        let mut op = MakeActiveOperator::new(next_vars(3), None);
        op.start(&next_assignment(&reference));
        assert!(collect_next_vectors(&mut op, &reference, 8).is_empty());
    }

    #[test]
    fn test_make_inactive_detaches_each_inner_node() {
        let reference = [1usize, 2, 3];
        let mut op = MakeInactiveOperator::new(next_vars(3), None);
        op.start(&next_assignment(&reference));
        let candidates = collect_next_vectors(&mut op, &reference, 16);
        let orders: Vec<Vec<usize>> = candidates.iter().map(|c| walk(c, 0)).collect();
        assert_eq!(orders, vec![vec![0, 2], vec![0, 1]]);
        // The detached node is a self-loop.
        assert_eq!(candidates[0][1], 1);
        assert_eq!(candidates[1][2], 2);
        for candidate in &candidates {
            assert_route_closure(candidate);
        }
    }

    #[test]
    fn test_swap_active_replaces_at_same_position() {
        let mut op = SwapActiveOperator::new(next_vars(4), None);
        op.start(&next_assignment(&REFERENCE));
        let candidates = collect_next_vectors(&mut op, &REFERENCE, 16);
        let orders: Vec<Vec<usize>> = candidates.iter().map(|c| walk(c, 0)).collect();
        assert_eq!(orders, vec![vec![0, 3, 2], vec![0, 1, 3]]);
        for candidate in &candidates {
            assert_route_closure(candidate);
        }
    }

    #[test]
    fn test_extended_swap_active_tries_all_positions() {
        let mut op = ExtendedSwapActiveOperator::new(next_vars(4), None);
        op.start(&next_assignment(&REFERENCE));
        let candidates = collect_next_vectors(&mut op, &REFERENCE, 64);
        let orders: Vec<Vec<usize>> = candidates.iter().map(|c| walk(c, 0)).collect();
        // Swapping node 1 out: 3 inserted after 0 or after 2; swapping
        // node 2 out: 3 inserted after 0 or after 1.
        assert!(orders.contains(&vec![0, 3, 2]));
        assert!(orders.contains(&vec![0, 2, 3]));
        assert!(orders.contains(&vec![0, 3, 1]));
        assert!(orders.contains(&vec![0, 1, 3]));
        for candidate in &candidates {
            assert_route_closure(candidate);
        }
    }
}
