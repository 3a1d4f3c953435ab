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

//! Path-based large neighborhood search.

use crate::{operator::LocalSearchOperator, path::PathState};
use kedge_model::{assignment::Assignment, index::VarIndex};

/// Frees `number_of_chunks` chains of `chunk_size` arcs each, one chain
/// per cursor. With `unactive_fragments` set, all currently inactive nodes
/// are freed as well, keeping them candidates for re-insertion.
pub struct PathLns {
    path: PathState,
    number_of_chunks: usize,
    chunk_size: usize,
    unactive_fragments: bool,
}

impl PathLns {
    /// Creates the operator.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    pub fn new(
        next_vars: Vec<VarIndex>,
        path_vars: Option<Vec<VarIndex>>,
        number_of_chunks: usize,
        chunk_size: usize,
        unactive_fragments: bool,
    ) -> Self {
        assert!(
            chunk_size > 0,
            "called `PathLns::new` with a zero chunk size"
        );
        Self {
            path: PathState::new(
                next_vars,
                path_vars,
                number_of_chunks,
                vec![false; number_of_chunks],
            ),
            number_of_chunks,
            chunk_size,
            unactive_fragments,
        }
    }

    fn deactivate_chain(path: &mut PathState, node: usize, chunk_size: usize) {
        let mut current = node;
        for _ in 0..chunk_size {
            if path.is_path_end(current) {
                break;
            }
            path.deactivate_node(current);
            current = path.next(current);
        }
    }

    fn deactivate_unactives(path: &mut PathState) {
        for i in 0..path.number_of_nexts() {
            if path.is_inactive(i) {
                path.deactivate_node(i);
            }
        }
    }
}

impl LocalSearchOperator for PathLns {
    fn name(&self) -> &str {
        "PathLns"
    }

    fn start(&mut self, assignment: &Assignment) {
        self.path.start(assignment);
    }

    fn make_next_neighbor(&mut self, delta: &mut Assignment, deltadelta: &mut Assignment) -> bool {
        let number_of_chunks = self.number_of_chunks;
        let chunk_size = self.chunk_size;
        let unactive_fragments = self.unactive_fragments;
        self.path.next_neighbor(delta, deltadelta, false, |p| {
            for i in 0..number_of_chunks {
                let node = p.base_node(i);
                Self::deactivate_chain(p, node, chunk_size);
            }
            if unactive_fragments {
                Self::deactivate_unactives(p);
            }
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::testing::{next_assignment, next_vars};

    fn next_fragment(op: &mut dyn LocalSearchOperator) -> Option<Vec<usize>> {
        let mut delta = Assignment::new();
        let mut deltadelta = Assignment::new();
        if !op.make_next_neighbor(&mut delta, &mut deltadelta) {
            return None;
        }
        let mut fragment: Vec<usize> = delta
            .int_container()
            .iter()
            .map(|e| e.var().get())
            .collect();
        fragment.sort_unstable();
        assert!(delta.int_container().iter().all(|e| !e.activated()));
        Some(fragment)
    }

    #[test]
    fn test_path_lns_frees_sliding_chains() {
        // Route 0→1→2→3→(4): one chunk of two arcs per candidate.
        let reference = [1usize, 2, 3, 4];
        let mut op = PathLns::new(next_vars(4), None, 1, 2, false);
        op.start(&next_assignment(&reference));
        assert_eq!(next_fragment(&mut op), Some(vec![0, 1]));
        assert_eq!(next_fragment(&mut op), Some(vec![1, 2]));
        assert_eq!(next_fragment(&mut op), Some(vec![2, 3]));
        assert_eq!(next_fragment(&mut op), Some(vec![3]));
        assert_eq!(next_fragment(&mut op), None);
    }

    #[test]
    fn test_path_lns_two_chunks_cover_cursor_pairs() {
        let reference = [1usize, 2, 3, 4];
        let mut op = PathLns::new(next_vars(4), None, 2, 1, false);
        op.start(&next_assignment(&reference));
        // First candidate: both cursors at the route head collapse onto
        // the same node.
        assert_eq!(next_fragment(&mut op), Some(vec![0]));
        // The rightmost cursor advances next.
        assert_eq!(next_fragment(&mut op), Some(vec![0, 1]));
    }

    #[test]
    fn test_unactive_fragments_free_inactive_nodes_too() {
        // Route 0→1→(3), node 2 inactive.
        let reference = [1usize, 3, 2];
        let mut op = PathLns::new(next_vars(3), None, 1, 1, true);
        op.start(&next_assignment(&reference));
        let fragment = next_fragment(&mut op).unwrap();
        assert!(fragment.contains(&2), "inactive node must stay freed");
    }

    #[test]
    #[should_panic(expected = "zero chunk size")]
    fn test_zero_chunk_size_panics() {
        let _ = PathLns::new(next_vars(2), None, 1, 0, false);
    }
}
