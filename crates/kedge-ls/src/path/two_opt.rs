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

//! 2-opt.

use crate::{
    operator::LocalSearchOperator,
    path::PathState,
};
use kedge_model::{assignment::Assignment, index::VarIndex};

/// Reverses a sub-chain of a route. Called 2-opt because it breaks two
/// arcs; the resulting routes are 2-optimal.
///
/// Neighbors for the route `0 → 1 → 2 → 3 → 4` (route ends cannot move)
/// visit the nodes in the orders `0,2,1,3,4`, then `0,3,2,1,4`, then
/// `0,1,3,2,4`.
///
/// The operator is incremental: once a reversal has been staged for a base
/// node, each following candidate extends it by relocating one more node
/// instead of rebuilding the reversal from scratch.
pub struct TwoOpt {
    path: PathState,
    last_base: Option<usize>,
    last: Option<usize>,
}

impl TwoOpt {
    /// Creates the operator; both cursors stay on one route.
    pub fn new(next_vars: Vec<VarIndex>, path_vars: Option<Vec<VarIndex>>) -> Self {
        Self {
            path: PathState::new(next_vars, path_vars, 2, vec![false, true]),
            last_base: None,
            last: None,
        }
    }
}

impl LocalSearchOperator for TwoOpt {
    fn name(&self) -> &str {
        "TwoOpt"
    }

    fn start(&mut self, assignment: &Assignment) {
        self.path.start(assignment);
        self.last = None;
    }

    fn make_next_neighbor(&mut self, delta: &mut Assignment, deltadelta: &mut Assignment) -> bool {
        let Self {
            path,
            last_base,
            last,
        } = self;
        path.next_neighbor(delta, deltadelta, true, |p| {
            debug_assert_eq!(p.start_node(0), p.start_node(1));
            if *last_base != Some(p.base_node(0)) || last.is_none() {
                p.revert_changes(false, true);
                if p.is_path_end(p.base_node(0)) {
                    *last = None;
                    return false;
                }
                *last_base = Some(p.base_node(0));
                *last = Some(p.next(p.base_node(0)));
                match p.reverse_chain(p.base_node(0), p.base_node(1)) {
                    Some(_) => true,
                    None => {
                        *last = None;
                        false
                    }
                }
            } else {
                let anchor = last.unwrap();
                let to_move = p.next(anchor);
                debug_assert_eq!(p.next(to_move), p.base_node(1));
                p.move_chain(anchor, to_move, p.base_node(0))
            }
        })
    }

    fn is_incremental(&self) -> bool {
        true
    }
}
