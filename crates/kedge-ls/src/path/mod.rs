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

//! Path operators and their shared machinery.
//!
//! Path operators interpret the first `n` tracked variables as a
//! next-vector: `next[i] = j` makes node `j` the successor of node `i`.
//! A value of at least `n` is a *path end* sentinel, a node with
//! `next[i] = i` is *inactive*, and the optional second block of `n`
//! variables assigns each node a route identifier. The next-vector always
//! describes a disjoint union of simple paths plus self-loops.
//!
//! [`PathState`] bundles the delta-emission state with the lexicographic
//! cursor iteration and the chain-edit primitives every operator in this
//! module is built from.

pub mod active;
pub mod cross;
pub mod exchange;
pub mod lin_kernighan;
pub mod path_lns;
pub mod relocate;
pub mod tsp;
pub mod two_opt;

use crate::operator::{OperatorVars, SkipPolicy};
use kedge_model::{assignment::Assignment, index::VarIndex};

use fixedbitset::FixedBitSet;

/// Cost callback of the evaluator-based path operators:
/// `evaluator(from, to, route)` returns the cost of the arc `from → to`
/// on the given route. Evaluators must be repeatable: deterministic and
/// free of side effects.
pub type PathEvaluator = std::rc::Rc<dyn Fn(usize, usize, i64) -> i64>;

/// Route identifier of nodes detached into self-loops.
const NO_PATH: i64 = -1;

/// Shared state of all path operators: the delta-emission mixin, the
/// base-node cursors and the chain-edit primitives.
///
/// # Invariants
///
/// * `base_nodes`, `end_nodes` and `base_paths` all have
///   `number_of_base_nodes` entries.
/// * Between candidates the staged next-vector describes simple paths and
///   self-loops; a primitive that would break this returns `false` and
///   leaves partial changes for the caller to revert.
pub struct PathState {
    vars: OperatorVars,
    number_of_nexts: usize,
    ignore_path_vars: bool,
    base_nodes: Vec<usize>,
    end_nodes: Vec<usize>,
    base_paths: Vec<usize>,
    path_starts: Vec<usize>,
    inactives: FixedBitSet,
    same_path_as_previous: Vec<bool>,
    just_started: bool,
    first_start: bool,
}

impl PathState {
    /// Creates path state over a next-vector and optional route variables.
    ///
    /// `same_path_as_previous[k]` constrains cursor `k` to the route of
    /// cursor `k - 1`; entry zero is ignored.
    ///
    /// # Panics
    ///
    /// Panics if no cursor is requested, the constraint vector has the
    /// wrong length, or the route block differs in size from the
    /// next-vector.
    pub fn new(
        next_vars: Vec<VarIndex>,
        path_vars: Option<Vec<VarIndex>>,
        number_of_base_nodes: usize,
        same_path_as_previous: Vec<bool>,
    ) -> Self {
        assert!(
            number_of_base_nodes > 0,
            "called `PathState::new` with no base nodes"
        );
        assert_eq!(
            same_path_as_previous.len(),
            number_of_base_nodes,
            "called `PathState::new` with a same-path constraint vector of the wrong length: {} != {}",
            same_path_as_previous.len(),
            number_of_base_nodes
        );
        let number_of_nexts = next_vars.len();
        let mut vars = OperatorVars::new(next_vars);
        let ignore_path_vars = path_vars.is_none();
        if let Some(path_vars) = path_vars {
            assert_eq!(
                path_vars.len(),
                number_of_nexts,
                "called `PathState::new` with a route block of the wrong size: {} != {}",
                path_vars.len(),
                number_of_nexts
            );
            vars.add_vars(&path_vars);
        }
        Self {
            vars,
            number_of_nexts,
            ignore_path_vars,
            base_nodes: vec![0; number_of_base_nodes],
            end_nodes: vec![0; number_of_base_nodes],
            base_paths: vec![0; number_of_base_nodes],
            path_starts: Vec::new(),
            inactives: FixedBitSet::with_capacity(number_of_nexts),
            same_path_as_previous,
            just_started: false,
            first_start: true,
        }
    }

    /// Returns the number of next variables (nodes).
    #[inline]
    pub fn number_of_nexts(&self) -> usize {
        self.number_of_nexts
    }

    /// Returns `true` if the operator tracks no route variables.
    #[inline]
    pub fn ignores_path_vars(&self) -> bool {
        self.ignore_path_vars
    }

    /// Returns the delta-emission state.
    #[inline]
    pub fn vars(&self) -> &OperatorVars {
        &self.vars
    }

    /// Returns the delta-emission state mutably.
    #[inline]
    pub fn vars_mut(&mut self) -> &mut OperatorVars {
        &mut self.vars
    }

    /// Returns `true` if `node` is a path-end sentinel.
    #[inline]
    pub fn is_path_end(&self, node: usize) -> bool {
        node >= self.number_of_nexts
    }

    /// Returns the staged successor of `node`.
    #[inline]
    pub fn next(&self, node: usize) -> usize {
        debug_assert!(
            node < self.number_of_nexts,
            "called `PathState::next` on a path end: the len is {} but the node is {}",
            self.number_of_nexts,
            node
        );
        self.vars.value(node) as usize
    }

    /// Returns the reference successor of `node`.
    #[inline]
    pub fn old_next(&self, node: usize) -> usize {
        debug_assert!(
            node < self.number_of_nexts,
            "called `PathState::old_next` on a path end: the len is {} but the node is {}",
            self.number_of_nexts,
            node
        );
        self.vars.old_value(node) as usize
    }

    /// Returns the staged route of `node`, or zero when routes are not
    /// tracked.
    #[inline]
    pub fn path(&self, node: usize) -> i64 {
        if self.ignore_path_vars {
            0
        } else {
            self.vars.value(node + self.number_of_nexts)
        }
    }

    /// Returns `true` if `node` was a self-loop in the reference.
    #[inline]
    pub fn is_inactive(&self, node: usize) -> bool {
        node < self.number_of_nexts && self.inactives.contains(node)
    }

    /// Returns the current position of cursor `i`.
    #[inline]
    pub fn base_node(&self, i: usize) -> usize {
        self.base_nodes[i]
    }

    /// Returns the start of the route cursor `i` is on.
    #[inline]
    pub fn start_node(&self, i: usize) -> usize {
        self.path_starts[self.base_paths[i]]
    }

    /// Returns the route heads of the reference.
    #[inline]
    pub fn path_starts(&self) -> &[usize] {
        &self.path_starts
    }

    /// Stages `next[from] = to` on route `path`.
    #[inline]
    pub fn set_next(&mut self, from: usize, to: usize, path: i64) {
        debug_assert!(
            from < self.number_of_nexts,
            "called `PathState::set_next` on a path end: the len is {} but the node is {}",
            self.number_of_nexts,
            from
        );
        self.vars.set_value(from, to as i64);
        if !self.ignore_path_vars {
            self.vars.set_value(from + self.number_of_nexts, path);
        }
    }

    /// Stages deactivation of `node` and of its route variable.
    pub fn deactivate_node(&mut self, node: usize) {
        self.vars.deactivate(node);
        if !self.ignore_path_vars {
            self.vars.deactivate(node + self.number_of_nexts);
        }
    }

    /// Synchronises against a new reference and repositions the cursors.
    pub fn start(&mut self, assignment: &Assignment) {
        self.vars.start_from(assignment);
        self.initialize_base_nodes();
    }

    /// Rewinds the cursor iteration to the current cursor positions.
    #[inline]
    pub fn reset_position(&mut self) {
        self.just_started = true;
    }

    /// The skip rule of path operators: without route variables, unchanged
    /// values are always skipped; with them, a slot is skipped only when
    /// its paired slot is unchanged too.
    #[inline]
    fn skip_policy(&self) -> SkipPolicy {
        if self.ignore_path_vars {
            SkipPolicy::Unchanged
        } else {
            SkipPolicy::PairedUnchanged {
                offset: self.number_of_nexts,
            }
        }
    }

    /// Emits the staged candidate; see `OperatorVars::apply_changes`.
    #[inline]
    pub fn apply_changes(
        &self,
        delta: &mut Assignment,
        deltadelta: &mut Assignment,
        is_incremental: bool,
    ) {
        self.vars
            .apply_changes(delta, deltadelta, is_incremental, self.skip_policy());
    }

    /// Reverts the staged candidate; see `OperatorVars::revert_changes`.
    #[inline]
    pub fn revert_changes(&mut self, incremental: bool, is_incremental: bool) {
        self.vars.revert_changes(incremental, is_incremental);
    }

    /// The shared candidate loop: advances the cursors and calls `make`
    /// until it stages a candidate or the iteration exhausts.
    pub fn make_one_neighbor<F>(&mut self, is_incremental: bool, mut make: F) -> bool
    where
        F: FnMut(&mut PathState) -> bool,
    {
        while self.increment_position() {
            // The previous `make` may have staged changes before failing.
            self.vars.revert_changes(true, is_incremental);
            if make(self) {
                return true;
            }
        }
        false
    }

    /// The shared `make_next_neighbor` flow of path operators: revert the
    /// previous candidate, stage the next one through `make`, emit it.
    /// Candidates whose delta turns out empty (staged values all equal to
    /// the reference) are skipped instead of surfaced.
    pub fn next_neighbor<F>(
        &mut self,
        delta: &mut Assignment,
        deltadelta: &mut Assignment,
        is_incremental: bool,
        mut make: F,
    ) -> bool
    where
        F: FnMut(&mut PathState) -> bool,
    {
        self.next_neighbor_with(delta, deltadelta, is_incremental, |p| {
            p.make_one_neighbor(is_incremental, &mut make)
        })
    }

    /// Like [`next_neighbor`], but `one` replaces the whole staging step,
    /// for operators that drive the cursors themselves.
    ///
    /// [`next_neighbor`]: PathState::next_neighbor
    pub fn next_neighbor_with<F>(
        &mut self,
        delta: &mut Assignment,
        deltadelta: &mut Assignment,
        is_incremental: bool,
        mut one: F,
    ) -> bool
    where
        F: FnMut(&mut PathState) -> bool,
    {
        self.revert_changes(true, is_incremental);
        loop {
            if !one(self) {
                return false;
            }
            self.apply_changes(delta, deltadelta, is_incremental);
            if !delta.is_empty() {
                return true;
            }
            delta.clear();
            deltadelta.clear();
            self.revert_changes(false, is_incremental);
        }
    }

    fn initialize_path_starts(&mut self) {
        self.path_starts.clear();
        let mut has_prevs = FixedBitSet::with_capacity(self.number_of_nexts);
        for i in 0..self.number_of_nexts {
            let next = self.old_next(i);
            if next < self.number_of_nexts {
                has_prevs.insert(next);
            }
        }
        for i in 0..self.number_of_nexts {
            if !has_prevs.contains(i) {
                self.path_starts.push(i);
            }
        }
    }

    fn initialize_inactives(&mut self) {
        self.inactives.clear();
        for i in 0..self.number_of_nexts {
            if self.old_next(i) == i {
                self.inactives.insert(i);
            }
        }
    }

    fn initialize_base_nodes(&mut self) {
        self.initialize_path_starts();
        self.initialize_inactives();
        assert!(
            !self.path_starts.is_empty(),
            "called `PathState::start` with a next-vector containing no route head"
        );
        if self.first_start {
            // Later starts continue from the preceding cursor positions.
            for i in 0..self.base_nodes.len() {
                self.base_paths[i] = 0;
                self.base_nodes[i] = self.path_starts[0];
            }
            self.first_start = false;
        }
        for i in 0..self.base_nodes.len() {
            // A cursor parked on a node another operator deactivated is
            // pulled back to the start of its route.
            let mut base_node = self.base_nodes[i];
            if self.base_paths[i] >= self.path_starts.len() {
                self.base_paths[i] = 0;
                base_node = self.path_starts[0];
                self.base_nodes[i] = base_node;
            } else if self.is_inactive(base_node) {
                base_node = self.path_starts[self.base_paths[i]];
                self.base_nodes[i] = base_node;
            }
            self.end_nodes[i] = base_node;
        }
        // Repair cursors that must share a route but no longer do, due to
        // other operators moving their nodes.
        for i in 1..self.base_nodes.len() {
            if self.same_path_as_previous[i]
                && !self.on_same_path(self.base_nodes[i - 1], self.base_nodes[i])
            {
                let base_node = self.base_nodes[i - 1];
                self.base_nodes[i] = base_node;
                self.end_nodes[i] = base_node;
            }
        }
        self.just_started = true;
    }

    fn check_ends(&self) -> bool {
        self.base_nodes != self.end_nodes
    }

    /// Advances the cursors to the next lexicographic position.
    ///
    /// Cursors advance rightmost-first along the reference next-vector; a
    /// cursor that falls off its route restarts at the route head and
    /// carries into its left neighbor. When every cursor restarted, the
    /// route assignment advances instead. Exhaustion is signalled by all
    /// cursors returning to the positions the episode started from.
    pub fn increment_position(&mut self) -> bool {
        if self.just_started {
            self.just_started = false;
            return true;
        }
        let base_node_size = self.base_nodes.len();
        let number_of_paths = self.path_starts.len();

        let mut last_restarted = base_node_size;
        for i in (0..base_node_size).rev() {
            if self.base_nodes[i] < self.number_of_nexts {
                self.base_nodes[i] = self.old_next(self.base_nodes[i]);
                break;
            }
            self.base_nodes[i] = self.start_node(i);
            last_restarted = i;
        }
        // Restarted cursors are repositioned in ascending order so every
        // cursor below the one being placed already has its final position.
        for i in last_restarted..base_node_size {
            self.base_nodes[i] = self.start_node(i);
        }
        if last_restarted > 0 {
            return self.check_ends();
        }
        // Every cursor restarted: move cursors to new routes.
        for i in (0..base_node_size).rev() {
            let next_path_index = self.base_paths[i] + 1;
            if next_path_index < number_of_paths {
                self.base_paths[i] = next_path_index;
                self.base_nodes[i] = self.path_starts[next_path_index];
                if i == 0 || !self.same_path_as_previous[i] {
                    return self.check_ends();
                }
            } else {
                self.base_paths[i] = 0;
                self.base_nodes[i] = self.path_starts[0];
            }
        }
        self.check_ends()
    }

    /// Returns `true` if both nodes lie on the same reference route.
    pub fn on_same_path(&self, node1: usize, node2: usize) -> bool {
        if self.is_inactive(node1) != self.is_inactive(node2) {
            return false;
        }
        let mut node = node1;
        while !self.is_path_end(node) {
            if node == node2 {
                return true;
            }
            node = self.old_next(node);
        }
        let mut node = node2;
        while !self.is_path_end(node) {
            if node == node1 {
                return true;
            }
            node = self.old_next(node);
        }
        false
    }

    /// Rejects empty chains, chains not ending behind `before_chain`,
    /// chains touching `exclude`, and cycles. Cycles are detected through
    /// a chain-length watchdog bounded by the node count.
    pub fn check_chain_validity(
        &self,
        before_chain: usize,
        chain_end: usize,
        exclude: Option<usize>,
    ) -> bool {
        if before_chain == chain_end || Some(before_chain) == exclude {
            return false;
        }
        let mut current = before_chain;
        let mut chain_size = 0usize;
        while current != chain_end {
            if chain_size > self.number_of_nexts {
                return false;
            }
            if self.is_path_end(current) {
                return false;
            }
            current = self.next(current);
            chain_size += 1;
            if Some(current) == exclude {
                return false;
            }
        }
        true
    }

    /// Splices the chain `(before_chain, chain_end]` after `destination`.
    pub fn move_chain(
        &mut self,
        before_chain: usize,
        chain_end: usize,
        destination: usize,
    ) -> bool {
        if self.check_chain_validity(before_chain, chain_end, Some(destination))
            && !self.is_path_end(chain_end)
            && !self.is_path_end(destination)
        {
            let destination_path = self.path(destination);
            let after_chain = self.next(chain_end);
            self.set_next(chain_end, self.next(destination), destination_path);
            if !self.ignore_path_vars {
                // Re-route every moved node onto the destination path.
                let mut current = destination;
                let mut next = self.next(before_chain);
                while current != chain_end {
                    self.set_next(current, next, destination_path);
                    current = next;
                    next = self.next(next);
                }
            } else {
                self.set_next(destination, self.next(before_chain), destination_path);
            }
            let before_path = self.path(before_chain);
            self.set_next(before_chain, after_chain, before_path);
            true
        } else {
            false
        }
    }

    /// Reverses the open segment `(before_chain, after_chain)`, returning
    /// the node now adjacent to `before_chain` (the former segment tail).
    pub fn reverse_chain(&mut self, before_chain: usize, after_chain: usize) -> Option<usize> {
        if !self.check_chain_validity(before_chain, after_chain, None) {
            return None;
        }
        let path = self.path(before_chain);
        let mut current = self.next(before_chain);
        if current == after_chain {
            return None;
        }
        let mut current_next = self.next(current);
        self.set_next(current, after_chain, path);
        while current_next != after_chain {
            let next = self.next(current_next);
            self.set_next(current_next, current, path);
            current = current_next;
            current_next = next;
        }
        self.set_next(before_chain, current, path);
        Some(current)
    }

    /// Inserts the isolated `node` right after `destination`.
    pub fn make_active(&mut self, node: usize, destination: usize) -> bool {
        if self.is_path_end(destination) {
            return false;
        }
        let destination_path = self.path(destination);
        self.set_next(node, self.next(destination), destination_path);
        self.set_next(destination, node, destination_path);
        true
    }

    /// Detaches the chain `(before_chain, chain_end]` into self-loops.
    pub fn make_chain_inactive(&mut self, before_chain: usize, chain_end: usize) -> bool {
        if self.check_chain_validity(before_chain, chain_end, None)
            && !self.is_path_end(chain_end)
        {
            let after_chain = self.next(chain_end);
            let mut current = self.next(before_chain);
            while current != after_chain {
                let next = self.next(current);
                self.set_next(current, current, NO_PATH);
                current = next;
            }
            let before_path = self.path(before_chain);
            self.set_next(before_chain, after_chain, before_path);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::operator::LocalSearchOperator;

    /// Builds a reference assignment for `next` values over dense variables.
    pub fn next_assignment(next: &[usize]) -> Assignment {
        let mut a = Assignment::new();
        for (i, &n) in next.iter().enumerate() {
            a.add(VarIndex::new(i)).set_value(n as i64);
        }
        a
    }

    /// Dense next-variable handles `0..n`.
    pub fn next_vars(n: usize) -> Vec<VarIndex> {
        (0..n).map(VarIndex::new).collect()
    }

    /// Runs an episode, returning each candidate as the full staged
    /// next-vector (reference overlaid with the delta).
    pub fn collect_next_vectors(
        op: &mut dyn LocalSearchOperator,
        reference: &[usize],
        max: usize,
    ) -> Vec<Vec<usize>> {
        let mut out = Vec::new();
        let mut delta = Assignment::new();
        let mut deltadelta = Assignment::new();
        for _ in 0..max {
            delta.clear();
            deltadelta.clear();
            if !op.make_next_neighbor(&mut delta, &mut deltadelta) {
                break;
            }
            let mut candidate = next_assignment(reference);
            candidate.apply(&delta);
            out.push(
                (0..reference.len())
                    .map(|i| candidate.value(VarIndex::new(i)).unwrap() as usize)
                    .collect(),
            );
        }
        out
    }

    /// Follows a next-vector from `start`, returning the visited nodes.
    pub fn walk(next: &[usize], start: usize) -> Vec<usize> {
        let mut out = vec![start];
        let mut node = start;
        while next[node] < next.len() {
            node = next[node];
            out.push(node);
            assert!(out.len() <= next.len() + 1, "walk found a cycle");
        }
        out
    }

    /// Asserts the next-vector is a disjoint union of simple paths and
    /// self-loops (the P4 route-closure property).
    pub fn assert_route_closure(next: &[usize]) {
        let n = next.len();
        let mut indegree = vec![0usize; n];
        for (i, &j) in next.iter().enumerate() {
            if j < n && j != i {
                indegree[j] += 1;
                assert!(indegree[j] <= 1, "node {} has two predecessors", j);
            }
        }
        // Every non-self-loop node must be reachable from a route head.
        let mut seen = vec![false; n];
        for i in 0..n {
            if indegree[i] == 0 && next[i] != i {
                let mut node = i;
                while node < n {
                    assert!(!seen[node], "node {} visited twice", node);
                    seen[node] = true;
                    node = next[node];
                }
            }
        }
        for i in 0..n {
            assert!(
                seen[i] || next[i] == i,
                "node {} is on a cycle detached from every route head",
                i
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    fn state(next: &[usize], base_nodes: usize, same_path: Vec<bool>) -> PathState {
        let mut s = PathState::new(next_vars(next.len()), None, base_nodes, same_path);
        s.start(&next_assignment(next));
        s
    }

    #[test]
    fn test_path_starts_and_inactives() {
        // Two routes 0→1→5(end) and 2→3→5(end), node 4 inactive.
        let s = state(&[1, 5, 3, 5, 4], 1, vec![false]);
        assert_eq!(s.path_starts(), &[0, 2]);
        assert!(s.is_inactive(4));
        assert!(!s.is_inactive(0));
        assert!(s.is_path_end(5));
    }

    #[test]
    #[should_panic(expected = "no route head")]
    fn test_cyclic_next_vector_panics_on_start() {
        let _ = state(&[1, 2, 0], 1, vec![false]);
    }

    #[test]
    fn test_single_cursor_enumerates_route_positions() {
        // Route 0→1→2→3(end).
        let mut s = state(&[1, 2, 3], 1, vec![false]);
        let mut positions = Vec::new();
        while s.increment_position() {
            positions.push(s.base_node(0));
        }
        assert_eq!(positions, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_two_same_path_cursors_iterate_lexicographically() {
        let mut s = state(&[1, 2, 3], 2, vec![false, true]);
        let mut positions = Vec::new();
        while s.increment_position() {
            positions.push((s.base_node(0), s.base_node(1)));
        }
        // Cursor 1 sweeps the route for each position of cursor 0.
        assert_eq!(positions[0], (0, 0));
        assert!(positions.contains(&(0, 3)));
        assert!(positions.contains(&(1, 2)));
        let last = *positions.last().unwrap();
        assert_eq!(last.0, 3);
    }

    #[test]
    fn test_move_chain_splices_after_destination() {
        // Route 0→1→2→3→4→5(end): move chain (0,2] after 3.
        let mut s = state(&[1, 2, 3, 4, 5], 1, vec![false]);
        assert!(s.move_chain(0, 2, 3));
        let staged: Vec<usize> = (0..5).map(|i| s.next(i)).collect();
        assert_eq!(walk(&staged, 0), vec![0, 3, 1, 2, 4, 5]);
        assert_route_closure(&staged);
    }

    #[test]
    fn test_move_chain_rejects_destination_inside_chain() {
        let mut s = state(&[1, 2, 3, 4, 5], 1, vec![false]);
        assert!(!s.move_chain(0, 3, 2));
        assert!(!s.move_chain(2, 2, 0));
    }

    #[test]
    fn test_reverse_chain_reverses_open_segment() {
        // Route 0→1→2→3→4→5(end): reverse (0, 4). The returned node is the
        // one now adjacent to `before_chain`.
        let mut s = state(&[1, 2, 3, 4, 5], 1, vec![false]);
        assert_eq!(s.reverse_chain(0, 4), Some(3));
        let staged: Vec<usize> = (0..5).map(|i| s.next(i)).collect();
        assert_eq!(walk(&staged, 0), vec![0, 3, 2, 1, 4, 5]);
        assert_route_closure(&staged);
    }

    #[test]
    fn test_reverse_chain_rejects_empty_segment() {
        let mut s = state(&[1, 2, 3], 1, vec![false]);
        assert_eq!(s.reverse_chain(0, 1), None);
    }

    #[test]
    fn test_make_active_inserts_self_loop_node() {
        // Route 0→1→3(end), node 2 inactive.
        let mut s = state(&[1, 3, 2], 1, vec![false]);
        assert!(s.make_active(2, 0));
        let staged: Vec<usize> = (0..3).map(|i| s.next(i)).collect();
        assert_eq!(walk(&staged, 0), vec![0, 2, 1, 3]);
        assert_route_closure(&staged);
    }

    #[test]
    fn test_make_chain_inactive_detaches_to_self_loops() {
        // Route 0→1→2→3→4(end): detach (0, 2].
        let mut s = state(&[1, 2, 3, 4], 1, vec![false]);
        assert!(s.make_chain_inactive(0, 2));
        let staged: Vec<usize> = (0..4).map(|i| s.next(i)).collect();
        assert_eq!(staged, vec![3, 1, 2, 4]);
        assert_route_closure(&staged);
    }

    #[test]
    fn test_check_chain_validity_watchdog_rejects_staged_cycles() {
        let mut s = state(&[1, 2, 3], 1, vec![false]);
        // Stage a cycle by hand: 0→1→0.
        s.set_next(1, 0, 0);
        assert!(!s.check_chain_validity(0, 2, None));
    }

    #[test]
    fn test_route_vars_follow_moved_chain() {
        // Routes 0→1→4(end) on route 0 and 2→3→4(end) on route 1, with
        // route variables in the second block.
        let next = [1usize, 4, 3, 4];
        let mut a = next_assignment(&next);
        for (i, &p) in [0i64, 0, 1, 1].iter().enumerate() {
            a.add(VarIndex::new(4 + i)).set_value(p);
        }
        let path_vars: Vec<VarIndex> = (4..8).map(VarIndex::new).collect();
        let mut s = PathState::new(next_vars(4), Some(path_vars), 1, vec![false]);
        s.start(&a);

        // Move node 1 behind node 3 (route 1).
        assert!(s.move_chain(0, 1, 3));
        assert_eq!(s.path(1), 1);
        let staged: Vec<usize> = (0..4).map(|i| s.next(i)).collect();
        assert_eq!(walk(&staged, 2), vec![2, 3, 1, 4]);
    }

    #[test]
    fn test_cursor_pulled_back_when_parked_on_inactive_node() {
        let mut s = state(&[1, 2, 3], 1, vec![false]);
        // Walk the cursor to node 1, then restart against a reference where
        // node 1 went inactive.
        assert!(s.increment_position());
        assert!(s.increment_position());
        assert_eq!(s.base_node(0), 1);
        s.start(&next_assignment(&[2, 1, 3]));
        assert_eq!(s.base_node(0), 0);
    }
}
