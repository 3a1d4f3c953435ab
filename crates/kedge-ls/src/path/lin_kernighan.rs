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

//! Lin–Kernighan.
//!
//! While the accumulated local gain stays positive, performs a 2-opt or a
//! 3-opt move followed by a chain of 2-opts, and commits a neighbor once
//! the global gain turns positive; otherwise it backtracks and gives up
//! on the current base. Each step picks its "out" node among the nearest
//! destinations of the current "in" endpoint, precomputed per node by a
//! partial quickselect over the variable domain.

use crate::{
    operator::LocalSearchOperator,
    path::{PathEvaluator, PathState},
};
use kedge_model::{assignment::Assignment, index::VarIndex, store::VariableStore};
use std::collections::HashSet;

/// Candidate destinations considered per endpoint.
pub const LIN_KERNIGHAN_NEIGHBORS: usize = 5 + 1;

/// Per-node nearest-destination lists.
///
/// For every next variable, stores the `size` cheapest destinations in its
/// domain according to the evaluator, sorted ascending by node. The lists
/// are built once on the first start and never refreshed: a node changing
/// routes afterwards keeps its original lists. The approximation is
/// deliberate; rebuilding per start would dominate the search on large
/// domains.
pub struct NearestNeighbors {
    neighbors: Vec<Vec<usize>>,
    size: usize,
    initialized: bool,
}

impl NearestNeighbors {
    /// Creates an empty cache keeping `size` destinations per node.
    pub fn new(size: usize) -> Self {
        Self {
            neighbors: Vec::new(),
            size,
            initialized: false,
        }
    }

    /// Returns `true` once the lists have been built.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Builds the lists on first call; later calls are no-ops.
    pub fn initialize(
        &mut self,
        path: &PathState,
        evaluator: &PathEvaluator,
        domains: &[(i64, i64)],
    ) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        self.neighbors.clear();
        for row in 0..path.number_of_nexts() {
            self.compute_nearest(row, path, evaluator, domains[row]);
        }
    }

    /// Returns the destination list of `index`.
    #[inline]
    pub fn neighbors(&self, index: usize) -> &[usize] {
        &self.neighbors[index]
    }

    fn compute_nearest(
        &mut self,
        row: usize,
        path: &PathState,
        evaluator: &PathEvaluator,
        (var_min, var_max): (i64, i64),
    ) {
        let route = path.path(row);
        let var_size = (var_max - var_min + 1) as usize;
        let mut destinations: Vec<usize> = (0..var_size)
            .map(|i| (i as i64 + var_min) as usize)
            .collect();
        let mut costs: Vec<i64> = destinations
            .iter()
            .map(|&to| evaluator(row, to, route))
            .collect();

        if var_size > self.size {
            // Partial quickselect: only the cheapest `size` entries end up
            // in the prefix, in expected linear time.
            let mut start = 0;
            let mut end = var_size;
            let mut wanted = self.size;
            while wanted > 0 {
                let mut index = start + (end - start) / 2;
                Self::pivot(start, end, &mut destinations, &mut costs, &mut index);
                let in_prefix = index - start;
                if in_prefix >= wanted {
                    end = index;
                } else {
                    wanted -= in_prefix + 1;
                    start = index + 1;
                }
            }
        }

        let mut kept: Vec<usize> = destinations[..self.size.min(var_size)].to_vec();
        kept.sort_unstable();
        self.neighbors.push(kept);
    }

    fn pivot(
        start: usize,
        end: usize,
        destinations: &mut [usize],
        costs: &mut [i64],
        index: &mut usize,
    ) {
        Self::swap(start, *index, destinations, costs);
        let mut j = start;
        for i in start + 1..end {
            if costs[i] < costs[j] {
                Self::swap(j, i, destinations, costs);
                j += 1;
                Self::swap(i, j, destinations, costs);
            }
        }
        *index = j;
    }

    fn swap(i: usize, j: usize, destinations: &mut [usize], costs: &mut [i64]) {
        destinations.swap(i, j);
        costs.swap(i, j);
    }
}

/// The Lin–Kernighan operator.
pub struct LinKernighan {
    path: PathState,
    evaluator: PathEvaluator,
    neighbors: NearestNeighbors,
    domains: Vec<(i64, i64)>,
    marked: HashSet<usize>,
    topt: bool,
}

impl LinKernighan {
    /// Creates the operator.
    ///
    /// With `topt` set, each base tries a 3-opt opener before chaining
    /// 2-opts; otherwise it chains 2-opts only. The variable domains are
    /// read from `store` up front to size the nearest-destination lists.
    pub fn new(
        next_vars: Vec<VarIndex>,
        path_vars: Option<Vec<VarIndex>>,
        store: &VariableStore,
        evaluator: PathEvaluator,
        topt: bool,
    ) -> Self {
        let domains: Vec<(i64, i64)> = next_vars
            .iter()
            .map(|&v| (store.min(v), store.max(v)))
            .collect();
        Self {
            path: PathState::new(next_vars, path_vars, 1, vec![false]),
            evaluator,
            neighbors: NearestNeighbors::new(LIN_KERNIGHAN_NEIGHBORS),
            domains,
            marked: HashSet::new(),
            topt,
        }
    }
}

fn in_from_out(
    p: &PathState,
    evaluator: &PathEvaluator,
    neighbors: &NearestNeighbors,
    marked: &HashSet<usize>,
    in_i: usize,
    in_j: usize,
    gain: i64,
) -> Option<(usize, i64)> {
    let candidates = neighbors.neighbors(in_j);
    let mut best_gain = i64::MIN;
    let mut out = 0usize;
    let route = p.path(in_i);
    let out_cost = evaluator(in_i, in_j, route);
    let current_gain = gain + out_cost;
    for &next in candidates {
        if next != in_j {
            let in_cost = evaluator(in_j, next, route);
            let new_gain = current_gain - in_cost;
            if new_gain > 0
                && next != p.next(in_j)
                && !marked.contains(&in_j)
                && !marked.contains(&next)
                && best_gain < new_gain
            {
                out = next;
                best_gain = new_gain;
            }
        }
    }
    if best_gain > i64::MIN {
        Some((out, best_gain))
    } else {
        None
    }
}

#[allow(clippy::too_many_arguments)]
fn make_lk_neighbor(
    p: &mut PathState,
    evaluator: &PathEvaluator,
    neighbors: &NearestNeighbors,
    marked: &mut HashSet<usize>,
    topt: bool,
) -> bool {
    marked.clear();
    let mut node = p.base_node(0);
    if p.is_path_end(node) {
        return false;
    }
    let route = p.path(node);
    let base = node;
    let mut next = p.next(node);
    if p.is_path_end(next) {
        return false;
    }
    let mut gain: i64 = 0;
    marked.insert(node);
    if topt {
        // 3-opt opener: two candidate arcs out, one chain relocation.
        let (out, g) = match in_from_out(p, evaluator, neighbors, marked, node, next, gain) {
            Some(found) => found,
            None => return false,
        };
        gain = g;
        marked.insert(next);
        marked.insert(out);
        let node1 = out;
        if p.is_path_end(node1) {
            return false;
        }
        let next1 = p.next(node1);
        if p.is_path_end(next1) {
            return false;
        }
        let (out1, g1) = match in_from_out(p, evaluator, neighbors, marked, node1, next1, gain) {
            Some(found) => found,
            None => return false,
        };
        gain = g1;
        marked.insert(next1);
        marked.insert(out1);
        if !p.move_chain(out1, node1, node) {
            return false;
        }
        let next_out = p.next(out1);
        let in_cost = evaluator(node, next_out, route);
        let out_cost = evaluator(out1, next_out, route);
        if gain - in_cost + out_cost > 0 {
            return true;
        }
        node = out1;
        if p.is_path_end(node) {
            return false;
        }
        next = next_out;
        if p.is_path_end(next) {
            return false;
        }
    }
    // Chain 2-opts while the local gain stays positive.
    loop {
        let (out, g) = match in_from_out(p, evaluator, neighbors, marked, node, next, gain) {
            Some(found) => found,
            None => return false,
        };
        gain = g;
        marked.insert(next);
        marked.insert(out);
        let chain_last = match p.reverse_chain(node, out) {
            Some(last) => last,
            None => return false,
        };
        let in_cost = evaluator(base, chain_last, route);
        let out_cost = evaluator(chain_last, out, route);
        if gain - in_cost + out_cost > 0 {
            return true;
        }
        node = chain_last;
        if p.is_path_end(node) {
            return false;
        }
        next = out;
        if p.is_path_end(next) {
            return false;
        }
    }
}

impl LocalSearchOperator for LinKernighan {
    fn name(&self) -> &str {
        "LinKernighan"
    }

    fn start(&mut self, assignment: &Assignment) {
        self.path.start(assignment);
        self.neighbors
            .initialize(&self.path, &self.evaluator, &self.domains);
    }

    fn make_next_neighbor(&mut self, delta: &mut Assignment, deltadelta: &mut Assignment) -> bool {
        let Self {
            path,
            evaluator,
            neighbors,
            marked,
            topt,
            ..
        } = self;
        let topt = *topt;
        path.next_neighbor(delta, deltadelta, false, |p| {
            make_lk_neighbor(p, evaluator, neighbors, marked, topt)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::testing::{
        assert_route_closure, collect_next_vectors, next_assignment, next_vars, walk,
    };
    use kedge_model::domain::Domain;
    use std::rc::Rc;

    fn store_with_next_domains(n: usize, hi: i64) -> VariableStore {
        let mut store = VariableStore::new();
        store.add_vars(n, Domain::interval(0, hi));
        store
    }

    #[test]
    fn test_nearest_neighbors_keeps_cheapest_destinations() {
        let mut path = PathState::new(next_vars(2), None, 1, vec![false]);
        path.start(&next_assignment(&[1, 2]));
        let evaluator: PathEvaluator = Rc::new(|_, to, _| (10 - to as i64).abs());
        let mut cache = NearestNeighbors::new(3);
        cache.initialize(&path, &evaluator, &[(0, 9), (0, 9)]);
        // Destinations 7, 8, 9 are the three cheapest for every row.
        assert_eq!(cache.neighbors(0), &[7, 8, 9]);
        assert_eq!(cache.neighbors(1), &[7, 8, 9]);
    }

    #[test]
    fn test_nearest_neighbors_small_domain_keeps_everything() {
        let mut path = PathState::new(next_vars(1), None, 1, vec![false]);
        path.start(&next_assignment(&[1]));
        let evaluator: PathEvaluator = Rc::new(|_, to, _| to as i64);
        let mut cache = NearestNeighbors::new(6);
        cache.initialize(&path, &evaluator, &[(0, 3)]);
        assert_eq!(cache.neighbors(0), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_nearest_neighbors_initializes_once() {
        let mut path = PathState::new(next_vars(1), None, 1, vec![false]);
        path.start(&next_assignment(&[1]));
        let evaluator: PathEvaluator = Rc::new(|_, to, _| to as i64);
        let mut cache = NearestNeighbors::new(2);
        cache.initialize(&path, &evaluator, &[(0, 5)]);
        let before = cache.neighbors(0).to_vec();
        // A second initialization must not rebuild the lists.
        cache.initialize(&path, &evaluator, &[(0, 1)]);
        assert_eq!(cache.neighbors(0), before.as_slice());
        assert!(cache.is_initialized());
    }

    #[test]
    fn test_lin_kernighan_uncrosses_a_route() {
        // Nodes on a line: 0 at 0, 1 at 10, 2 at 1, 3 at 11; the sentinel
        // sits at 12. The reference 0→1→2→3 zig-zags; uncrossing it to
        // 0→2→1→3 has positive gain.
        let coords = [0i64, 10, 1, 11, 12];
        let evaluator: PathEvaluator =
            Rc::new(move |from, to, _| (coords[from] - coords[to]).abs());
        let reference = [1usize, 2, 3, 4];
        let store = store_with_next_domains(4, 4);
        let mut op = LinKernighan::new(next_vars(4), None, &store, evaluator, false);
        op.start(&next_assignment(&reference));

        let candidates = collect_next_vectors(&mut op, &reference, 16);
        assert!(!candidates.is_empty());
        assert_eq!(walk(&candidates[0], 0), vec![0, 2, 1, 3]);
        for candidate in &candidates {
            assert_route_closure(candidate);
        }
    }

    #[test]
    fn test_lin_kernighan_terminates_on_optimal_route() {
        // An already-sorted line has no positive-gain move at all.
        let coords = [0i64, 1, 2, 3, 4];
        let evaluator: PathEvaluator =
            Rc::new(move |from, to, _| (coords[from] - coords[to]).abs());
        let reference = [1usize, 2, 3, 4];
        let store = store_with_next_domains(4, 4);
        let mut op = LinKernighan::new(next_vars(4), None, &store, evaluator, false);
        op.start(&next_assignment(&reference));
        assert!(collect_next_vectors(&mut op, &reference, 16).is_empty());
    }

    #[test]
    fn test_lin_kernighan_with_topt_opener_stays_route_closed() {
        let coords = [0i64, 7, 3, 9, 1, 12, 13];
        let evaluator: PathEvaluator =
            Rc::new(move |from, to, _| (coords[from] - coords[to]).abs());
        let reference = [1usize, 2, 3, 4, 5, 6];
        let store = store_with_next_domains(6, 6);
        let mut op = LinKernighan::new(next_vars(6), None, &store, evaluator, true);
        op.start(&next_assignment(&reference));
        for candidate in collect_next_vectors(&mut op, &reference, 16) {
            assert_route_closure(&candidate);
        }
    }
}
