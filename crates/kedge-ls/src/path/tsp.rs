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

//! Exact-TSP sub-path re-optimisation.
//!
//! `TspOpt` re-sequences a sliding window of a route by solving the exact
//! TSP over its nodes; `TspLns` collapses a whole route into randomly
//! chosen meta-nodes and re-sequences those. Both delegate the tour
//! computation to a [`HamiltonianPathSolver`], an external collaborator
//! for which an exact dynamic-programming implementation is provided.

use crate::{
    operator::LocalSearchOperator,
    path::{PathEvaluator, PathState},
};
use kedge_model::{assignment::Assignment, index::VarIndex};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::HashSet;

/// The tour solver the TSP operators delegate to.
///
/// `traveling_salesman_path` returns a closed tour over the nodes of the
/// current cost matrix: `n + 1` indices starting and ending at node zero.
pub trait HamiltonianPathSolver {
    /// Installs a new square cost matrix.
    fn change_cost_matrix(&mut self, cost: Vec<Vec<i64>>);

    /// Returns the cheapest closed tour for the installed matrix.
    fn traveling_salesman_path(&mut self) -> Vec<usize>;
}

/// Exact tour computation by Held–Karp dynamic programming over node
/// subsets. Exponential in the node count; intended for the sub-problem
/// sizes the TSP operators produce.
#[derive(Debug, Clone, Default)]
pub struct HeldKarpSolver {
    cost: Vec<Vec<i64>>,
}

impl HeldKarpSolver {
    /// Creates a solver with an empty matrix.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }
}

impl HamiltonianPathSolver for HeldKarpSolver {
    fn change_cost_matrix(&mut self, cost: Vec<Vec<i64>>) {
        for row in &cost {
            assert_eq!(
                row.len(),
                cost.len(),
                "called `HeldKarpSolver::change_cost_matrix` with a non-square matrix"
            );
        }
        self.cost = cost;
    }

    fn traveling_salesman_path(&mut self) -> Vec<usize> {
        let n = self.cost.len();
        assert!(
            n >= 1,
            "called `HeldKarpSolver::traveling_salesman_path` with an empty matrix"
        );
        assert!(
            n <= 24,
            "called `HeldKarpSolver::traveling_salesman_path` with {} nodes, beyond the subset dynamic program",
            n
        );
        if n == 1 {
            return vec![0, 0];
        }
        let m = n - 1;
        let full = 1usize << m;
        let mut dp = vec![vec![i64::MAX; m]; full];
        let mut parent = vec![vec![usize::MAX; m]; full];
        for j in 0..m {
            dp[1 << j][j] = self.cost[0][j + 1];
        }
        for mask in 1..full {
            for j in 0..m {
                if mask & (1 << j) == 0 {
                    continue;
                }
                let current = dp[mask][j];
                if current == i64::MAX {
                    continue;
                }
                for k in 0..m {
                    if mask & (1 << k) != 0 {
                        continue;
                    }
                    let candidate = current.saturating_add(self.cost[j + 1][k + 1]);
                    let slot = mask | (1 << k);
                    if candidate < dp[slot][k] {
                        dp[slot][k] = candidate;
                        parent[slot][k] = j;
                    }
                }
            }
        }
        let mut best = i64::MAX;
        let mut best_j = 0;
        for j in 0..m {
            if dp[full - 1][j] == i64::MAX {
                continue;
            }
            let total = dp[full - 1][j].saturating_add(self.cost[j + 1][0]);
            if total < best {
                best = total;
                best_j = j;
            }
        }
        let mut order = vec![0usize; m];
        let mut mask = full - 1;
        let mut j = best_j;
        for slot in (0..m).rev() {
            order[slot] = j + 1;
            let previous = parent[mask][j];
            mask &= !(1 << j);
            if previous == usize::MAX {
                break;
            }
            j = previous;
        }
        let mut path = Vec::with_capacity(n + 1);
        path.push(0);
        path.extend(order);
        path.push(0);
        path
    }
}

/// Sliding exact-TSP operator.
///
/// For the sub-chain of up to `chain_length + 1` nodes behind the cursor,
/// builds an arc-cost matrix in which the sub-chain endpoints are merged
/// into a single meta-node (so connections to the rest of the route are
/// preserved), solves the TSP and re-sequences the sub-chain accordingly.
pub struct TspOpt<S: HamiltonianPathSolver> {
    path: PathState,
    solver: S,
    evaluator: PathEvaluator,
    chain_length: usize,
}

impl TspOpt<HeldKarpSolver> {
    /// Creates the operator over the exact dynamic-programming solver.
    pub fn with_held_karp(
        next_vars: Vec<VarIndex>,
        path_vars: Option<Vec<VarIndex>>,
        evaluator: PathEvaluator,
        chain_length: usize,
    ) -> Self {
        Self::new(
            next_vars,
            path_vars,
            HeldKarpSolver::new(),
            evaluator,
            chain_length,
        )
    }
}

impl<S: HamiltonianPathSolver> TspOpt<S> {
    /// Creates the operator over an explicit tour solver.
    pub fn new(
        next_vars: Vec<VarIndex>,
        path_vars: Option<Vec<VarIndex>>,
        solver: S,
        evaluator: PathEvaluator,
        chain_length: usize,
    ) -> Self {
        Self {
            path: PathState::new(next_vars, path_vars, 1, vec![false]),
            solver,
            evaluator,
            chain_length,
        }
    }
}

impl<S: HamiltonianPathSolver> LocalSearchOperator for TspOpt<S> {
    fn name(&self) -> &str {
        "TspOpt"
    }

    fn start(&mut self, assignment: &Assignment) {
        self.path.start(assignment);
    }

    fn make_next_neighbor(&mut self, delta: &mut Assignment, deltadelta: &mut Assignment) -> bool {
        let Self {
            path,
            solver,
            evaluator,
            chain_length,
        } = self;
        let chain_length = *chain_length;
        path.next_neighbor(delta, deltadelta, false, |p| {
            let mut nodes = Vec::new();
            let mut chain_end = p.base_node(0);
            for _ in 0..chain_length + 1 {
                nodes.push(chain_end);
                if p.is_path_end(chain_end) {
                    break;
                }
                chain_end = p.next(chain_end);
            }
            if nodes.len() <= 3 {
                return false;
            }
            let chain_path = p.path(p.base_node(0));
            let size = nodes.len() - 1;
            let mut cost = vec![vec![0i64; size]; size];
            for (i, row) in cost.iter_mut().enumerate() {
                // Column zero is the merged endpoint meta-node: leaving
                // towards it means leaving the sub-chain.
                row[0] = evaluator(nodes[i], nodes[size], chain_path);
                for (j, slot) in row.iter_mut().enumerate().skip(1) {
                    *slot = evaluator(nodes[i], nodes[j], chain_path);
                }
            }
            solver.change_cost_matrix(cost);
            let tour = solver.traveling_salesman_path();
            assert_eq!(
                tour.len(),
                size + 1,
                "tour solver returned a path of the wrong length: {} != {}",
                tour.len(),
                size + 1
            );
            for i in 0..size - 1 {
                p.set_next(nodes[tour[i]], nodes[tour[i + 1]], chain_path);
            }
            p.set_next(nodes[tour[size - 1]], nodes[size], chain_path);
            true
        })
    }
}

/// TSP-based large neighborhood search.
///
/// Randomly merges consecutive route nodes until `tsp_size` meta-nodes
/// remain, solves the TSP over the meta-nodes and injects the
/// re-sequenced route. The cursor node is always forced into the break
/// set for diversification. The neighborhood is unlimited; a candidate is
/// rejected when the re-sequencing equals the identity.
pub struct TspLns<S: HamiltonianPathSolver, R: Rng> {
    path: PathState,
    solver: S,
    evaluator: PathEvaluator,
    tsp_size: usize,
    rng: R,
}

impl TspLns<HeldKarpSolver, StdRng> {
    /// Creates the operator over the exact solver and a seeded generator.
    pub fn with_seed(
        next_vars: Vec<VarIndex>,
        path_vars: Option<Vec<VarIndex>>,
        evaluator: PathEvaluator,
        tsp_size: usize,
        seed: u64,
    ) -> Self {
        Self::new(
            next_vars,
            path_vars,
            HeldKarpSolver::new(),
            evaluator,
            tsp_size,
            StdRng::seed_from_u64(seed),
        )
    }
}

impl<S: HamiltonianPathSolver, R: Rng> TspLns<S, R> {
    /// Creates the operator.
    ///
    /// # Panics
    ///
    /// Panics if `tsp_size` is smaller than two.
    pub fn new(
        next_vars: Vec<VarIndex>,
        path_vars: Option<Vec<VarIndex>>,
        solver: S,
        evaluator: PathEvaluator,
        tsp_size: usize,
        rng: R,
    ) -> Self {
        assert!(
            tsp_size >= 2,
            "called `TspLns::new` with fewer than two meta-nodes"
        );
        Self {
            path: PathState::new(next_vars, path_vars, 1, vec![false]),
            solver,
            evaluator,
            tsp_size,
            rng,
        }
    }
}

fn make_tsp_lns_neighbor<S: HamiltonianPathSolver, R: Rng>(
    p: &mut PathState,
    solver: &mut S,
    evaluator: &PathEvaluator,
    tsp_size: usize,
    rng: &mut R,
) -> bool {
    let base_node = p.base_node(0);
    if p.is_path_end(base_node) {
        return false;
    }
    let mut nodes = Vec::new();
    let mut node = p.start_node(0);
    while !p.is_path_end(node) {
        nodes.push(node);
        node = p.next(node);
    }
    if nodes.len() <= tsp_size {
        return false;
    }
    // Select break nodes: the final node of each meta-node, after which an
    // arc is relaxed. The base node always breaks, for diversification.
    let mut breaks_set: HashSet<usize> = HashSet::new();
    breaks_set.insert(base_node);
    while breaks_set.len() < tsp_size {
        let pick = nodes[rng.random_range(0..nodes.len())];
        breaks_set.insert(pick);
    }
    // Index the breaks in route order and accumulate the internal cost of
    // each meta-node; adding it to the matrix rows keeps the triangle
    // inequality intact.
    let mut breaks = Vec::with_capacity(tsp_size);
    let mut meta_node_costs = Vec::with_capacity(tsp_size);
    let mut cost: i64 = 0;
    let mut node = p.start_node(0);
    let node_path = p.path(node);
    while !p.is_path_end(node) {
        let next = p.next(node);
        if breaks_set.contains(&node) {
            breaks.push(node);
            meta_node_costs.push(cost);
            cost = 0;
        } else {
            cost += evaluator(node, next, node_path);
        }
        node = next;
    }
    meta_node_costs[0] += cost;
    assert_eq!(
        breaks.len(),
        tsp_size,
        "break selection lost nodes: {} != {}",
        breaks.len(),
        tsp_size
    );
    let mut matrix = vec![vec![0i64; tsp_size]; tsp_size];
    for i in 0..tsp_size {
        matrix[i][0] =
            meta_node_costs[i] + evaluator(breaks[i], p.next(breaks[tsp_size - 1]), node_path);
        for j in 1..tsp_size {
            matrix[i][j] =
                meta_node_costs[i] + evaluator(breaks[i], p.next(breaks[j - 1]), node_path);
        }
        matrix[i][i] = 0;
    }
    solver.change_cost_matrix(matrix);
    let tour = solver.traveling_salesman_path();
    // Inject only when the re-sequencing differs from the identity.
    let nochange = tour[..tour.len() - 1].iter().enumerate().all(|(i, &v)| v == i);
    if nochange {
        return false;
    }
    debug_assert_eq!(tour[tour.len() - 1], 0);
    for i in 0..tsp_size - 1 {
        p.set_next(breaks[tour[i]], p.old_next(breaks[tour[i + 1] - 1]), node_path);
    }
    p.set_next(
        breaks[tour[tsp_size - 1]],
        p.old_next(breaks[tsp_size - 1]),
        node_path,
    );
    true
}

impl<S: HamiltonianPathSolver, R: Rng> LocalSearchOperator for TspLns<S, R> {
    fn name(&self) -> &str {
        "TspLns"
    }

    fn start(&mut self, assignment: &Assignment) {
        self.path.start(assignment);
    }

    fn make_next_neighbor(&mut self, delta: &mut Assignment, deltadelta: &mut Assignment) -> bool {
        let Self {
            path,
            solver,
            evaluator,
            tsp_size,
            rng,
        } = self;
        let tsp_size = *tsp_size;
        path.next_neighbor_with(delta, deltadelta, false, |p| {
            // The neighborhood is unlimited: cursor exhaustion starts a new
            // revolution instead of ending the episode. Two consecutive
            // revolutions without a single staged candidate terminate it.
            for _ in 0..2 {
                if p.make_one_neighbor(false, |p| {
                    make_tsp_lns_neighbor(p, solver, evaluator, tsp_size, rng)
                }) {
                    return true;
                }
            }
            false
        })
    }
}
