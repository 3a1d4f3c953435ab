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

//! The neighbor-finding inner loop.
//!
//! `FindOneNeighbor` owns the reference assignment the operator was
//! started against and drives one sub-solver attempt per accepted
//! candidate: advance the operator, let the metaheuristic and the filters
//! vote, verify with the nested solve, and on success commit the improved
//! assignment and notify the pool. All shared state (store, counters,
//! monitors, limit) is borrowed through a [`SearchContext`] owned by the
//! caller; nothing is global.

use crate::{
    config::LocalSearchConfig,
    decision::{SolveStatus, SubDecisionBuilder},
    filter::{filters_accept, LocalSearchFilter},
    meta::Metaheuristic,
    operator::LocalSearchOperator,
    pool::SolutionPool,
};
use kedge_model::{assignment::Assignment, store::VariableStore};
use kedge_search::{
    limit::SearchLimit,
    monitor::{SearchCommand, SearchMonitor},
    stats::SearchStatistics,
};

/// Everything the driver borrows for one run, passed explicitly.
pub struct SearchContext<'a> {
    pub store: &'a VariableStore,
    pub assignment: &'a mut Assignment,
    pub ls_operator: &'a mut dyn LocalSearchOperator,
    pub sub_builder: &'a mut dyn SubDecisionBuilder,
    pub filters: &'a mut [Box<dyn LocalSearchFilter>],
    pub metaheuristic: &'a mut dyn Metaheuristic,
    pub pool: &'a mut dyn SolutionPool,
    pub limit: &'a mut SearchLimit,
    pub monitors: &'a mut [Box<dyn SearchMonitor>],
    pub stats: &'a mut SearchStatistics,
    pub config: &'a LocalSearchConfig,
}

/// The inner loop: one call finds (at most) one accepted neighbor.
///
/// The reference assignment tracks the solution the operator was last
/// started against; the caller's `assignment` holds the last committed
/// neighbor. Between calls the episode state persists, so successive
/// calls walk one neighborhood until it exhausts, then re-synchronise
/// against the pool.
pub struct FindOneNeighbor {
    reference: Assignment,
    assignment_copy: Assignment,
    delta: Assignment,
    deltadelta: Assignment,
    neighbor_found: bool,
    counter: u64,
    started: bool,
}

impl Default for FindOneNeighbor {
    fn default() -> Self {
        Self::new()
    }
}

impl FindOneNeighbor {
    /// Creates an idle driver.
    pub fn new() -> Self {
        Self {
            reference: Assignment::new(),
            assignment_copy: Assignment::new(),
            delta: Assignment::new(),
            deltadelta: Assignment::new(),
            neighbor_found: false,
            counter: 0,
            started: false,
        }
    }

    /// Forces re-initialisation from the pool on the next call.
    pub fn restart(&mut self) {
        self.started = false;
    }

    fn synchronize_all(&mut self, ctx: &mut SearchContext<'_>) {
        ctx.pool.get_next_solution(&mut self.reference);
        self.neighbor_found = false;
        ctx.limit.init(ctx.stats);
        ctx.ls_operator.start(&self.reference);
        for filter in ctx.filters.iter_mut() {
            filter.synchronize(ctx.store, &self.reference);
        }
    }

    /// Runs the loop until a neighbor is committed, the neighborhood is
    /// exhausted, or a limit interrupts.
    pub fn solve(&mut self, ctx: &mut SearchContext<'_>) -> SolveStatus {
        if !self.started {
            // The reference has not been synchronised with the caller's
            // assignment yet.
            ctx.pool.initialize(ctx.assignment);
            self.synchronize_all(ctx);
            self.started = true;
        }
        loop {
            self.delta.clear();
            self.deltadelta.clear();

            // Cooperative suspension point: heartbeat and abort polling.
            for monitor in ctx.monitors.iter_mut() {
                monitor.on_step();
            }
            for monitor in ctx.monitors.iter_mut() {
                if let SearchCommand::Terminate(_) = monitor.search_command(ctx.stats) {
                    return SolveStatus::LimitHit;
                }
            }

            self.counter += 1;
            if self.counter >= ctx.config.sync_frequency && ctx.pool.sync_needed(&self.reference)
            {
                self.counter = 0;
                self.synchronize_all(ctx);
            }

            let limit_hit = ctx.limit.check(ctx.stats);
            let moved = !limit_hit
                && ctx
                    .ls_operator
                    .make_next_neighbor(&mut self.delta, &mut self.deltadelta);
            if moved {
                ctx.stats.on_neighbor();
                // Both votes are always taken: incremental filters must see
                // every delta to stay coherent.
                let meta_accept = ctx.metaheuristic.accept_delta(&self.delta, &self.deltadelta);
                let filter_accept =
                    filters_accept(ctx.filters, ctx.store, &self.delta, &self.deltadelta);
                if meta_accept && filter_accept {
                    ctx.stats.on_filtered_neighbor();
                    self.assignment_copy.copy_from(&self.reference);
                    self.assignment_copy.apply(&self.delta);
                    match ctx.sub_builder.solve(ctx.store, &mut self.assignment_copy) {
                        SolveStatus::Found => {
                            ctx.stats.on_accepted_neighbor();
                            ctx.assignment.copy_from(&self.assignment_copy);
                            self.neighbor_found = true;
                            for monitor in ctx.monitors.iter_mut() {
                                monitor.on_solution_found(ctx.assignment, ctx.stats);
                            }
                            return SolveStatus::Found;
                        }
                        SolveStatus::Failed => {
                            ctx.stats.on_failure();
                        }
                        SolveStatus::LimitHit => return SolveStatus::LimitHit,
                    }
                }
            } else if self.neighbor_found {
                // Episode over with progress: hand the accepted solution to
                // the pool and explore from the next reference.
                ctx.metaheuristic.on_neighbor_accepted();
                ctx.pool.register_new_solution(ctx.assignment);
                self.synchronize_all(ctx);
            } else if limit_hit {
                return SolveStatus::LimitHit;
            } else {
                // Local optimum: the whole episode produced nothing.
                return SolveStatus::Failed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        decision::RestoreAssignment,
        filter::{make_objective_filter, BoundMode, FilterOperation, VariableDomainFilter},
        lns::SimpleLns,
        meta::GreedyDescent,
        pool::DefaultSolutionPool,
        value::ChangeValue,
    };
    use kedge_model::{domain::Domain, index::VarIndex};
    use kedge_search::monitor::NullMonitor;

    struct Fixture {
        store: VariableStore,
        vars: Vec<VarIndex>,
        assignment: Assignment,
        filters: Vec<Box<dyn LocalSearchFilter>>,
        pool: DefaultSolutionPool,
        limit: SearchLimit,
        monitors: Vec<Box<dyn SearchMonitor>>,
        stats: SearchStatistics,
        config: LocalSearchConfig,
        meta: GreedyDescent,
        sub_builder: RestoreAssignment,
    }

    fn fixture(values: &[i64], objective_max: i64) -> Fixture {
        let mut store = VariableStore::new();
        let vars = store.add_vars(values.len(), Domain::interval(0, 10));
        let objective = store.add_var(Domain::interval(0, objective_max));
        let mut assignment = Assignment::new();
        for (&v, &x) in vars.iter().zip(values) {
            assignment.add(v).set_value(x);
        }
        let filters: Vec<Box<dyn LocalSearchFilter>> = vec![
            Box::new(VariableDomainFilter),
            Box::new(make_objective_filter(
                vars.clone(),
                Box::new(|_, value| value),
                objective,
                BoundMode::Le,
                FilterOperation::Sum,
            )),
        ];
        Fixture {
            store,
            vars,
            assignment,
            filters,
            pool: DefaultSolutionPool::new(),
            limit: SearchLimit::default(),
            monitors: vec![Box::new(NullMonitor)],
            stats: SearchStatistics::new(),
            config: LocalSearchConfig::default(),
            meta: GreedyDescent,
            sub_builder: RestoreAssignment,
        }
    }

    fn context<'a>(
        f: &'a mut Fixture,
        ls_operator: &'a mut dyn LocalSearchOperator,
    ) -> SearchContext<'a> {
        SearchContext {
            store: &f.store,
            assignment: &mut f.assignment,
            ls_operator,
            sub_builder: &mut f.sub_builder,
            filters: &mut f.filters,
            metaheuristic: &mut f.meta,
            pool: &mut f.pool,
            limit: &mut f.limit,
            monitors: &mut f.monitors,
            stats: &mut f.stats,
            config: &f.config,
        }
    }

    #[test]
    fn test_find_one_neighbor_commits_improving_candidates() {
        let mut f = fixture(&[5, 5], 9);
        let vars = f.vars.clone();
        let mut op = ChangeValue::decrement(vars.clone());
        let mut driver = FindOneNeighbor::new();
        {
            let mut ctx = context(&mut f, &mut op);
            assert_eq!(driver.solve(&mut ctx), SolveStatus::Found);
        }
        // The first committed neighbor decrements variable 0.
        assert_eq!(f.assignment.value(f.vars[0]), Some(4));
        assert_eq!(f.stats.accepted_neighbors, 1);
        assert!(f.stats.neighbors >= 1);
    }

    #[test]
    fn test_find_one_neighbor_descends_to_local_optimum() {
        let mut f = fixture(&[5, 5], 9);
        let vars = f.vars.clone();
        let mut op = ChangeValue::decrement(vars.clone());
        let mut driver = FindOneNeighbor::new();
        loop {
            let mut ctx = context(&mut f, &mut op);
            match driver.solve(&mut ctx) {
                SolveStatus::Found => continue,
                SolveStatus::Failed => break,
                SolveStatus::LimitHit => panic!("no limit configured"),
            }
        }
        // Decrements stop at the domain floor.
        assert_eq!(f.assignment.value(f.vars[0]), Some(0));
        assert_eq!(f.assignment.value(f.vars[1]), Some(0));
        // Rejected candidates are exactly the ones filtered out.
        assert!(f.stats.neighbors > f.stats.filtered_neighbors);
    }

    #[test]
    fn test_objective_filter_blocks_worsening_start() {
        // Sum is exactly at the bound: increments are filtered, the
        // neighborhood exhausts without an accepted neighbor.
        let mut f = fixture(&[5, 5], 10);
        let vars = f.vars.clone();
        let mut op = ChangeValue::increment(vars);
        let mut driver = FindOneNeighbor::new();
        let status = {
            let mut ctx = context(&mut f, &mut op);
            driver.solve(&mut ctx)
        };
        assert_eq!(status, SolveStatus::Failed);
        assert_eq!(f.stats.filtered_neighbors, 0);
        assert_eq!(f.stats.neighbors, 2);
    }

    /// A sub-solver that fails every candidate.
    struct FailingBuilder;

    impl SubDecisionBuilder for FailingBuilder {
        fn solve(&mut self, _store: &VariableStore, _candidate: &mut Assignment) -> SolveStatus {
            SolveStatus::Failed
        }
    }

    #[test]
    fn test_neighbor_limit_interrupts_episode() {
        let mut f = fixture(&[5, 5, 5, 5, 5], 100);
        f.limit = SearchLimit::neighbor_limit(3);
        let vars = f.vars.clone();
        let mut op = SimpleLns::new(vars, 1);
        let mut failing = FailingBuilder;
        let status = {
            let mut ctx = SearchContext {
                store: &f.store,
                assignment: &mut f.assignment,
                ls_operator: &mut op,
                sub_builder: &mut failing,
                filters: &mut f.filters,
                metaheuristic: &mut f.meta,
                pool: &mut f.pool,
                limit: &mut f.limit,
                monitors: &mut f.monitors,
                stats: &mut f.stats,
                config: &f.config,
            };
            let mut driver = FindOneNeighbor::new();
            driver.solve(&mut ctx)
        };
        assert_eq!(status, SolveStatus::LimitHit);
        assert_eq!(f.stats.neighbors, 3);
        assert_eq!(f.stats.accepted_neighbors, 0);
    }

    #[test]
    fn test_failed_sub_solves_are_counted_and_skipped() {
        let mut f = fixture(&[5, 5], 9);
        let vars = f.vars.clone();
        let mut op = ChangeValue::decrement(vars);
        let mut failing = FailingBuilder;
        let status = {
            let mut ctx = SearchContext {
                store: &f.store,
                assignment: &mut f.assignment,
                ls_operator: &mut op,
                sub_builder: &mut failing,
                filters: &mut f.filters,
                metaheuristic: &mut f.meta,
                pool: &mut f.pool,
                limit: &mut f.limit,
                monitors: &mut f.monitors,
                stats: &mut f.stats,
                config: &f.config,
            };
            let mut driver = FindOneNeighbor::new();
            driver.solve(&mut ctx)
        };
        // Every candidate fails verification: local optimum.
        assert_eq!(status, SolveStatus::Failed);
        assert_eq!(f.stats.failures, 2);
        assert_eq!(f.assignment.value(f.vars[0]), Some(5));
    }
}
