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

//! The local-search phase builder.
//!
//! A phase composes two nested decisions: a first-solution decision (a
//! user-supplied builder, or restoring the assignment the caller already
//! holds) and a neighbor-finding decision wrapped around
//! [`FindOneNeighbor`]. Balancing decisions pad the search to a fixed
//! depth before the nested solves proceed; after that, each accepted
//! neighbor re-enters the loop, and a failed nested solve halts the phase
//! unless the metaheuristic claims the local optimum.

use crate::{
    decision::{NestedSolveDecision, SolveStatus, SubDecisionBuilder},
    driver::{FindOneNeighbor, SearchContext},
    result::{LocalSearchOutcome, TerminationReason},
};
use kedge_search::monitor::SearchCommand;

/// The phase driver; see the module documentation.
pub struct LocalSearchPhase {
    first_solution: Option<Box<dyn SubDecisionBuilder>>,
    find_neighbors: FindOneNeighbor,
    first_decision: NestedSolveDecision,
    neighbor_decision: NestedSolveDecision,
    has_started: bool,
}

impl Default for LocalSearchPhase {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalSearchPhase {
    /// Creates a phase that improves the assignment the caller passes in.
    pub fn new() -> Self {
        Self {
            first_solution: None,
            find_neighbors: FindOneNeighbor::new(),
            first_decision: NestedSolveDecision::new(false),
            neighbor_decision: NestedSolveDecision::new(false),
            has_started: false,
        }
    }

    /// Creates a phase that produces its first solution through `builder`.
    pub fn with_first_solution(builder: Box<dyn SubDecisionBuilder>) -> Self {
        Self {
            first_solution: Some(builder),
            ..Self::new()
        }
    }

    /// Runs the phase to completion.
    ///
    /// The improved assignment is left in `ctx.assignment`; monitors see
    /// the stream of committed solutions along the way.
    pub fn run(&mut self, ctx: &mut SearchContext<'_>) -> LocalSearchOutcome {
        for monitor in ctx.monitors.iter_mut() {
            monitor.on_enter_search();
        }

        if !self.has_started {
            self.has_started = true;
            let Self {
                first_solution,
                first_decision,
                ..
            } = self;
            let status = first_decision.apply(|| match first_solution {
                Some(builder) => builder.solve(ctx.store, ctx.assignment),
                None => {
                    if ctx.assignment.is_empty() {
                        SolveStatus::Failed
                    } else {
                        SolveStatus::Found
                    }
                }
            });
            if status != SolveStatus::Found {
                for monitor in ctx.monitors.iter_mut() {
                    monitor.on_exit_search();
                }
                return LocalSearchOutcome::new(TerminationReason::NoFirstSolution, *ctx.stats);
            }
            for monitor in ctx.monitors.iter_mut() {
                monitor.on_solution_found(ctx.assignment, ctx.stats);
            }
        }

        let mut depth: u32 = 0;
        let reason = loop {
            if depth < ctx.config.balanced_tree_depth {
                // Balancing decision: pad the tree without solving.
                depth += 1;
                continue;
            }
            self.neighbor_decision.reset();
            let snapshot = if self.neighbor_decision.is_restoring() {
                Some(ctx.assignment.clone())
            } else {
                None
            };
            let find_neighbors = &mut self.find_neighbors;
            let status = self.neighbor_decision.apply(|| find_neighbors.solve(ctx));
            if status != SolveStatus::Found {
                if let Some(snapshot) = snapshot {
                    ctx.assignment.copy_from(&snapshot);
                }
            }
            match status {
                SolveStatus::Found => {}
                SolveStatus::Failed => {
                    if ctx.metaheuristic.at_local_optimum() {
                        // The metaheuristic claims the optimum: explore on
                        // from a fresh synchronisation.
                        self.find_neighbors.restart();
                        continue;
                    }
                    break TerminationReason::LocalOptimum;
                }
                SolveStatus::LimitHit => {
                    let mut reason = None;
                    for monitor in ctx.monitors.iter_mut() {
                        if let SearchCommand::Terminate(r) = monitor.search_command(ctx.stats) {
                            reason = Some(r);
                            break;
                        }
                    }
                    break match reason {
                        Some(r) => TerminationReason::Aborted(r),
                        None => TerminationReason::LimitReached,
                    };
                }
            }
        };

        for monitor in ctx.monitors.iter_mut() {
            monitor.on_exit_search();
        }
        LocalSearchOutcome::new(reason, *ctx.stats)
    }
}
