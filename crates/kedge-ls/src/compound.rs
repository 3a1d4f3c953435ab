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

//! Operator combinators.
//!
//! Combinators implement the same capability interface as the operators
//! they wrap: a ranked concatenation that drains one sub-operator before
//! advancing to the next, a random dispatcher, and a per-episode call
//! limit.

use crate::operator::LocalSearchOperator;
use kedge_model::assignment::Assignment;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

/// Ranks the candidate operator for a given active operator; smaller is
/// better, ties break by natural order. Must be repeatable.
pub type OperatorEvaluator = Box<dyn Fn(usize, usize) -> i64>;

/// Keeps priority on the most recently successful operator: the active
/// operator ranks first and the others follow it cyclically.
pub fn round_robin_evaluator(size: usize) -> OperatorEvaluator {
    Box::new(move |active_index, operator_index| {
        if operator_index < active_index {
            (size + operator_index - active_index) as i64
        } else {
            (operator_index - active_index) as i64
        }
    })
}

/// Always scans from the first operator.
pub fn restart_evaluator() -> OperatorEvaluator {
    Box::new(|_, _| 0)
}

/// Concatenates operators, draining the selected one before advancing.
///
/// On start, the sub-operators are ranked by the evaluator relative to the
/// operator that produced the last neighbor; exploration then walks the
/// ranked order cyclically until every sub-operator is exhausted.
pub struct CompoundOperator {
    operators: Vec<Box<dyn LocalSearchOperator>>,
    operator_indices: Vec<usize>,
    index: usize,
    evaluator: OperatorEvaluator,
}

impl CompoundOperator {
    /// Creates the combinator with an explicit ranking evaluator.
    ///
    /// # Panics
    ///
    /// Panics if `operators` is empty.
    pub fn new(operators: Vec<Box<dyn LocalSearchOperator>>, evaluator: OperatorEvaluator) -> Self {
        assert!(
            !operators.is_empty(),
            "called `CompoundOperator::new` with no operators"
        );
        let size = operators.len();
        Self {
            operators,
            operator_indices: (0..size).collect(),
            index: 0,
            evaluator,
        }
    }

    /// Concatenates with the round-robin-after-last-success ranking.
    pub fn concatenate(operators: Vec<Box<dyn LocalSearchOperator>>) -> Self {
        let size = operators.len();
        Self::new(operators, round_robin_evaluator(size))
    }

    /// Concatenates with the restart-from-head ranking.
    pub fn concatenate_restart(operators: Vec<Box<dyn LocalSearchOperator>>) -> Self {
        Self::new(operators, restart_evaluator())
    }
}

impl LocalSearchOperator for CompoundOperator {
    fn name(&self) -> &str {
        "CompoundOperator"
    }

    fn start(&mut self, assignment: &Assignment) {
        for operator in &mut self.operators {
            operator.start(assignment);
        }
        let active = self.operator_indices[self.index];
        let evaluator = &self.evaluator;
        self.operator_indices
            .sort_by_key(|&candidate| (evaluator(active, candidate), candidate));
        self.index = 0;
    }

    fn make_next_neighbor(&mut self, delta: &mut Assignment, deltadelta: &mut Assignment) -> bool {
        let size = self.operators.len();
        loop {
            let operator = &mut self.operators[self.operator_indices[self.index]];
            if operator.make_next_neighbor(delta, deltadelta) {
                return true;
            }
            self.index += 1;
            if self.index == size {
                self.index = 0;
            }
            if self.index == 0 {
                return false;
            }
        }
    }
}

/// Dispatches every query to a freshly shuffled order of sub-operators,
/// returning the first candidate found.
pub struct RandomCompoundOperator<R: Rng> {
    operators: Vec<Box<dyn LocalSearchOperator>>,
    rng: R,
}

impl RandomCompoundOperator<StdRng> {
    /// Creates the combinator with a seeded standard generator.
    pub fn with_seed(operators: Vec<Box<dyn LocalSearchOperator>>, seed: u64) -> Self {
        Self::new(operators, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomCompoundOperator<R> {
    /// Creates the combinator over an explicit generator.
    pub fn new(operators: Vec<Box<dyn LocalSearchOperator>>, rng: R) -> Self {
        Self { operators, rng }
    }
}

impl<R: Rng> LocalSearchOperator for RandomCompoundOperator<R> {
    fn name(&self) -> &str {
        "RandomCompoundOperator"
    }

    fn start(&mut self, assignment: &Assignment) {
        for operator in &mut self.operators {
            operator.start(assignment);
        }
    }

    fn make_next_neighbor(&mut self, delta: &mut Assignment, deltadelta: &mut Assignment) -> bool {
        let mut indices: Vec<usize> = (0..self.operators.len()).collect();
        indices.shuffle(&mut self.rng);
        for index in indices {
            if self.operators[index].make_next_neighbor(delta, deltadelta) {
                return true;
            }
        }
        false
    }
}

/// Caps the number of neighbor queries per episode.
pub struct NeighborhoodLimit {
    operator: Box<dyn LocalSearchOperator>,
    limit: u64,
    next_neighborhood_calls: u64,
}

impl NeighborhoodLimit {
    /// Creates the limiter.
    ///
    /// # Panics
    ///
    /// Panics if `limit` is zero.
    pub fn new(operator: Box<dyn LocalSearchOperator>, limit: u64) -> Self {
        assert!(
            limit > 0,
            "called `NeighborhoodLimit::new` with a zero limit"
        );
        Self {
            operator,
            limit,
            next_neighborhood_calls: 0,
        }
    }
}

impl LocalSearchOperator for NeighborhoodLimit {
    fn name(&self) -> &str {
        "NeighborhoodLimit"
    }

    fn start(&mut self, assignment: &Assignment) {
        self.next_neighborhood_calls = 0;
        self.operator.start(assignment);
    }

    fn make_next_neighbor(&mut self, delta: &mut Assignment, deltadelta: &mut Assignment) -> bool {
        if self.next_neighborhood_calls >= self.limit {
            return false;
        }
        self.next_neighborhood_calls += 1;
        self.operator.make_next_neighbor(delta, deltadelta)
    }

    fn is_incremental(&self) -> bool {
        self.operator.is_incremental()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kedge_model::index::VarIndex;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Emits `limit` synthetic candidates per episode and logs every call
    /// under its id.
    struct TrackingOperator {
        id: usize,
        limit: usize,
        calls: usize,
        log: Rc<RefCell<Vec<usize>>>,
        start_log: Rc<RefCell<Vec<usize>>>,
    }

    impl TrackingOperator {
        fn boxed(
            id: usize,
            limit: usize,
            log: &Rc<RefCell<Vec<usize>>>,
            start_log: &Rc<RefCell<Vec<usize>>>,
        ) -> Box<dyn LocalSearchOperator> {
            Box::new(Self {
                id,
                limit,
                calls: 0,
                log: log.clone(),
                start_log: start_log.clone(),
            })
        }
    }

    impl LocalSearchOperator for TrackingOperator {
        fn name(&self) -> &str {
            "TrackingOperator"
        }

        fn start(&mut self, _assignment: &Assignment) {
            self.calls = 0;
            self.start_log.borrow_mut().push(self.id);
        }

        fn make_next_neighbor(
            &mut self,
            delta: &mut Assignment,
            _deltadelta: &mut Assignment,
        ) -> bool {
            if self.calls < self.limit {
                self.calls += 1;
                self.log.borrow_mut().push(self.id);
                // A synthetic one-element delta marking the source.
                delta.fast_add(VarIndex::new(self.id)).set_value(self.calls as i64);
                true
            } else {
                false
            }
        }
    }

    fn drain(op: &mut dyn LocalSearchOperator) -> usize {
        let mut delta = Assignment::new();
        let mut deltadelta = Assignment::new();
        let mut produced = 0;
        loop {
            delta.clear();
            deltadelta.clear();
            if !op.make_next_neighbor(&mut delta, &mut deltadelta) {
                return produced;
            }
            produced += 1;
            assert!(produced < 1000, "combinator failed to exhaust");
        }
    }

    #[test]
    fn test_compound_drains_operators_in_order() {
        // A yields 1 candidate, B yields 2, C yields 1: the sweep is
        // A, B, B, C, then exhaustion.
        let log = Rc::new(RefCell::new(Vec::new()));
        let starts = Rc::new(RefCell::new(Vec::new()));
        let mut compound = CompoundOperator::concatenate(vec![
            TrackingOperator::boxed(0, 1, &log, &starts),
            TrackingOperator::boxed(1, 2, &log, &starts),
            TrackingOperator::boxed(2, 1, &log, &starts),
        ]);
        compound.start(&Assignment::new());
        assert_eq!(drain(&mut compound), 4);
        assert_eq!(*log.borrow(), vec![0, 1, 1, 2]);
    }

    #[test]
    fn test_compound_round_robin_resumes_after_last_success() {
        // After an episode ending on operator C, a restart ranks C first,
        // then A, then B.
        let log = Rc::new(RefCell::new(Vec::new()));
        let starts = Rc::new(RefCell::new(Vec::new()));
        let mut compound = CompoundOperator::concatenate(vec![
            TrackingOperator::boxed(0, 1, &log, &starts),
            TrackingOperator::boxed(1, 2, &log, &starts),
            TrackingOperator::boxed(2, 1, &log, &starts),
        ]);
        compound.start(&Assignment::new());

        // Walk to the fourth neighbor, produced by C; the driver would now
        // accept it and re-start the operator.
        let mut delta = Assignment::new();
        let mut deltadelta = Assignment::new();
        for _ in 0..4 {
            delta.clear();
            deltadelta.clear();
            assert!(compound.make_next_neighbor(&mut delta, &mut deltadelta));
        }

        log.borrow_mut().clear();
        compound.start(&Assignment::new());
        drain(&mut compound);
        assert_eq!(*log.borrow(), vec![2, 0, 1, 1]);
    }

    #[test]
    fn test_compound_restart_variant_always_scans_from_head() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let starts = Rc::new(RefCell::new(Vec::new()));
        let mut compound = CompoundOperator::concatenate_restart(vec![
            TrackingOperator::boxed(0, 1, &log, &starts),
            TrackingOperator::boxed(1, 1, &log, &starts),
        ]);
        compound.start(&Assignment::new());
        drain(&mut compound);
        log.borrow_mut().clear();
        compound.start(&Assignment::new());
        drain(&mut compound);
        assert_eq!(*log.borrow(), vec![0, 1]);
    }

    #[test]
    fn test_compound_fairness_within_episode() {
        // Every sub-operator is queried at least once before any is
        // queried twice: with one candidate each, ids appear exactly once.
        let log = Rc::new(RefCell::new(Vec::new()));
        let starts = Rc::new(RefCell::new(Vec::new()));
        let mut compound = CompoundOperator::concatenate(vec![
            TrackingOperator::boxed(0, 1, &log, &starts),
            TrackingOperator::boxed(1, 1, &log, &starts),
            TrackingOperator::boxed(2, 1, &log, &starts),
        ]);
        compound.start(&Assignment::new());
        assert_eq!(drain(&mut compound), 3);
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
    }

    #[test]
    #[should_panic(expected = "no operators")]
    fn test_compound_empty_panics() {
        let _ = CompoundOperator::concatenate(Vec::new());
    }

    #[test]
    fn test_random_compound_queries_until_success() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let starts = Rc::new(RefCell::new(Vec::new()));
        let mut random = RandomCompoundOperator::with_seed(
            vec![
                TrackingOperator::boxed(0, 2, &log, &starts),
                TrackingOperator::boxed(1, 2, &log, &starts),
            ],
            42,
        );
        random.start(&Assignment::new());
        // Four candidates exist in total; the fifth query fails.
        assert_eq!(drain(&mut random), 4);
        assert_eq!(starts.borrow().len(), 2);
    }

    #[test]
    fn test_random_compound_is_repeatable_under_seed() {
        let run = |seed: u64| {
            let log = Rc::new(RefCell::new(Vec::new()));
            let starts = Rc::new(RefCell::new(Vec::new()));
            let mut random = RandomCompoundOperator::with_seed(
                vec![
                    TrackingOperator::boxed(0, 3, &log, &starts),
                    TrackingOperator::boxed(1, 3, &log, &starts),
                    TrackingOperator::boxed(2, 3, &log, &starts),
                ],
                seed,
            );
            random.start(&Assignment::new());
            drain(&mut random);
            let result = log.borrow().clone();
            result
        };
        assert_eq!(run(7), run(7));
    }

    #[test]
    fn test_neighborhood_limit_caps_calls_per_episode() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let starts = Rc::new(RefCell::new(Vec::new()));
        let mut limited =
            NeighborhoodLimit::new(TrackingOperator::boxed(0, 100, &log, &starts), 3);
        limited.start(&Assignment::new());
        assert_eq!(drain(&mut limited), 3);

        // A new episode re-arms the budget.
        limited.start(&Assignment::new());
        assert_eq!(drain(&mut limited), 3);
    }

    #[test]
    #[should_panic(expected = "zero limit")]
    fn test_neighborhood_limit_zero_panics() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let starts = Rc::new(RefCell::new(Vec::new()));
        let _ = NeighborhoodLimit::new(TrackingOperator::boxed(0, 1, &log, &starts), 0);
    }
}
