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

//! Value-sweep operators.
//!
//! These operators perturb one variable per candidate. `ChangeValue`
//! sweeps the variable set once per episode, rewriting each value through a
//! modifier function; `MoveTowardTarget` rotates a cursor over the
//! variables, assigning one variable its target value per candidate.

use crate::operator::{LocalSearchOperator, OperatorVars, SkipPolicy};
use kedge_model::{assignment::Assignment, index::VarIndex};

/// Sweeps all variables once, staging `modify(index, value)` per candidate.
pub struct ChangeValue {
    vars: OperatorVars,
    index: usize,
    modify: Box<dyn Fn(usize, i64) -> i64>,
    name: &'static str,
}

impl ChangeValue {
    /// Creates a sweep operator with an arbitrary modifier.
    pub fn new(
        vars: Vec<VarIndex>,
        modify: Box<dyn Fn(usize, i64) -> i64>,
        name: &'static str,
    ) -> Self {
        Self {
            vars: OperatorVars::new(vars),
            index: 0,
            modify,
            name,
        }
    }

    /// Creates the operator that increments each value by one.
    pub fn increment(vars: Vec<VarIndex>) -> Self {
        Self::new(vars, Box::new(|_, value| value + 1), "IncrementValue")
    }

    /// Creates the operator that decrements each value by one.
    pub fn decrement(vars: Vec<VarIndex>) -> Self {
        Self::new(vars, Box::new(|_, value| value - 1), "DecrementValue")
    }
}

impl LocalSearchOperator for ChangeValue {
    fn name(&self) -> &str {
        self.name
    }

    fn start(&mut self, assignment: &Assignment) {
        self.vars.start_from(assignment);
        self.index = 0;
    }

    fn make_next_neighbor(&mut self, delta: &mut Assignment, deltadelta: &mut Assignment) -> bool {
        self.vars.revert_changes(true, false);
        if self.index >= self.vars.len() {
            return false;
        }
        let value = (self.modify)(self.index, self.vars.value(self.index));
        self.vars.set_value(self.index, value);
        self.index += 1;
        self.vars
            .apply_changes(delta, deltadelta, false, SkipPolicy::Never);
        true
    }
}

/// Compares the reference against a target assignment and emits one
/// variable-to-target change per candidate.
///
/// The cursor deliberately survives `start`: restarting the scan at index
/// zero after every accepted neighbor would regenerate Θ(n²) candidates
/// when only the not-yet-visited variables can still move to their target.
pub struct MoveTowardTarget {
    vars: OperatorVars,
    target: Vec<i64>,
    variable_index: usize,
    num_var_since_last_start: usize,
}

impl MoveTowardTarget {
    /// Creates the operator from parallel variable and target lists.
    ///
    /// # Panics
    ///
    /// Panics if the lists differ in length or are empty.
    pub fn new(vars: Vec<VarIndex>, target: Vec<i64>) -> Self {
        assert_eq!(
            vars.len(),
            target.len(),
            "called `MoveTowardTarget::new` with mismatched variable and target lengths: {} != {}",
            vars.len(),
            target.len()
        );
        assert!(
            !vars.is_empty(),
            "called `MoveTowardTarget::new` with no variables"
        );
        let size = vars.len();
        Self {
            vars: OperatorVars::new(vars),
            target,
            // Start one slot before the end so the first advance lands on
            // index zero.
            variable_index: size - 1,
            num_var_since_last_start: 0,
        }
    }

    /// Creates the operator from a target assignment, taking its variables
    /// and values in element order.
    pub fn from_assignment(target: &Assignment) -> Self {
        let mut vars = Vec::with_capacity(target.int_container().len());
        let mut values = Vec::with_capacity(target.int_container().len());
        for element in target.int_container().iter() {
            vars.push(element.var());
            values.push(element.value());
        }
        Self::new(vars, values)
    }
}

impl LocalSearchOperator for MoveTowardTarget {
    fn name(&self) -> &str {
        "MoveTowardTarget"
    }

    fn start(&mut self, assignment: &Assignment) {
        self.vars.start_from(assignment);
        self.num_var_since_last_start = 0;
    }

    fn make_next_neighbor(&mut self, delta: &mut Assignment, deltadelta: &mut Assignment) -> bool {
        self.vars.revert_changes(true, false);
        let size = self.vars.len();
        while self.num_var_since_last_start < size {
            self.num_var_since_last_start += 1;
            self.variable_index = (self.variable_index + 1) % size;
            let target_value = self.target[self.variable_index];
            let current_value = self.vars.old_value(self.variable_index);
            if current_value != target_value {
                self.vars.set_value(self.variable_index, target_value);
                self.vars
                    .apply_changes(delta, deltadelta, false, SkipPolicy::Never);
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(values: &[i64]) -> Assignment {
        let mut a = Assignment::new();
        for (i, &v) in values.iter().enumerate() {
            a.add(VarIndex::new(i)).set_value(v);
        }
        a
    }

    fn collect_deltas(op: &mut dyn LocalSearchOperator) -> Vec<Vec<(usize, i64)>> {
        let mut out = Vec::new();
        let mut delta = Assignment::new();
        let mut deltadelta = Assignment::new();
        loop {
            delta.clear();
            deltadelta.clear();
            if !op.make_next_neighbor(&mut delta, &mut deltadelta) {
                break;
            }
            out.push(
                delta
                    .int_container()
                    .iter()
                    .map(|e| (e.var().get(), e.value()))
                    .collect(),
            );
        }
        out
    }

    #[test]
    fn test_increment_sweeps_each_variable_once() {
        let mut op = ChangeValue::increment((0..3).map(VarIndex::new).collect());
        op.start(&reference(&[10, 20, 30]));
        let deltas = collect_deltas(&mut op);
        assert_eq!(
            deltas,
            vec![vec![(0, 11)], vec![(1, 21)], vec![(2, 31)]]
        );
    }

    #[test]
    fn test_decrement_modifier() {
        let mut op = ChangeValue::decrement(vec![VarIndex::new(0)]);
        op.start(&reference(&[5]));
        let deltas = collect_deltas(&mut op);
        assert_eq!(deltas, vec![vec![(0, 4)]]);
    }

    #[test]
    fn test_change_value_restarts_on_start() {
        let mut op = ChangeValue::increment(vec![VarIndex::new(0), VarIndex::new(1)]);
        op.start(&reference(&[0, 0]));
        assert_eq!(collect_deltas(&mut op).len(), 2);
        op.start(&reference(&[0, 0]));
        assert_eq!(collect_deltas(&mut op).len(), 2);
    }

    #[test]
    fn test_move_toward_target_emits_differing_variables() {
        // Current [0,0,0,0], target [1,0,1,0]: exactly vars 0 and 2 move.
        let mut op = MoveTowardTarget::new(
            (0..4).map(VarIndex::new).collect(),
            vec![1, 0, 1, 0],
        );
        op.start(&reference(&[0, 0, 0, 0]));
        let deltas = collect_deltas(&mut op);
        assert_eq!(deltas, vec![vec![(0, 1)], vec![(2, 1)]]);
    }

    #[test]
    fn test_move_toward_target_cursor_survives_start() {
        let mut op = MoveTowardTarget::new(
            (0..4).map(VarIndex::new).collect(),
            vec![1, 0, 1, 0],
        );
        op.start(&reference(&[0, 0, 0, 0]));

        let mut delta = Assignment::new();
        let mut deltadelta = Assignment::new();
        assert!(op.make_next_neighbor(&mut delta, &mut deltadelta));
        assert_eq!(delta.value(VarIndex::new(0)), Some(1));

        // Accepting the first move and restarting must continue from the
        // cursor position rather than rescanning variable 0.
        op.start(&reference(&[1, 0, 0, 0]));
        delta.clear();
        deltadelta.clear();
        assert!(op.make_next_neighbor(&mut delta, &mut deltadelta));
        assert_eq!(delta.value(VarIndex::new(2)), Some(1));
    }

    #[test]
    #[should_panic(expected = "mismatched variable and target lengths")]
    fn test_move_toward_target_length_mismatch_panics() {
        let _ = MoveTowardTarget::new(vec![VarIndex::new(0)], vec![1, 2]);
    }

    #[test]
    fn test_from_assignment_takes_element_order() {
        let mut target = Assignment::new();
        target.add(VarIndex::new(1)).set_value(5);
        target.add(VarIndex::new(0)).set_value(6);
        let mut op = MoveTowardTarget::from_assignment(&target);

        let mut reference = Assignment::new();
        reference.add(VarIndex::new(1)).set_value(0);
        reference.add(VarIndex::new(0)).set_value(0);
        op.start(&reference);

        let deltas = collect_deltas(&mut op);
        assert_eq!(deltas, vec![vec![(1, 5)], vec![(0, 6)]]);
    }
}
