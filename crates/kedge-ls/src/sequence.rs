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

//! The delta-emission state for sequence variables.
//!
//! Sequence operators stage whole orderings instead of single values: each
//! slot holds a staged forward ordering, an optional staged backward
//! ordering, and the reference ordering it started from. The change
//! protocol is the same as [`crate::operator::OperatorVars`]; emitted
//! elements carry both orderings.

use kedge_model::{assignment::Assignment, index::VarIndex};

use fixedbitset::FixedBitSet;

/// The delta-emission state shared by sequence operators.
///
/// # Invariants
///
/// The invariants of [`crate::operator::OperatorVars`] apply unchanged;
/// backward orderings are cleared on start and on every full revert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceOperatorVars {
    vars: Vec<VarIndex>,
    values: Vec<Vec<usize>>,
    backward_values: Vec<Vec<usize>>,
    old_values: Vec<Vec<usize>>,
    activated: FixedBitSet,
    was_activated: FixedBitSet,
    has_changed: FixedBitSet,
    has_delta_changed: FixedBitSet,
    changes: Vec<usize>,
    cleared: bool,
}

impl SequenceOperatorVars {
    /// Creates the mixin over the given sequence variables.
    pub fn new(vars: Vec<VarIndex>) -> Self {
        let size = vars.len();
        Self {
            vars,
            values: vec![Vec::new(); size],
            backward_values: vec![Vec::new(); size],
            old_values: vec![Vec::new(); size],
            activated: FixedBitSet::with_capacity(size),
            was_activated: FixedBitSet::with_capacity(size),
            has_changed: FixedBitSet::with_capacity(size),
            has_delta_changed: FixedBitSet::with_capacity(size),
            changes: Vec::new(),
            cleared: true,
        }
    }

    /// Returns the number of tracked slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Returns `true` if no slot is tracked.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Returns the staged forward ordering at slot `index`.
    #[inline]
    pub fn sequence(&self, index: usize) -> &[usize] {
        &self.values[index]
    }

    /// Returns the reference ordering at slot `index`.
    #[inline]
    pub fn old_sequence(&self, index: usize) -> &[usize] {
        &self.old_values[index]
    }

    /// Copies reference orderings and activations out of `assignment`.
    ///
    /// # Panics
    ///
    /// Panics if the assignment has fewer sequence elements than the
    /// operator has slots, or if an operator variable has no element.
    pub fn start_from(&mut self, assignment: &Assignment) {
        let container = assignment.sequence_container();
        assert!(
            self.vars.len() <= container.len(),
            "called `SequenceOperatorVars::start_from` with an assignment containing fewer sequence variables than the operator: {} < {}",
            container.len(),
            self.vars.len()
        );
        for i in 0..self.vars.len() {
            let var = self.vars[i];
            let indexed = container.element(i);
            let element = if indexed.var() == var {
                indexed
            } else {
                container.element_for(var).unwrap_or_else(|| {
                    panic!(
                        "called `SequenceOperatorVars::start_from` with an assignment missing operator variable {}",
                        var
                    )
                })
            };
            self.values[i] = element.forward_sequence().to_vec();
            self.backward_values[i].clear();
            self.old_values[i] = element.forward_sequence().to_vec();
            let activated = element.activated();
            self.activated.set(i, activated);
            self.was_activated.set(i, activated);
        }
        for &i in &self.changes {
            self.has_changed.set(i, false);
        }
        self.changes.clear();
        self.has_delta_changed.clear();
        self.cleared = true;
    }

    /// Stages a forward ordering at slot `index`.
    pub fn set_forward_sequence(&mut self, index: usize, sequence: Vec<usize>) {
        self.values[index] = sequence;
        self.mark_change(index);
    }

    /// Stages a backward ordering at slot `index`.
    pub fn set_backward_sequence(&mut self, index: usize, sequence: Vec<usize>) {
        self.backward_values[index] = sequence;
        self.mark_change(index);
    }

    /// Stages activation of slot `index`.
    #[inline]
    pub fn activate(&mut self, index: usize) {
        self.activated.set(index, true);
        self.mark_change(index);
    }

    /// Stages deactivation of slot `index`.
    #[inline]
    pub fn deactivate(&mut self, index: usize) {
        self.activated.set(index, false);
        self.mark_change(index);
    }

    fn mark_change(&mut self, index: usize) {
        if !self.has_delta_changed.contains(index) {
            self.has_delta_changed.set(index, true);
        }
        if !self.has_changed.contains(index) {
            self.changes.push(index);
            self.has_changed.set(index, true);
        }
    }

    /// Translates staged ordering changes into sequence delta elements.
    pub fn apply_changes(
        &self,
        delta: &mut Assignment,
        deltadelta: &mut Assignment,
        is_incremental: bool,
    ) {
        for &index in &self.changes {
            let var = self.vars[index];
            let mirror =
                !self.cleared && self.has_delta_changed.contains(index) && is_incremental;
            if !self.activated.contains(index) {
                if mirror {
                    deltadelta.fast_add_sequence(var).deactivate();
                }
                delta.fast_add_sequence(var).deactivate();
            } else if self.values[index] != self.old_values[index] {
                if mirror {
                    let element = deltadelta.fast_add_sequence(var);
                    element.set_forward_sequence(self.values[index].clone());
                    element.set_backward_sequence(self.backward_values[index].clone());
                }
                let element = delta.fast_add_sequence(var);
                element.set_forward_sequence(self.values[index].clone());
                element.set_backward_sequence(self.backward_values[index].clone());
            }
        }
    }

    /// Reverts staged changes; see `OperatorVars::revert_changes`.
    pub fn revert_changes(&mut self, incremental: bool, is_incremental: bool) {
        self.cleared = false;
        self.has_delta_changed.clear();
        if incremental && is_incremental {
            return;
        }
        self.cleared = true;
        for &i in &self.changes {
            self.values[i] = self.old_values[i].clone();
            self.backward_values[i].clear();
            let was = self.was_activated.contains(i);
            self.activated.set(i, was);
            self.has_changed.set(i, false);
        }
        self.changes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(sequences: &[&[usize]]) -> Assignment {
        let mut a = Assignment::new();
        for (i, seq) in sequences.iter().enumerate() {
            a.add_sequence(VarIndex::new(i))
                .set_forward_sequence(seq.to_vec());
        }
        a
    }

    #[test]
    fn test_start_from_copies_orderings() {
        let mut state = SequenceOperatorVars::new(vec![VarIndex::new(0), VarIndex::new(1)]);
        state.start_from(&reference(&[&[0, 1, 2], &[2, 0, 1]]));
        assert_eq!(state.sequence(0), &[0, 1, 2]);
        assert_eq!(state.old_sequence(1), &[2, 0, 1]);
    }

    #[test]
    fn test_apply_changes_carries_both_orderings() {
        let mut state = SequenceOperatorVars::new(vec![VarIndex::new(0)]);
        state.start_from(&reference(&[&[0, 1, 2]]));
        state.set_forward_sequence(0, vec![2, 1, 0]);
        state.set_backward_sequence(0, vec![0, 1, 2]);

        let mut delta = Assignment::new();
        let mut deltadelta = Assignment::new();
        state.apply_changes(&mut delta, &mut deltadelta, false);

        let element = delta
            .sequence_container()
            .element_for(VarIndex::new(0))
            .unwrap();
        assert_eq!(element.forward_sequence(), &[2, 1, 0]);
        assert_eq!(element.backward_sequence(), &[0, 1, 2]);
    }

    #[test]
    fn test_unchanged_ordering_is_not_emitted() {
        let mut state = SequenceOperatorVars::new(vec![VarIndex::new(0)]);
        state.start_from(&reference(&[&[0, 1]]));
        state.set_forward_sequence(0, vec![0, 1]);

        let mut delta = Assignment::new();
        let mut deltadelta = Assignment::new();
        state.apply_changes(&mut delta, &mut deltadelta, false);
        assert!(delta.is_empty());
    }

    #[test]
    fn test_revert_restores_reference() {
        let mut state = SequenceOperatorVars::new(vec![VarIndex::new(0)]);
        state.start_from(&reference(&[&[3, 4]]));
        let pristine = state.clone();

        state.set_forward_sequence(0, vec![4, 3]);
        state.deactivate(0);
        state.revert_changes(false, false);
        assert_eq!(state, pristine);
    }

    #[test]
    fn test_deactivation_emitted_as_deactivated_element() {
        let mut state = SequenceOperatorVars::new(vec![VarIndex::new(0)]);
        state.start_from(&reference(&[&[1, 0]]));
        state.deactivate(0);

        let mut delta = Assignment::new();
        let mut deltadelta = Assignment::new();
        state.apply_changes(&mut delta, &mut deltadelta, false);
        let element = delta
            .sequence_container()
            .element_for(VarIndex::new(0))
            .unwrap();
        assert!(!element.activated());
    }
}
