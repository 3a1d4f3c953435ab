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

//! The operator capability interface and the delta-emission state.
//!
//! An operator is a stateful generator of candidate neighbors. It is
//! started against a reference assignment, then queried repeatedly; each
//! successful query leaves a delta (and, for incremental operators, a
//! delta-of-delta) describing one candidate. Operators compose by
//! embedding: every integer operator carries an [`OperatorVars`] holding
//! staged values, activation flags and the dense change list, and path
//! operators additionally embed the cursor machinery of [`crate::path`].
//!
//! ## Lifecycle
//!
//! 1. **`start`**: Copies reference values and activations out of the
//!    assignment; resets any staged state from the previous episode.
//! 2. **`make_next_neighbor`**: Reverts the previous candidate
//!    (incremental-aware), stages one new candidate and emits it into the
//!    delta. Returns `false` on exhaustion with the operator back in the
//!    reference state.

use kedge_model::{assignment::Assignment, index::VarIndex};

use fixedbitset::FixedBitSet;

/// A stateful generator of candidate neighbors.
///
/// Combinators implement this trait directly; concrete operators embed
/// [`OperatorVars`] for the delta protocol and forward to it.
pub trait LocalSearchOperator {
    /// Returns the operator name for identification purposes.
    fn name(&self) -> &str;

    /// Synchronises the operator against a new reference assignment.
    ///
    /// # Panics
    ///
    /// Panics if `assignment` is smaller than the operator's variable set
    /// or does not contain one of its variables.
    fn start(&mut self, assignment: &Assignment);

    /// Stages the next candidate and emits it as a delta.
    ///
    /// When this returns `true`, `delta` exactly describes the candidate
    /// relative to the reference; when it returns `false`, the neighborhood
    /// is exhausted. The caller clears both buffers beforehand.
    fn make_next_neighbor(&mut self, delta: &mut Assignment, deltadelta: &mut Assignment) -> bool;

    /// Declares the semantics of the delta-of-delta buffer.
    ///
    /// Incremental operators extend the previous candidate instead of
    /// rebuilding it; for them `deltadelta` holds exactly the elements that
    /// changed since the previous emission.
    fn is_incremental(&self) -> bool {
        false
    }
}

impl std::fmt::Debug for dyn LocalSearchOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LocalSearchOperator {{ name: {} }}", self.name())
    }
}

impl std::fmt::Display for dyn LocalSearchOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Controls which staged-but-unchanged values are left out of the delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipPolicy {
    /// Emit every changed slot, even when the staged value equals the
    /// reference value.
    Never,

    /// Skip slots whose staged value equals the reference value.
    Unchanged,

    /// Skip an unchanged slot only if its paired slot (at distance
    /// `offset`) is unchanged too. Path operators pair each next variable
    /// with its route variable this way so that ternary filters always see
    /// both halves of a change.
    PairedUnchanged { offset: usize },
}

impl SkipPolicy {
    #[inline]
    fn skips(&self, vars: &OperatorVars, index: usize) -> bool {
        match *self {
            SkipPolicy::Never => false,
            SkipPolicy::Unchanged => true,
            SkipPolicy::PairedUnchanged { offset } => {
                let paired = if index < offset {
                    index + offset
                } else {
                    index - offset
                };
                vars.value(paired) == vars.old_value(paired)
            }
        }
    }
}

/// The delta-emission state shared by all integer operators.
///
/// For each tracked slot `i` the mixin holds the staged value and
/// activation next to their reference counterparts, plus membership bits
/// for the dense change list.
///
/// # Invariants
///
/// * `has_changed[i]` is `true` exactly for the slots in `changes`.
/// * After a non-incremental revert, staged state equals reference state,
///   `changes` is empty and `cleared` is set.
/// * The mixin borrows variables for the operator's lifetime; it never
///   owns them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorVars {
    vars: Vec<VarIndex>,
    values: Vec<i64>,
    old_values: Vec<i64>,
    activated: FixedBitSet,
    was_activated: FixedBitSet,
    has_changed: FixedBitSet,
    has_delta_changed: FixedBitSet,
    changes: Vec<usize>,
    cleared: bool,
}

impl OperatorVars {
    /// Creates the mixin over the given variables.
    pub fn new(vars: Vec<VarIndex>) -> Self {
        let size = vars.len();
        Self {
            vars,
            values: vec![0; size],
            old_values: vec![0; size],
            activated: FixedBitSet::with_capacity(size),
            was_activated: FixedBitSet::with_capacity(size),
            has_changed: FixedBitSet::with_capacity(size),
            has_delta_changed: FixedBitSet::with_capacity(size),
            changes: Vec::new(),
            cleared: true,
        }
    }

    /// Appends more variables; existing state is preserved.
    pub fn add_vars(&mut self, vars: &[VarIndex]) {
        let new_size = self.vars.len() + vars.len();
        self.vars.extend_from_slice(vars);
        self.values.resize(new_size, 0);
        self.old_values.resize(new_size, 0);
        self.activated.grow(new_size);
        self.was_activated.grow(new_size);
        self.has_changed.grow(new_size);
        self.has_delta_changed.grow(new_size);
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

    /// Returns the variable at slot `index`.
    #[inline]
    pub fn var(&self, index: usize) -> VarIndex {
        self.vars[index]
    }

    /// Returns the staged value at slot `index`.
    #[inline]
    pub fn value(&self, index: usize) -> i64 {
        self.values[index]
    }

    /// Returns the reference value at slot `index`.
    #[inline]
    pub fn old_value(&self, index: usize) -> i64 {
        self.old_values[index]
    }

    /// Returns the staged activation at slot `index`.
    #[inline]
    pub fn activated(&self, index: usize) -> bool {
        self.activated.contains(index)
    }

    /// Copies reference values and activations out of `assignment` and
    /// resets staged state for a fresh episode.
    ///
    /// # Panics
    ///
    /// Panics if the assignment has fewer elements than the operator has
    /// slots, or if an operator variable has no element.
    pub fn start_from(&mut self, assignment: &Assignment) {
        let container = assignment.int_container();
        assert!(
            self.vars.len() <= container.len(),
            "called `OperatorVars::start_from` with an assignment containing fewer variables than the operator: {} < {}",
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
                        "called `OperatorVars::start_from` with an assignment missing operator variable {}",
                        var
                    )
                })
            };
            let value = element.value();
            self.values[i] = value;
            self.old_values[i] = value;
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

    /// Stages `value` at slot `index`.
    #[inline]
    pub fn set_value(&mut self, index: usize, value: i64) {
        self.values[index] = value;
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

    /// Records slot `index` in the change list and the delta-change bits.
    pub fn mark_change(&mut self, index: usize) {
        if !self.has_delta_changed.contains(index) {
            self.has_delta_changed.set(index, true);
        }
        if !self.has_changed.contains(index) {
            self.changes.push(index);
            self.has_changed.set(index, true);
        }
    }

    /// Translates the staged changes into delta elements.
    ///
    /// Every changed slot is appended to `delta`, either deactivated or
    /// with its staged value; it is mirrored into `deltadelta` when the
    /// operator is incremental, the state has not been cleared since the
    /// last commit, and the slot changed since the last emission.
    pub fn apply_changes(
        &self,
        delta: &mut Assignment,
        deltadelta: &mut Assignment,
        is_incremental: bool,
        skip: SkipPolicy,
    ) {
        for &index in &self.changes {
            let var = self.vars[index];
            let value = self.values[index];
            let mirror =
                !self.cleared && self.has_delta_changed.contains(index) && is_incremental;
            if !self.activated.contains(index) {
                // Deactivated elements keep the reference value so the
                // sub-solver can fall back to it when completing.
                let old_value = self.old_values[index];
                if mirror {
                    let element = deltadelta.fast_add(var);
                    element.set_value(old_value);
                    element.deactivate();
                }
                let element = delta.fast_add(var);
                element.set_value(old_value);
                element.deactivate();
            } else if value != self.old_values[index] || !skip.skips(self, index) {
                if mirror {
                    deltadelta.fast_add(var).set_value(value);
                }
                delta.fast_add(var).set_value(value);
            }
        }
    }

    /// Reverts staged changes.
    ///
    /// With `incremental` set and an incremental operator, only the
    /// delta-change bits are cleared so the next candidate can extend the
    /// current one. Otherwise staged values and activations are restored
    /// from the reference and the change list is emptied.
    pub fn revert_changes(&mut self, incremental: bool, is_incremental: bool) {
        self.cleared = false;
        self.has_delta_changed.clear();
        if incremental && is_incremental {
            return;
        }
        self.cleared = true;
        for &i in &self.changes {
            self.values[i] = self.old_values[i];
            let was = self.was_activated.contains(i);
            self.activated.set(i, was);
            self.has_changed.set(i, false);
        }
        self.changes.clear();
    }

    /// Returns the slots staged for the current candidate.
    #[inline]
    pub fn changes(&self) -> &[usize] {
        &self.changes
    }
}
