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

//! Acceptance filters.
//!
//! Filters give a cheap verdict on a delta before the sub-solver is
//! consulted. They are synchronised against every new reference exactly
//! once, strictly before any `accept` call; incremental filters commit to
//! consuming every delta, including empty ones, in order.

use kedge_model::{assignment::Assignment, index::VarIndex, store::VariableStore};
use std::collections::{BTreeMap, HashMap};

/// Per-index contribution callback of the binary objective layout:
/// `evaluator(index, value)`. Must be repeatable.
pub type IndexEvaluator2 = Box<dyn Fn(usize, i64) -> i64>;

/// Per-index contribution callback of the ternary objective layout:
/// `evaluator(index, primary_value, secondary_value)`. Must be
/// repeatable.
pub type IndexEvaluator3 = Box<dyn Fn(usize, i64, i64) -> i64>;

/// A cheap accept/reject vote on candidate deltas.
pub trait LocalSearchFilter {
    /// Re-reads filter state from a new reference assignment.
    fn synchronize(&mut self, store: &VariableStore, assignment: &Assignment);

    /// Votes on a candidate delta.
    fn accept(
        &mut self,
        store: &VariableStore,
        delta: &Assignment,
        deltadelta: &Assignment,
    ) -> bool;

    /// Incremental filters must see every delta to stay coherent.
    fn is_incremental(&self) -> bool {
        false
    }
}

/// Rejects any delta element assigning a value outside its variable's
/// domain.
#[derive(Debug, Clone, Copy, Default)]
pub struct VariableDomainFilter;

impl LocalSearchFilter for VariableDomainFilter {
    fn synchronize(&mut self, _store: &VariableStore, _assignment: &Assignment) {}

    fn accept(
        &mut self,
        store: &VariableStore,
        delta: &Assignment,
        _deltadelta: &Assignment,
    ) -> bool {
        for element in delta.int_container().iter() {
            if element.activated() && !store.contains(element.var(), element.value()) {
                return false;
            }
        }
        true
    }
}

/// How the candidate objective value is compared against the bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundMode {
    /// Accept values at most the upper bound.
    Le,
    /// Accept values at least the lower bound.
    Ge,
    /// Accept values within both bounds.
    Eq,
}

/// How per-index contributions aggregate into the objective value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperation {
    Sum,
    Prod,
    Max,
    Min,
}

/// Running aggregation state for [`FilterOperation`].
///
/// Max/Min keep contributions in an ordered multiset so removals of stale
/// contributions stay exact.
enum OperationState {
    Sum {
        value: i64,
    },
    Prod {
        value: i64,
    },
    MaxMin {
        max: bool,
        values: BTreeMap<i64, usize>,
    },
}

impl OperationState {
    fn new(operation: FilterOperation) -> Self {
        match operation {
            FilterOperation::Sum => OperationState::Sum { value: 0 },
            FilterOperation::Prod => OperationState::Prod { value: 1 },
            FilterOperation::Max => OperationState::MaxMin {
                max: true,
                values: BTreeMap::new(),
            },
            FilterOperation::Min => OperationState::MaxMin {
                max: false,
                values: BTreeMap::new(),
            },
        }
    }

    fn init(&mut self) {
        match self {
            OperationState::Sum { value } => *value = 0,
            OperationState::Prod { value } => *value = 1,
            OperationState::MaxMin { values, .. } => values.clear(),
        }
    }

    fn update(&mut self, update: i64) {
        match self {
            OperationState::Sum { value } => *value += update,
            OperationState::Prod { value } => *value *= update,
            OperationState::MaxMin { values, .. } => {
                *values.entry(update).or_insert(0) += 1;
            }
        }
    }

    fn remove(&mut self, remove: i64) {
        match self {
            OperationState::Sum { value } => *value -= remove,
            OperationState::Prod { value } => {
                // Division by a zero contribution is special-cased away.
                if remove != 0 {
                    *value /= remove;
                }
            }
            OperationState::MaxMin { values, .. } => {
                if let Some(count) = values.get_mut(&remove) {
                    *count -= 1;
                    if *count == 0 {
                        values.remove(&remove);
                    }
                }
            }
        }
    }

    fn value(&self) -> i64 {
        match self {
            OperationState::Sum { value } | OperationState::Prod { value } => *value,
            OperationState::MaxMin { max, values } => {
                let extreme = if *max {
                    values.keys().next_back()
                } else {
                    values.keys().next()
                };
                extreme.copied().unwrap_or(0)
            }
        }
    }

    fn set_value(&mut self, new_value: i64) {
        match self {
            OperationState::Sum { value } | OperationState::Prod { value } => *value = new_value,
            // Max/Min carry their state in the multiset.
            OperationState::MaxMin { .. } => {}
        }
    }
}

/// Which contribution layout the objective filter evaluates.
enum ContributionLayout {
    /// `evaluator(index, value)`.
    Binary(IndexEvaluator2),
    /// `evaluator(index, primary, secondary)`; each primary variable is
    /// paired with the secondary variable at `index + primary_vars_size`.
    Ternary(IndexEvaluator3),
}

/// Accepts a delta when the objective value it induces stays within the
/// objective bounds.
///
/// The filter maintains one cached contribution per primary variable. A
/// full evaluation replays the delta against the reference cache; when the
/// delta-of-delta protocol is active, only the elements that changed since
/// the previous candidate are replayed against the delta cache.
pub struct ObjectiveFilter {
    vars: Vec<VarIndex>,
    var_to_index: HashMap<VarIndex, usize>,
    values: Vec<i64>,
    primary_vars_size: usize,
    cache: Vec<i64>,
    delta_cache: Vec<i64>,
    objective: VarIndex,
    bound_mode: BoundMode,
    op: OperationState,
    old_value: i64,
    old_delta_value: i64,
    incremental: bool,
    layout: ContributionLayout,
}

/// Creates a binary-layout objective filter.
pub fn make_objective_filter(
    vars: Vec<VarIndex>,
    evaluator: IndexEvaluator2,
    objective: VarIndex,
    bound_mode: BoundMode,
    operation: FilterOperation,
) -> ObjectiveFilter {
    ObjectiveFilter::new(
        vars,
        Vec::new(),
        objective,
        bound_mode,
        operation,
        ContributionLayout::Binary(evaluator),
    )
}

/// Creates a ternary-layout objective filter; `secondary_vars` pairs with
/// `vars` index by index.
pub fn make_ternary_objective_filter(
    vars: Vec<VarIndex>,
    secondary_vars: Vec<VarIndex>,
    evaluator: IndexEvaluator3,
    objective: VarIndex,
    bound_mode: BoundMode,
    operation: FilterOperation,
) -> ObjectiveFilter {
    assert_eq!(
        vars.len(),
        secondary_vars.len(),
        "called `make_ternary_objective_filter` with mismatched variable blocks: {} != {}",
        vars.len(),
        secondary_vars.len()
    );
    ObjectiveFilter::new(
        vars,
        secondary_vars,
        objective,
        bound_mode,
        operation,
        ContributionLayout::Ternary(evaluator),
    )
}

impl ObjectiveFilter {
    fn new(
        primary_vars: Vec<VarIndex>,
        secondary_vars: Vec<VarIndex>,
        objective: VarIndex,
        bound_mode: BoundMode,
        operation: FilterOperation,
        layout: ContributionLayout,
    ) -> Self {
        let primary_vars_size = primary_vars.len();
        let mut vars = primary_vars;
        vars.extend(secondary_vars);
        let var_to_index: HashMap<VarIndex, usize> =
            vars.iter().enumerate().map(|(i, &v)| (v, i)).collect();
        let mut op = OperationState::new(operation);
        op.init();
        let old_value = op.value();
        Self {
            values: vec![0; vars.len()],
            cache: vec![0; primary_vars_size],
            delta_cache: vec![0; primary_vars_size],
            vars,
            var_to_index,
            primary_vars_size,
            objective,
            bound_mode,
            op,
            old_value,
            old_delta_value: old_value,
            incremental: false,
            layout,
        }
    }

    /// Returns the current aggregated objective value.
    #[inline]
    pub fn objective_value(&self) -> i64 {
        self.op.value()
    }

    fn synchronized_element_value(&self, index: usize) -> i64 {
        match &self.layout {
            ContributionLayout::Binary(evaluator) => evaluator(index, self.values[index]),
            ContributionLayout::Ternary(evaluator) => evaluator(
                index,
                self.values[index],
                self.values[index + self.primary_vars_size],
            ),
        }
    }

    /// Evaluates the contribution of a delta element, following the layout.
    ///
    /// Returns `None` when the element is deactivated and its variable (or
    /// the paired secondary variable) is not bound in the store; such
    /// contributions are simply removed.
    fn evaluate_element_value(
        &self,
        store: &VariableStore,
        container: &Assignment,
        index: usize,
        container_index: &mut usize,
    ) -> Option<i64> {
        let ints = container.int_container();
        let element = ints.element(*container_index);
        match &self.layout {
            ContributionLayout::Binary(evaluator) => {
                if element.activated() {
                    Some(evaluator(index, element.value()))
                } else if store.bound(element.var()) {
                    Some(evaluator(index, store.min(element.var())))
                } else {
                    None
                }
            }
            ContributionLayout::Ternary(evaluator) => {
                let secondary_var = self.vars[index + self.primary_vars_size];
                if element.activated() {
                    let value = element.value();
                    let hint_index = *container_index + 1;
                    let secondary_value = if hint_index < ints.len()
                        && ints.element(hint_index).var() == secondary_var
                    {
                        *container_index = hint_index;
                        ints.element(hint_index).value()
                    } else if let Some(paired) = ints.element_for(secondary_var) {
                        paired.value()
                    } else {
                        // Not part of the delta: the synchronized value
                        // still holds.
                        self.values[index + self.primary_vars_size]
                    };
                    Some(evaluator(index, value, secondary_value))
                } else if store.bound(element.var()) && store.bound(secondary_var) {
                    Some(evaluator(
                        index,
                        store.min(element.var()),
                        store.min(secondary_var),
                    ))
                } else {
                    None
                }
            }
        }
    }

    fn evaluate(
        &mut self,
        store: &VariableStore,
        delta: &Assignment,
        current_value: i64,
        use_delta_cache: bool,
        cache_delta_values: bool,
    ) -> i64 {
        if current_value == i64::MAX {
            return current_value;
        }
        self.op.set_value(current_value);
        let size = delta.int_container().len();
        let mut i = 0;
        while i < size {
            let element = delta.int_container().element(i);
            if let Some(&index) = self.var_to_index.get(&element.var()) {
                if index < self.primary_vars_size {
                    let out_value = if use_delta_cache {
                        self.delta_cache[index]
                    } else {
                        self.cache[index]
                    };
                    self.op.remove(out_value);
                    if let Some(contribution) =
                        self.evaluate_element_value(store, delta, index, &mut i)
                    {
                        self.op.update(contribution);
                        if cache_delta_values {
                            self.delta_cache[index] = contribution;
                        }
                    }
                }
            }
            i += 1;
        }
        self.op.value()
    }
}

impl LocalSearchFilter for ObjectiveFilter {
    fn synchronize(&mut self, _store: &VariableStore, assignment: &Assignment) {
        for element in assignment.int_container().iter() {
            if let Some(&index) = self.var_to_index.get(&element.var()) {
                self.values[index] = element.value();
            }
        }
        self.op.init();
        for index in 0..self.primary_vars_size {
            let contribution = self.synchronized_element_value(index);
            self.cache[index] = contribution;
            self.delta_cache[index] = contribution;
            self.op.update(contribution);
        }
        self.old_value = self.op.value();
        self.old_delta_value = self.old_value;
        self.incremental = false;
    }

    fn accept(
        &mut self,
        store: &VariableStore,
        delta: &Assignment,
        deltadelta: &Assignment,
    ) -> bool {
        let value = if !deltadelta.is_empty() {
            let value = if !self.incremental {
                let old_value = self.old_value;
                self.evaluate(store, delta, old_value, false, true)
            } else {
                let old_delta_value = self.old_delta_value;
                self.evaluate(store, deltadelta, old_delta_value, true, true)
            };
            self.incremental = true;
            value
        } else {
            if self.incremental {
                self.delta_cache.copy_from_slice(&self.cache);
                self.old_delta_value = self.old_value;
            }
            self.incremental = false;
            let old_value = self.old_value;
            self.evaluate(store, delta, old_value, false, false)
        };
        self.old_delta_value = value;

        let mut var_min = store.min(self.objective);
        let mut var_max = store.max(self.objective);
        if delta.objective_var() == Some(self.objective) {
            var_min = var_min.max(delta.objective_min());
            var_max = var_max.min(delta.objective_max());
        }
        match self.bound_mode {
            BoundMode::Le => value <= var_max,
            BoundMode::Ge => value >= var_min,
            BoundMode::Eq => value >= var_min && value <= var_max,
        }
    }

    fn is_incremental(&self) -> bool {
        true
    }
}

/// Builds the stock filter for an operation/bound pair, mirroring the
/// enum-driven construction hosts use.
pub fn make_local_search_objective_filter(
    vars: Vec<VarIndex>,
    evaluator: IndexEvaluator2,
    objective: VarIndex,
    bound_mode: BoundMode,
    operation: FilterOperation,
) -> Box<dyn LocalSearchFilter> {
    Box::new(make_objective_filter(
        vars, evaluator, objective, bound_mode, operation,
    ))
}

/// Runs a delta through filters the way the driver does: incremental
/// filters are always consulted, non-incremental ones are short-circuited.
pub fn filters_accept(
    filters: &mut [Box<dyn LocalSearchFilter>],
    store: &VariableStore,
    delta: &Assignment,
    deltadelta: &Assignment,
) -> bool {
    let mut ok = true;
    for filter in filters.iter_mut() {
        if filter.is_incremental() {
            ok = filter.accept(store, delta, deltadelta) && ok;
        } else {
            ok = ok && filter.accept(store, delta, deltadelta);
        }
    }
    ok
}
