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

//! Enum-driven construction of the stock operators.
//!
//! Hosts that configure the search by name get the standard operator
//! library through these factories. An unknown combination, such as a
//! value operator with route variables, is a configuration error and
//! panics.

use crate::{
    compound::CompoundOperator,
    config::LocalSearchConfig,
    lns::SimpleLns,
    operator::LocalSearchOperator,
    path::{
        active::{
            ExtendedSwapActiveOperator, MakeActiveOperator, MakeInactiveOperator,
            SwapActiveOperator,
        },
        cross::Cross,
        exchange::Exchange,
        lin_kernighan::LinKernighan,
        path_lns::PathLns,
        relocate::Relocate,
        tsp::{TspLns, TspOpt},
        two_opt::TwoOpt,
        PathEvaluator,
    },
    value::ChangeValue,
};
use kedge_model::{index::VarIndex, store::VariableStore};

/// The stock operators constructible without an evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    TwoOpt,
    OrOpt,
    Relocate,
    Exchange,
    Cross,
    MakeActive,
    MakeInactive,
    SwapActive,
    ExtendedSwapActive,
    PathLns,
    UnactiveLns,
    Increment,
    Decrement,
    SimpleLns,
}

/// The stock operators requiring an arc-cost evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluatorOperatorKind {
    Lk,
    TspOpt,
    TspLns,
}

fn route_vars(secondary_vars: &[VarIndex]) -> Option<Vec<VarIndex>> {
    if secondary_vars.is_empty() {
        None
    } else {
        Some(secondary_vars.to_vec())
    }
}

fn reject_secondary(kind: OperatorKind, secondary_vars: &[VarIndex]) {
    assert!(
        secondary_vars.is_empty(),
        "called `make_operator` with secondary variables for {:?}, which does not support them",
        kind
    );
}

/// Builds a stock operator over `vars` (and route variables, where the
/// operator supports them).
pub fn make_operator(
    vars: &[VarIndex],
    secondary_vars: &[VarIndex],
    kind: OperatorKind,
) -> Box<dyn LocalSearchOperator> {
    let next = vars.to_vec();
    let paths = route_vars(secondary_vars);
    match kind {
        OperatorKind::TwoOpt => Box::new(TwoOpt::new(next, paths)),
        OperatorKind::OrOpt => {
            let operators: Vec<Box<dyn LocalSearchOperator>> = (1..4)
                .map(|chain_length| {
                    Box::new(Relocate::new(next.clone(), paths.clone(), chain_length, true))
                        as Box<dyn LocalSearchOperator>
                })
                .collect();
            Box::new(CompoundOperator::concatenate(operators))
        }
        OperatorKind::Relocate => Box::new(Relocate::new(next, paths, 1, false)),
        OperatorKind::Exchange => Box::new(Exchange::new(next, paths)),
        OperatorKind::Cross => Box::new(Cross::new(next, paths)),
        OperatorKind::MakeActive => Box::new(MakeActiveOperator::new(next, paths)),
        OperatorKind::MakeInactive => Box::new(MakeInactiveOperator::new(next, paths)),
        OperatorKind::SwapActive => Box::new(SwapActiveOperator::new(next, paths)),
        OperatorKind::ExtendedSwapActive => {
            Box::new(ExtendedSwapActiveOperator::new(next, paths))
        }
        OperatorKind::PathLns => Box::new(PathLns::new(next, paths, 2, 3, false)),
        OperatorKind::UnactiveLns => Box::new(PathLns::new(next, paths, 1, 6, true)),
        OperatorKind::Increment => {
            reject_secondary(kind, secondary_vars);
            Box::new(ChangeValue::increment(next))
        }
        OperatorKind::Decrement => {
            reject_secondary(kind, secondary_vars);
            Box::new(ChangeValue::decrement(next))
        }
        OperatorKind::SimpleLns => {
            reject_secondary(kind, secondary_vars);
            Box::new(SimpleLns::new(next, 1))
        }
    }
}

/// Builds an evaluator-based stock operator.
///
/// The Lin–Kernighan entry concatenates the pure 2-opt-chaining variant
/// with the 3-opt-opener variant, both sharing the evaluator.
pub fn make_evaluator_operator(
    vars: &[VarIndex],
    secondary_vars: &[VarIndex],
    store: &VariableStore,
    evaluator: PathEvaluator,
    kind: EvaluatorOperatorKind,
    config: &LocalSearchConfig,
    seed: u64,
) -> Box<dyn LocalSearchOperator> {
    let next = vars.to_vec();
    let paths = route_vars(secondary_vars);
    match kind {
        EvaluatorOperatorKind::Lk => {
            let operators: Vec<Box<dyn LocalSearchOperator>> = vec![
                Box::new(LinKernighan::new(
                    next.clone(),
                    paths.clone(),
                    store,
                    evaluator.clone(),
                    false,
                )),
                Box::new(LinKernighan::new(next, paths, store, evaluator, true)),
            ];
            Box::new(CompoundOperator::concatenate(operators))
        }
        EvaluatorOperatorKind::TspOpt => Box::new(TspOpt::with_held_karp(
            next,
            paths,
            evaluator,
            config.tsp_opt_size,
        )),
        EvaluatorOperatorKind::TspLns => Box::new(TspLns::with_seed(
            next,
            paths,
            evaluator,
            config.tsp_lns_size,
            seed,
        )),
    }
}
