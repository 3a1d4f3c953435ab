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

//! # Kedge LS
//!
//! The local-search core: neighborhood operators over integer and sequence
//! assignments, an incremental delta protocol, acceptance filters, and the
//! driver that alternates neighbor generation, filtering and nested
//! verification solves until a local optimum or a limit is hit.
//!
//! ## Architecture
//!
//! The crate is organised in layers, leaves first:
//!
//! * **`operator`**: The `LocalSearchOperator` capability interface and the
//!   delta-emission state every integer operator embeds (`sequence` holds
//!   the sequence-variable counterpart).
//! * **`value`**, **`lns`**: Variable-sweep operators and plain large
//!   neighborhood search.
//! * **`path`**: The path-cursor machinery and the routing operator family
//!   (2-opt, relocation, exchange, cross, activation moves, path LNS,
//!   exact-TSP re-optimisation, Lin–Kernighan).
//! * **`compound`**: Operator combinators: ranked concatenation, random
//!   dispatch, neighborhood limits.
//! * **`filter`**: Cheap accept/reject on deltas before the sub-solver is
//!   consulted.
//! * **`driver`**, **`decision`**, **`phase`**, **`pool`**, **`meta`**: The
//!   `FindOneNeighbor` loop, the nested-solve latch, the phase builder, the
//!   solution pool and the metaheuristic hook.
//! * **`factory`**: Enum-driven construction of the stock operators and
//!   filters for hosts that configure by name.

pub mod compound;
pub mod config;
pub mod decision;
pub mod driver;
pub mod factory;
pub mod filter;
pub mod lns;
pub mod meta;
pub mod operator;
pub mod path;
pub mod phase;
pub mod pool;
pub mod result;
pub mod sequence;
pub mod value;
