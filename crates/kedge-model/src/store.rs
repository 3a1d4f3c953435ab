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

//! The variable table.
//!
//! `VariableStore` is the local stand-in for the host solver's variable
//! registry: a dense map from [`VarIndex`] to [`Domain`]. The driver owns
//! the store and passes it by reference into filters and sub-solvers; no
//! component holds global state.

use crate::{domain::Domain, index::VarIndex};

/// A dense registry of decision variables and their domains.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct VariableStore {
    domains: Vec<Domain>,
}

impl VariableStore {
    /// Creates an empty store.
    #[inline]
    pub fn new() -> Self {
        Self {
            domains: Vec::new(),
        }
    }

    /// Registers a variable with the given domain and returns its handle.
    #[inline]
    pub fn add_var(&mut self, domain: Domain) -> VarIndex {
        let index = VarIndex::new(self.domains.len());
        self.domains.push(domain);
        index
    }

    /// Registers `n` variables sharing the same domain, returning their handles.
    pub fn add_vars(&mut self, n: usize, domain: Domain) -> Vec<VarIndex> {
        (0..n).map(|_| self.add_var(domain.clone())).collect()
    }

    /// Returns the number of registered variables.
    #[inline]
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    /// Returns `true` if no variable has been registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Returns the domain of `var`.
    ///
    /// # Panics
    ///
    /// Panics if `var` is not a handle issued by this store.
    #[inline]
    pub fn domain(&self, var: VarIndex) -> &Domain {
        debug_assert!(
            var.get() < self.domains.len(),
            "called `VariableStore::domain` with a foreign handle: the len is {} but the index is {}",
            self.domains.len(),
            var.get()
        );
        &self.domains[var.get()]
    }

    /// Returns the smallest value in the domain of `var`.
    #[inline]
    pub fn min(&self, var: VarIndex) -> i64 {
        self.domain(var).min()
    }

    /// Returns the largest value in the domain of `var`.
    #[inline]
    pub fn max(&self, var: VarIndex) -> i64 {
        self.domain(var).max()
    }

    /// Returns `true` if `v` is in the domain of `var`.
    #[inline]
    pub fn contains(&self, var: VarIndex, v: i64) -> bool {
        self.domain(var).contains(v)
    }

    /// Returns `true` if the domain of `var` is a single value.
    #[inline]
    pub fn bound(&self, var: VarIndex) -> bool {
        self.domain(var).bound()
    }
}
