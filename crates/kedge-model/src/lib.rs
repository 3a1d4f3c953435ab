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

//! # Kedge Model
//!
//! **The data interchange layer of the Kedge local-search core.**
//!
//! This crate defines the structures a host constraint solver hands to the
//! local search: decision-variable handles, their domains, and assignments.
//! An assignment is both the full solution container the driver improves and
//! the *delta* vehicle of the neighbor protocol: a candidate neighbor is an
//! assignment subset describing changes against a reference.
//!
//! ## Architecture
//!
//! * **`index`**: Strongly-typed variable handles (`VarIndex`).
//! * **`domain`**: Integer domains as sorted interval unions.
//! * **`store`**: The `VariableStore`, mapping handles to domains; stands in
//!   for the host solver's variable table.
//! * **`assignment`**: Insertion-ordered element containers for integer and
//!   sequence variables, with activation flags, overlay application and
//!   objective metadata.

pub mod assignment;
pub mod domain;
pub mod index;
pub mod store;
