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

//! Driver configuration.

/// Tunables of the local-search driver and the stock operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalSearchConfig {
    /// Neighbor attempts between two pool-synchronisation polls.
    pub sync_frequency: u64,

    /// Window length of the sliding exact-TSP operator.
    pub tsp_opt_size: usize,

    /// Meta-node count of the TSP large-neighborhood operator.
    pub tsp_lns_size: usize,

    /// Depth up to which the phase emits balancing decisions before
    /// nested solves proceed.
    pub balanced_tree_depth: u32,
}

impl Default for LocalSearchConfig {
    fn default() -> Self {
        Self {
            sync_frequency: 16,
            tsp_opt_size: 13,
            tsp_lns_size: 10,
            balanced_tree_depth: 32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LocalSearchConfig::default();
        assert_eq!(config.sync_frequency, 16);
        assert_eq!(config.tsp_opt_size, 13);
        assert_eq!(config.tsp_lns_size, 10);
        assert_eq!(config.balanced_tree_depth, 32);
    }
}
