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

//! # Search Monitoring Interface
//!
//! A callback interface for observing and steering a local-search run.
//! Monitors receive lifecycle hooks (search entry and exit, committed
//! solutions, a per-iteration heartbeat) and can request cooperative
//! termination through `search_command`. The stream of progressively better
//! solutions the driver produces is surfaced exclusively through this
//! interface; the driver itself emits no output.

use kedge_model::assignment::Assignment;

use crate::stats::SearchStatistics;

/// Control signal a monitor emits when polled.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub enum SearchCommand {
    #[default]
    Continue,
    Terminate(String),
}

impl std::fmt::Display for SearchCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchCommand::Continue => write!(f, "Continue"),
            SearchCommand::Terminate(reason) => write!(f, "Terminate: {}", reason),
        }
    }
}

/// Lifecycle hooks for observing a local-search run.
pub trait SearchMonitor {
    /// Returns the monitor name for identification purposes.
    fn name(&self) -> &str;

    /// Called once before the first neighbor attempt.
    fn on_enter_search(&mut self) {}

    /// Called once after the search has terminated.
    fn on_exit_search(&mut self) {}

    /// Called whenever the driver commits an improved assignment.
    fn on_solution_found(&mut self, _solution: &Assignment, _stats: &SearchStatistics) {}

    /// Periodic heartbeat from the driver loop.
    fn on_step(&mut self) {}

    /// Polled at the heartbeat; returning `Terminate` aborts the search.
    fn search_command(&mut self, _stats: &SearchStatistics) -> SearchCommand {
        SearchCommand::Continue
    }
}

impl std::fmt::Debug for dyn SearchMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SearchMonitor({})", self.name())
    }
}

/// A monitor that observes nothing and never terminates the search.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMonitor;

impl SearchMonitor for NullMonitor {
    fn name(&self) -> &str {
        "NullMonitor"
    }
}
