//! Compile run metrics.
//!
//! Collected only by [`crate::Engine::compile_verbose`]; the plain compile
//! path never allocates them. Passes that did not run (gated off by flags,
//! missing record/store) are not recorded.

use std::time::Duration;

#[derive(Debug, Default, Clone)]
pub struct RunMetrics {
    /// Every executed pass, in completion order: a pass that triggered nested
    /// compiles is recorded after the passes of those compiles.
    pub passes: Vec<PassMetrics>,
    /// Set when a branch was cut off at the recursion ceiling.
    pub recursion_limit_hit: bool,
}

/// Timing for a single pass at a given recursion depth.
#[derive(Debug, Clone)]
pub struct PassMetrics {
    pub name: &'static str,
    pub depth: usize,
    pub duration: Duration,
    /// Whether the pass changed the working string.
    pub changed: bool,
}
