//! Per-run parser configuration.
//!
//! The reference implementation reads these values off a process-wide `Config()` singleton.
//! That doesn't fit a library that may run many parses concurrently (e.g. one per worker
//! thread, each training against a different ratio cap), so here they're a plain value threaded
//! through every [`crate::state::State`] constructor instead.

/// Tunables for one parse.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Options {
    /// When `true`, [`crate::state::State`] re-checks invariants that are expensive enough to
    /// skip in a hot inference loop: duplicate-node/duplicate-edge detection, cycle detection on
    /// every edge insertion, and the post-transition stack/buffer disjointness check.
    pub verify: bool,
    /// When `true`, a fixed gold terminal tag mismatch during [`crate::state::State::create_passage`]
    /// is reported as a [`crate::error::ParserWarning`] rather than silently corrected.
    pub verbose: bool,
    /// Caps the ratio of non-terminal nodes to terminal nodes a parse may build:
    /// `(nodes.len() / terminals.len()) - 1`. `Node` and `Implicit` become invalid once the
    /// ratio would be exceeded, so a runaway action sequence cannot grow the graph unboundedly.
    pub max_nodes_ratio: f64,
}

impl Options {
    /// The reference implementation's defaults: verification on, quiet, ratio capped at 10x.
    pub const fn new() -> Self {
        Self {
            verify: true,
            verbose: false,
            max_nodes_ratio: 10.0,
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_new() {
        assert_eq!(Options::default(), Options::new());
    }
}
