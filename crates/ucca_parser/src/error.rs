//! The three error categories a parse can raise.
//!
//! The reference implementation signals every invalid-action and invariant-violation case with
//! a bare `AssertionError` and a free-text message. That collapses recoverable "this action
//! isn't legal right now" checks, truly-fatal internal invariant breaks, and advisory warnings
//! into one undifferentiated type, which a caller can't pattern-match on. Here they're three
//! distinct enums: [`ActionError`] (the action the caller proposed is invalid in this state, and
//! trying a different action is a reasonable response), [`StructuralFault`] (an invariant the
//! core itself is supposed to maintain was violated, which means a bug rather than a bad
//! action), and [`ParserWarning`] (non-fatal, collected rather than raised).

use thiserror::Error;

use crate::action::ActionKind;
use crate::state::State;

/// An action was rejected by [`State::assert_valid`].
///
/// Each variant names the specific precondition that failed, the same preconditions the
/// reference implementation checks with a chain of `assert` statements in `State.assert_valid`.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionError {
    #[error("buffer is empty, cannot shift")]
    EmptyBuffer,
    #[error("stack is empty, action requires a non-empty stack")]
    EmptyStack,
    #[error("action requires at least two stack elements")]
    StackTooShort,
    #[error("the root may not have parents")]
    RootAsChild,
    #[error("edge tag must be Terminal iff the child is a terminal")]
    TerminalTagMismatch,
    #[error("maximum non-terminal/terminal ratio exceeded")]
    NodeRatioExceeded,
    #[error("terminals may not have implicit children")]
    ImplicitOnTerminal,
    #[error("node is already implicit")]
    ImplicitLoop,
    #[error("may not reduce the root without children")]
    ReduceRootless,
    #[error("root may not be the child of an edge")]
    RootAsEdgeChild,
    #[error("terminal may not be the parent of an edge")]
    TerminalAsEdgeParent,
    #[error("an edge from the root directly to a terminal is not allowed")]
    RootToTerminalEdge,
    #[error("edge already exists between these nodes")]
    DuplicateEdge,
    #[error("this edge would create a cycle")]
    CycleWouldBeCreated,
    #[error("invalid swap distance {0}: must be at least 1 and less than the stack height")]
    InvalidSwapDistance(u32),
    #[error("swapping two terminals is not allowed")]
    SwapBothTerminals,
    #[error("swapping already-swapped nodes would loop")]
    SwapLoop,
    #[error("root must have at least one child to finish")]
    RootHasNoChildren,
    #[error("every terminal must have a parent to finish")]
    TerminalMissingParent,
}

impl ActionError {
    /// Which [`ActionKind`] this error applies to, when the caller wants to report it against a
    /// specific proposed action rather than the error alone.
    pub fn render(&self, action: ActionKind, state: &State) -> String {
        // `state` is threaded through so a future revision can include stack/buffer context in
        // the message without changing every call site; nothing here needs it yet beyond the
        // action kind, which callers already have.
        let _ = state;
        match self {
            ActionError::InvalidSwapDistance(d) => {
                format!("{action:?} rejected: invalid swap distance {d}")
            }
            other => format!("{action:?} rejected: {other}"),
        }
    }
}

/// An invariant the core is responsible for maintaining was violated.
///
/// Unlike [`ActionError`], these do not mean the caller proposed something invalid: they mean
/// the core's own bookkeeping (the arena, the edge set, the stack/buffer partition) is broken,
/// which is a bug. They are returned rather than panicking so a long-running service can log and
/// abandon the offending parse instead of crashing the process.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralFault {
    #[error("node {0} already exists in the arena")]
    DuplicateNode(u32),
    #[error("edge {parent} -> {child} already exists")]
    DuplicateEdgeRecord { parent: u32, child: u32 },
    #[error("edge {parent} -> {child} would create a cycle through {through}")]
    CycleDetected {
        parent: u32,
        child: u32,
        through: u32,
    },
    #[error("stack and buffer overlap after transition: {0:?}")]
    StackBufferOverlap(Vec<u32>),
    #[error("non-terminal leaf node {0} has no outgoing edges and is not implicit")]
    NonTerminalLeaf(u32),
    #[error("node {0} has no incoming edge, is not the root, and is not a linkage")]
    OrphanNode(u32),
    #[error("linkage node {0} has more than one link relation")]
    MultipleLinkRelations(u32),
    #[error("linkage node {0} has no link relation")]
    MissingLinkRelation(u32),
    #[error("topological sort could not linearize the graph: {0}")]
    NotADag(String),
}

/// A non-fatal condition worth surfacing, but not worth aborting the parse for.
///
/// Collected during [`State::create_passage`] rather than raised; the caller decides what to do
/// with them (log, assert-empty in tests, ignore in production inference).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParserWarning {
    #[error("terminal {index} tag corrected from {found:?} to {expected:?}")]
    TerminalTagCorrected {
        index: usize,
        found: crate::tag::TerminalTag,
        expected: crate::tag::TerminalTag,
    },
    #[error("linkage node {0} has fewer than two link arguments")]
    FewLinkageArguments(u32),
}
