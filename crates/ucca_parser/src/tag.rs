//! The closed edge-tag vocabulary the parser core special-cases, plus the open-ended
//! structural relation labels an oracle or classifier supplies.

use std::fmt;

use crate::intern::{Interned, Interner};

static STRUCTURAL_TAGS: Interner<str> = Interner::new();

/// The label on an [`crate::edge::Edge`].
///
/// Four tags are meaningful to the core itself: [`EdgeTag::Terminal`] and
/// [`EdgeTag::Punctuation`] mark edges into the terminal layer, and
/// [`EdgeTag::LinkRelation`]/[`EdgeTag::LinkArgument`] are the only tags a
/// [linkage node](crate::node::Node::is_linkage) may use. Every other grammatical relation
/// (participant, process, parallel scene, ...) is supplied by the caller and carried as
/// [`EdgeTag::Structural`]; the core does not fix that inventory.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeTag {
    /// Connects a non-terminal to a plain terminal child.
    Terminal,
    /// Connects a non-terminal to a punctuation-group terminal child.
    Punctuation,
    /// The relation-node edge of a linkage.
    LinkRelation,
    /// An argument-node edge of a linkage.
    LinkArgument,
    /// Any other grammatical relation label.
    Structural(Interned<str>),
}

impl EdgeTag {
    /// Interns `label` as a [`EdgeTag::Structural`] tag.
    pub fn structural(label: &str) -> Self {
        Self::Structural(STRUCTURAL_TAGS.intern(label))
    }

    /// `true` for the tag used on edges into the terminal layer (`Terminal` or `Punctuation`).
    pub const fn is_terminal(&self) -> bool {
        matches!(self, EdgeTag::Terminal | EdgeTag::Punctuation)
    }

    /// `true` for the two tags a linkage node's outgoing edges are restricted to.
    pub const fn is_link(&self) -> bool {
        matches!(self, EdgeTag::LinkRelation | EdgeTag::LinkArgument)
    }

    /// The label text, for display and for the punctuation/terminal-tag comparisons that need
    /// a `&str` rather than a variant match.
    pub fn as_str(&self) -> &str {
        match self {
            EdgeTag::Terminal => "Terminal",
            EdgeTag::Punctuation => "Punctuation",
            EdgeTag::LinkRelation => "LinkRelation",
            EdgeTag::LinkArgument => "LinkArgument",
            EdgeTag::Structural(label) => label.0,
        }
    }
}

impl fmt::Debug for EdgeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for EdgeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The tag carried on a terminal [`crate::node::Node`], distinguishing ordinary words from
/// punctuation. Meaningful only during training, where it is compared against the gold
/// terminal's tag and corrected in [`crate::passage::builder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminalTag {
    /// An ordinary word token.
    Word,
    /// A punctuation token.
    Punctuation,
}

impl TerminalTag {
    /// Classifies `text` the way the core's own punctuation heuristic does: every character in
    /// the token is ASCII punctuation.
    pub fn classify(text: &str) -> Self {
        if !text.is_empty() && text.chars().all(|c| c.is_ascii_punctuation()) {
            TerminalTag::Punctuation
        } else {
            TerminalTag::Word
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_tags_intern_by_value() {
        let a = EdgeTag::structural("Participant");
        let b = EdgeTag::structural("Participant");
        assert_eq!(a, b);
        assert_ne!(a, EdgeTag::structural("Process"));
    }

    #[test]
    fn terminal_and_link_classification() {
        assert!(EdgeTag::Terminal.is_terminal());
        assert!(EdgeTag::Punctuation.is_terminal());
        assert!(!EdgeTag::structural("A").is_terminal());
        assert!(EdgeTag::LinkRelation.is_link());
        assert!(EdgeTag::LinkArgument.is_link());
        assert!(!EdgeTag::Terminal.is_link());
    }

    #[test]
    fn classifies_punctuation_tokens() {
        assert_eq!(TerminalTag::classify("."), TerminalTag::Punctuation);
        assert_eq!(TerminalTag::classify(","), TerminalTag::Punctuation);
        assert_eq!(TerminalTag::classify("dog"), TerminalTag::Word);
    }
}
