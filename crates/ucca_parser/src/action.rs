//! The closed vocabulary of parser transitions.

use crate::tag::EdgeTag;

/// The discriminant of an [`Action`], with no payload attached.
///
/// Exists so validity checks and logging can ask "is this a `Swap`?" without matching out (and
/// owning) the payload, mirroring the Python core's `Action.is_type(*kinds)` helper.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Shift,
    Node,
    Implicit,
    Reduce,
    LeftEdge,
    RightEdge,
    LeftRemote,
    RightRemote,
    Swap,
    Finish,
}

/// During training, the original gold node an oracle-generated `Node`/`Implicit` action
/// corresponds to, kept only so the produced node can be annotated with its source id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GoldRef(pub u32);

/// A single parser transition, as yielded by an [`crate::state::ActionSource`].
///
/// `Node` and `Implicit` carry an edge tag (the tag of the edge they create) and, during
/// training, a reference to the gold node they reconstruct. `Swap` carries a compound distance;
/// every other variant is either bare or tagged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Shift,
    Node {
        tag: EdgeTag,
        gold: Option<GoldRef>,
    },
    Implicit {
        tag: EdgeTag,
        gold: Option<GoldRef>,
    },
    Reduce,
    LeftEdge(EdgeTag),
    RightEdge(EdgeTag),
    LeftRemote(EdgeTag),
    RightRemote(EdgeTag),
    /// `distance` is the number of stack elements, below the top, to swap past. A plain swap is
    /// `distance == 1`; a compound swap moves more than one element back to the buffer.
    Swap(u32),
    Finish,
}

impl Action {
    /// The bare discriminant of this action, discarding any tag/distance payload.
    pub const fn kind(&self) -> ActionKind {
        match self {
            Action::Shift => ActionKind::Shift,
            Action::Node { .. } => ActionKind::Node,
            Action::Implicit { .. } => ActionKind::Implicit,
            Action::Reduce => ActionKind::Reduce,
            Action::LeftEdge(_) => ActionKind::LeftEdge,
            Action::RightEdge(_) => ActionKind::RightEdge,
            Action::LeftRemote(_) => ActionKind::LeftRemote,
            Action::RightRemote(_) => ActionKind::RightRemote,
            Action::Swap(_) => ActionKind::Swap,
            Action::Finish => ActionKind::Finish,
        }
    }

    /// `true` if this action's kind is any of `kinds`, the Rust analogue of the Python core's
    /// `action.is_type(A, B, C)` calls.
    pub fn matches(&self, kinds: &[ActionKind]) -> bool {
        kinds.contains(&self.kind())
    }

    /// The edge tag this action creates an edge with, for the variants that carry one.
    pub const fn tag(&self) -> Option<EdgeTag> {
        match self {
            Action::Node { tag, .. }
            | Action::Implicit { tag, .. }
            | Action::LeftEdge(tag)
            | Action::RightEdge(tag)
            | Action::LeftRemote(tag)
            | Action::RightRemote(tag) => Some(*tag),
            _ => None,
        }
    }

    /// `true` for the two variants that mark the edge they create as remote.
    pub const fn is_remote(&self) -> bool {
        matches!(self, Action::LeftRemote(_) | Action::RightRemote(_))
    }

    /// `true` for the four variants resolved via [`crate::state::State::parent_child`]
    /// (they act on the top two stack elements rather than the top alone).
    pub const fn is_edge(&self) -> bool {
        matches!(
            self,
            Action::LeftEdge(_) | Action::RightEdge(_) | Action::LeftRemote(_) | Action::RightRemote(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_checks_kind_only() {
        let a = Action::LeftRemote(EdgeTag::structural("A"));
        assert!(a.matches(&[ActionKind::LeftEdge, ActionKind::LeftRemote]));
        assert!(!a.matches(&[ActionKind::RightRemote]));
    }

    #[test]
    fn remote_flag_matches_variant() {
        assert!(Action::LeftRemote(EdgeTag::Terminal).is_remote());
        assert!(Action::RightRemote(EdgeTag::Terminal).is_remote());
        assert!(!Action::LeftEdge(EdgeTag::Terminal).is_remote());
    }

    #[test]
    fn edge_variants_carry_their_tag() {
        let tag = EdgeTag::structural("Process");
        assert_eq!(Action::RightEdge(tag).tag(), Some(tag));
        assert_eq!(Action::Shift.tag(), None);
    }
}
