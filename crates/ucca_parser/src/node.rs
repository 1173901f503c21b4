//! Arena-indexed node records.

use std::collections::HashSet;

use ucca_graph::NodeIndex;

use crate::action::GoldRef;
use crate::edge::{Edge, EdgeIndex};
use crate::tag::TerminalTag;

/// A node in the parser's working graph: either a terminal (carries `text`), an ordinary
/// non-terminal, or an implicit non-terminal (has no textual realization and no buffer
/// placement of its own).
///
/// Mirrors the reference implementation's `Node`, minus the direct `Node`/`Edge` object
/// references: [`Node::outgoing`] and [`Node::incoming`] hold [`EdgeIndex`]es into the owning
/// [`crate::state::State`]'s edge arena rather than owning `Edge` values, and there is no
/// separate `children`/`parents` cache — [`Node::children`] and [`Node::parents`] derive the
/// same information from the edge arena on demand.
#[derive(Clone, Debug)]
pub struct Node {
    /// This node's own position in the arena; equal to its [`NodeIndex`] as a plain integer.
    pub index: NodeIndex,
    /// During training, the id of the gold node this node reconstructs.
    pub gold_id: Option<GoldRef>,
    /// `Some` for terminals (their surface text), `None` for non-terminals.
    pub text: Option<String>,
    /// During training, the gold tag (`Word`/`Punctuation`) of a terminal node.
    pub tag: Option<TerminalTag>,
    /// `true` for non-terminals created by an `Implicit` action.
    pub implicit: bool,
    pub outgoing: Vec<EdgeIndex>,
    pub incoming: Vec<EdgeIndex>,
    /// Ordering key used by the `Swap` validity check. Initialized to this node's own index and
    /// averaged between its neighbors by [`Node::update_swap_index`] so a freshly created
    /// non-terminal is treated as "always having appeared before" the current buffer head,
    /// which is what lets it be swapped without the swap-loop rule immediately rejecting it.
    pub swap_index: f64,
}

/// The swap-index update rule, factored out so [`crate::state::State::transition`] can apply it
/// without needing a full [`Node`] value for each neighbor.
pub(crate) fn averaged_swap_index(
    own_index: f64,
    stack_top_swap_index: f64,
    buffer_head: Option<(f64, bool)>,
) -> f64 {
    match buffer_head {
        Some((head_swap_index, is_terminal)) if !is_terminal && head_swap_index <= own_index => {
            (stack_top_swap_index + head_swap_index) / 2.0
        }
        _ => own_index,
    }
}

impl Node {
    pub fn terminal(index: NodeIndex, text: String, gold_id: Option<GoldRef>, tag: Option<TerminalTag>) -> Self {
        Self {
            index,
            gold_id,
            text: Some(text),
            tag,
            implicit: false,
            outgoing: Vec::new(),
            incoming: Vec::new(),
            swap_index: index.index() as f64,
        }
    }

    pub fn non_terminal(index: NodeIndex, gold_id: Option<GoldRef>, implicit: bool) -> Self {
        Self {
            index,
            gold_id,
            text: None,
            tag: None,
            implicit,
            outgoing: Vec::new(),
            incoming: Vec::new(),
            swap_index: index.index() as f64,
        }
    }

    pub const fn is_terminal(&self) -> bool {
        self.text.is_some()
    }

    /// `true` if every outgoing edge is a link edge and there is at least one.
    pub fn is_linkage(&self, edges: &[Edge]) -> bool {
        !self.outgoing.is_empty()
            && self
                .outgoing
                .iter()
                .all(|&e| edges[e.index()].tag.is_link())
    }

    /// Recomputes [`Node::swap_index`] from the stack-top node just below this one and the
    /// current buffer head, run exactly once, right after this node is created by `Node` or
    /// `Implicit`.
    ///
    /// If the buffer is empty, or its head is a terminal, or the head's swap index is not ahead
    /// of this node's, there is nothing to fix: this node's index already places it correctly.
    /// Otherwise the buffer head is a non-terminal created earlier that now sits ahead of this
    /// brand-new node in the buffer; averaging the two neighbors' swap indices places this node
    /// between them for the purposes of the swap-loop check.
    pub fn update_swap_index(&mut self, stack_top: &Node, buffer_head: Option<&Node>) {
        self.swap_index = averaged_swap_index(
            self.swap_index,
            stack_top.swap_index,
            buffer_head.map(|h| (h.swap_index, h.is_terminal())),
        );
    }

    /// This node's direct children, in outgoing-edge order.
    pub fn children<'a>(&'a self, edges: &'a [Edge]) -> impl Iterator<Item = NodeIndex> + 'a {
        self.outgoing.iter().map(move |&e| edges[e.index()].child)
    }

    /// This node's direct parents, in incoming-edge order.
    pub fn parents<'a>(&'a self, edges: &'a [Edge]) -> impl Iterator<Item = NodeIndex> + 'a {
        self.incoming.iter().map(move |&e| edges[e.index()].parent)
    }

    /// All nodes reachable from this node by following outgoing edges, excluding itself even if
    /// a cycle would otherwise revisit it.
    pub fn descendants(&self, nodes: &[Node], edges: &[Edge]) -> HashSet<NodeIndex> {
        let mut seen = HashSet::new();
        let mut stack: Vec<NodeIndex> = self.children(edges).collect();
        while let Some(n) = stack.pop() {
            if n == self.index || !seen.insert(n) {
                continue;
            }
            stack.extend(nodes[n.index()].children(edges));
        }
        seen
    }

    /// All nodes this node is reachable from by following incoming edges, excluding itself even
    /// if a cycle would otherwise revisit it.
    pub fn ancestors(&self, nodes: &[Node], edges: &[Edge]) -> HashSet<NodeIndex> {
        let mut seen = HashSet::new();
        let mut stack: Vec<NodeIndex> = self.parents(edges).collect();
        while let Some(n) = stack.pop() {
            if n == self.index || !seen.insert(n) {
                continue;
            }
            stack.extend(nodes[n.index()].parents(edges));
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx(i: usize) -> NodeIndex {
        NodeIndex::new(i)
    }

    #[test]
    fn swap_index_unaffected_by_empty_or_terminal_buffer() {
        let s0 = Node::terminal(idx(0), "a".into(), None, None);
        let mut fresh = Node::non_terminal(idx(1), None, false);
        fresh.update_swap_index(&s0, None);
        assert_eq!(fresh.swap_index, 1.0);

        let terminal_head = Node::terminal(idx(2), "b".into(), None, None);
        let mut fresh2 = Node::non_terminal(idx(3), None, false);
        fresh2.update_swap_index(&s0, Some(&terminal_head));
        assert_eq!(fresh2.swap_index, 3.0);
    }

    #[test]
    fn swap_index_averages_when_buffer_head_precedes() {
        let s0 = Node::non_terminal(idx(0), None, false);
        let mut earlier_head = Node::non_terminal(idx(1), None, false);
        earlier_head.swap_index = 0.5;
        let mut fresh = Node::non_terminal(idx(5), None, false);
        fresh.update_swap_index(&s0, Some(&earlier_head));
        assert_eq!(fresh.swap_index, 0.25);
    }

    #[test]
    fn descendants_stop_at_cycles() {
        use crate::tag::EdgeTag;
        let nodes = vec![
            Node::non_terminal(idx(0), None, false),
            Node::non_terminal(idx(1), None, false),
        ];
        let edges = vec![
            Edge::new(idx(0), idx(1), EdgeTag::structural("A"), false),
            Edge::new(idx(1), idx(0), EdgeTag::structural("B"), false),
        ];
        let mut n0 = nodes[0].clone();
        n0.outgoing.push(EdgeIndex::new(0));
        let mut n1 = nodes[1].clone();
        n1.outgoing.push(EdgeIndex::new(1));
        let arena = vec![n0, n1];
        let descendants = arena[0].descendants(&arena, &edges);
        assert_eq!(descendants, HashSet::from([idx(1)]));
    }
}
