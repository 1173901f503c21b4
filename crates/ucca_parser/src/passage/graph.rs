//! The materialized output graph: a terminals layer plus a structural layer, as produced by
//! [`crate::passage::builder::build`].

use crate::action::GoldRef;
use crate::tag::{EdgeTag, TerminalTag};

/// Identifies a node in the structural (non-terminal) layer. Assigned by the output layer
/// itself, in materialization order — unrelated to the working graph's [`ucca_graph::NodeIndex`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OutputNodeId(pub(crate) u32);

impl std::fmt::Debug for OutputNodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OutputNodeId({})", self.0)
    }
}

/// Identifies a terminal in the terminals layer, by its position in reading order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TerminalId(pub(crate) u32);

impl std::fmt::Debug for TerminalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TerminalId({})", self.0)
    }
}

/// The target of an [`OutputEdge`] or a [`Linkage`] slot: either a structural node or a terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputTarget {
    Node(OutputNodeId),
    Terminal(TerminalId),
}

/// A token in the terminals layer.
#[derive(Clone, Debug, PartialEq)]
pub struct Terminal {
    pub id: TerminalId,
    pub text: String,
    /// Which paragraph (0-indexed) this terminal belongs to.
    pub paragraph: usize,
    pub tag: TerminalTag,
}

/// A node in the structural layer: a non-terminal, a punctuation group, or the root.
#[derive(Clone, Debug)]
pub struct OutputNode {
    pub id: OutputNodeId,
    pub implicit: bool,
    /// The originating gold node id, when the passage was built in training mode.
    pub orig_id: Option<GoldRef>,
    /// Indices into [`Passage::edges`] for this node's outgoing edges, in materialization order.
    pub outgoing: Vec<usize>,
}

/// A directed, tagged edge in the structural layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutputEdge {
    pub parent: OutputNodeId,
    pub child: OutputTarget,
    pub tag: EdgeTag,
    pub remote: bool,
}

/// A linkage group: a relation node together with its argument nodes, registered outside the
/// parent/child hierarchy.
#[derive(Clone, Debug)]
pub struct Linkage {
    pub relation: OutputTarget,
    pub arguments: Vec<OutputTarget>,
    pub orig_id: Option<GoldRef>,
}

/// The final materialized passage.
#[derive(Clone, Debug)]
pub struct Passage {
    pub id: String,
    /// Each paragraph's tokens, joined with spaces, in input order.
    pub paragraphs: Vec<String>,
    pub terminals: Vec<Terminal>,
    pub nodes: Vec<OutputNode>,
    pub edges: Vec<OutputEdge>,
    pub root: OutputNodeId,
    pub linkages: Vec<Linkage>,
    /// The gold root's id, carried for traceability when built in training mode.
    pub orig_root_id: Option<GoldRef>,
}

impl Passage {
    pub fn node(&self, id: OutputNodeId) -> &OutputNode {
        &self.nodes[id.0 as usize]
    }

    pub fn edge(&self, i: usize) -> &OutputEdge {
        &self.edges[i]
    }

    pub fn terminal(&self, id: TerminalId) -> &Terminal {
        &self.terminals[id.0 as usize]
    }

    /// The outgoing edges of `node`, as `&OutputEdge` rather than indices.
    pub fn outgoing<'a>(&'a self, node: OutputNodeId) -> impl Iterator<Item = &'a OutputEdge> + 'a {
        self.node(node).outgoing.iter().map(move |&i| &self.edges[i])
    }
}
