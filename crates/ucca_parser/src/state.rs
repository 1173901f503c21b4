//! The stack/buffer/node-list state machine.

use std::collections::VecDeque;

use ucca_graph::NodeIndex;

use crate::action::{Action, GoldRef};
use crate::config::Options;
use crate::edge::{Edge, EdgeIndex};
use crate::error::{ActionError, StructuralFault};
use crate::node::Node;
use crate::passage::{builder, graph::Passage};
use crate::tag::{EdgeTag, TerminalTag};

/// A gold graph supplied at construction time: training mode. Enables original-id
/// traceability and terminal-tag correction during [`State::create_passage`].
#[derive(Clone, Debug)]
pub struct GoldPassage {
    /// Paragraphs of surface tokens, identical in shape to the plain-text constructor's input.
    pub tokens: Vec<Vec<String>>,
    /// The gold id of each terminal, in reading order, parallel to the flattened `tokens`.
    pub terminal_ids: Vec<GoldRef>,
    /// The gold tag of each terminal, parallel to `terminal_ids`.
    pub terminal_tags: Vec<TerminalTag>,
    /// The gold id of the passage root.
    pub root_id: GoldRef,
}

/// Any producer of [`Action`]s: an oracle consulting a gold graph, or a learned classifier.
///
/// The blanket impl over `FnMut(&State) -> Option<Action>` covers both: an oracle closes over
/// its gold graph and position within it; a classifier closure closes over its model and
/// produces its single best guess. [`State::run`] calls [`ActionSource::next_action`] in a loop
/// until it returns `None` or [`State::finished`] becomes `true`; a fallible classifier is
/// expected to filter its own output against [`State::is_valid`] before returning.
pub trait ActionSource {
    fn next_action(&mut self, state: &State) -> Option<Action>;
}

impl<F: FnMut(&State) -> Option<Action>> ActionSource for F {
    fn next_action(&mut self, state: &State) -> Option<Action> {
        self(state)
    }
}

/// Adapts a plain `Iterator<Item = Action>` (e.g. a fixed, pre-computed action script used in
/// tests) into an [`ActionSource`], ignoring the state on every call.
pub struct ScriptedActions<I>(pub I);

impl<I: Iterator<Item = Action>> ActionSource for ScriptedActions<I> {
    fn next_action(&mut self, _state: &State) -> Option<Action> {
        self.0.next()
    }
}

/// The parser's working graph plus its stack/buffer partition of the node arena.
pub struct State {
    pub(crate) nodes: Vec<Node>,
    pub(crate) edges: Vec<Edge>,
    /// Snapshot of the terminal nodes, in reading order, taken at construction.
    pub(crate) terminals: Vec<NodeIndex>,
    pub(crate) tokens: Vec<Vec<String>>,
    pub(crate) stack: Vec<NodeIndex>,
    pub(crate) buffer: VecDeque<NodeIndex>,
    pub(crate) root: NodeIndex,
    pub(crate) gold: Option<GoldMeta>,
    pub(crate) passage_id: String,
    pub options: Options,
    pub finished: bool,
    pub log: Vec<String>,
}

/// The subset of [`GoldPassage`] that must outlive construction to drive [`State::create_passage`].
pub(crate) struct GoldMeta {
    pub(crate) terminal_tags: Vec<TerminalTag>,
    pub(crate) root_id: GoldRef,
}

impl State {
    /// Builds a fresh state from plain text: a sequence of paragraphs, each a sequence of
    /// surface tokens. `callback`, if given, runs once over the freshly created terminal nodes
    /// before the root is pushed onto the stack — the hook an external tagger attaches to.
    pub fn from_tokens(
        tokens: Vec<Vec<String>>,
        passage_id: impl Into<String>,
        options: Options,
        callback: Option<&mut dyn FnMut(&mut [Node])>,
    ) -> Self {
        let flat: Vec<&str> = tokens.iter().flatten().map(String::as_str).collect();
        let terminals = flat
            .iter()
            .enumerate()
            .map(|(i, text)| Node::terminal(NodeIndex::new(i), (*text).to_owned(), None, None))
            .collect();
        Self::build(terminals, tokens, None, passage_id.into(), options, callback)
    }

    /// Builds a fresh state from a gold graph: training mode. Terminal nodes carry the gold tag
    /// and gold id, and [`State::create_passage`] will fix up any drifted terminal tags and
    /// annotate the root with the gold root id.
    pub fn from_gold(
        gold: GoldPassage,
        passage_id: impl Into<String>,
        options: Options,
        callback: Option<&mut dyn FnMut(&mut [Node])>,
    ) -> Self {
        let flat: Vec<&str> = gold.tokens.iter().flatten().map(String::as_str).collect();
        assert_eq!(flat.len(), gold.terminal_ids.len());
        assert_eq!(flat.len(), gold.terminal_tags.len());
        let terminals = flat
            .iter()
            .enumerate()
            .map(|(i, text)| {
                Node::terminal(
                    NodeIndex::new(i),
                    (*text).to_owned(),
                    Some(gold.terminal_ids[i]),
                    Some(gold.terminal_tags[i]),
                )
            })
            .collect();
        Self::build(
            terminals,
            gold.tokens,
            Some(GoldMeta {
                terminal_tags: gold.terminal_tags,
                root_id: gold.root_id,
            }),
            passage_id.into(),
            options,
            callback,
        )
    }

    fn build(
        mut terminals: Vec<Node>,
        tokens: Vec<Vec<String>>,
        gold: Option<GoldMeta>,
        passage_id: String,
        options: Options,
        callback: Option<&mut dyn FnMut(&mut [Node])>,
    ) -> Self {
        if let Some(cb) = callback {
            cb(&mut terminals);
        }
        let terminal_indices: Vec<NodeIndex> = terminals.iter().map(|n| n.index).collect();
        let buffer: VecDeque<NodeIndex> = terminal_indices.iter().copied().collect();
        let mut nodes = terminals;
        let root_index = NodeIndex::new(nodes.len());
        let root_gold_id = gold.as_ref().map(|g| g.root_id);
        nodes.push(Node::non_terminal(root_index, root_gold_id, false));
        State {
            nodes,
            edges: Vec::new(),
            terminals: terminal_indices,
            tokens,
            stack: vec![root_index],
            buffer,
            root: root_index,
            gold,
            passage_id,
            options,
            finished: false,
            log: Vec::new(),
        }
    }

    pub fn node(&self, i: NodeIndex) -> &Node {
        &self.nodes[i.index()]
    }

    pub fn edge(&self, i: EdgeIndex) -> &Edge {
        &self.edges[i.index()]
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn passage_id(&self) -> &str {
        &self.passage_id
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edges_slice(&self) -> &[Edge] {
        &self.edges
    }

    /// The terminal nodes, in reading order, snapshotted at construction.
    pub fn terminals(&self) -> &[NodeIndex] {
        &self.terminals
    }

    /// The number of elements currently on the stack, a feature a learned classifier commonly
    /// consults alongside the node at each stack/buffer position.
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// The number of elements currently in the buffer.
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn stack_top(&self) -> Option<NodeIndex> {
        self.stack.last().copied()
    }

    /// Resolves the `(parent, child)` pair an edge action acts on, by direction.
    fn parent_child(&self, action: &Action) -> (NodeIndex, NodeIndex) {
        let n = self.stack.len();
        match action {
            Action::LeftEdge(_) | Action::LeftRemote(_) => (self.stack[n - 1], self.stack[n - 2]),
            Action::RightEdge(_) | Action::RightRemote(_) => (self.stack[n - 2], self.stack[n - 1]),
            _ => unreachable!("parent_child called on a non-edge action"),
        }
    }

    /// Non-throwing variant of [`State::assert_valid`], for classifier-time filtering of a
    /// proposed action set.
    pub fn is_valid(&self, action: &Action) -> bool {
        self.assert_valid(action).is_ok()
    }

    /// Checks whether `action` is legal in the current state, without applying it.
    pub fn assert_valid(&self, action: &Action) -> Result<(), ActionError> {
        match action {
            Action::Finish => {
                let root = self.node(self.root);
                if root.outgoing.is_empty() {
                    return Err(ActionError::RootHasNoChildren);
                }
                if self
                    .terminals
                    .iter()
                    .any(|&t| self.node(t).incoming.is_empty())
                {
                    return Err(ActionError::TerminalMissingParent);
                }
                Ok(())
            }
            Action::Shift => {
                if self.buffer.is_empty() {
                    return Err(ActionError::EmptyBuffer);
                }
                Ok(())
            }
            _ => {
                let s0 = self.stack_top().ok_or(ActionError::EmptyStack)?;
                let s0 = self.node(s0);
                match action {
                    Action::Node { tag, .. } => {
                        if s0.index == self.root {
                            return Err(ActionError::RootAsChild);
                        }
                        if s0.is_terminal() != matches!(tag, EdgeTag::Terminal) {
                            return Err(ActionError::TerminalTagMismatch);
                        }
                        self.assert_node_ratio()
                    }
                    Action::Implicit { .. } => {
                        if s0.is_terminal() {
                            return Err(ActionError::ImplicitOnTerminal);
                        }
                        if s0.implicit {
                            return Err(ActionError::ImplicitLoop);
                        }
                        self.assert_node_ratio()
                    }
                    Action::Reduce => {
                        if s0.index == self.root && s0.outgoing.is_empty() {
                            return Err(ActionError::ReduceRootless);
                        }
                        Ok(())
                    }
                    Action::LeftEdge(tag)
                    | Action::LeftRemote(tag)
                    | Action::RightEdge(tag)
                    | Action::RightRemote(tag) => {
                        if self.stack.len() < 2 {
                            return Err(ActionError::StackTooShort);
                        }
                        let (parent, child) = self.parent_child(action);
                        if child == self.root {
                            return Err(ActionError::RootAsEdgeChild);
                        }
                        let parent_node = self.node(parent);
                        let child_node = self.node(child);
                        if parent_node.is_terminal() {
                            return Err(ActionError::TerminalAsEdgeParent);
                        }
                        if parent == self.root && child_node.is_terminal() {
                            return Err(ActionError::RootToTerminalEdge);
                        }
                        if parent_node.children(&self.edges).any(|c| c == child) {
                            return Err(ActionError::DuplicateEdge);
                        }
                        if child_node.is_terminal() != matches!(tag, EdgeTag::Terminal) {
                            return Err(ActionError::TerminalTagMismatch);
                        }
                        if child_node.descendants(&self.nodes, &self.edges).contains(&parent) {
                            return Err(ActionError::CycleWouldBeCreated);
                        }
                        Ok(())
                    }
                    Action::Swap(distance) => {
                        let d = *distance as usize;
                        if d < 1 || d >= self.stack.len() {
                            return Err(ActionError::InvalidSwapDistance(*distance));
                        }
                        let swapped = self.node(self.stack[self.stack.len() - d - 1]);
                        if s0.is_terminal() && swapped.is_terminal() {
                            return Err(ActionError::SwapBothTerminals);
                        }
                        if !s0.is_terminal() && swapped.swap_index > s0.swap_index {
                            return Err(ActionError::SwapLoop);
                        }
                        Ok(())
                    }
                    Action::Shift | Action::Finish => unreachable!(),
                }
            }
        }
    }

    fn assert_node_ratio(&self) -> Result<(), ActionError> {
        let ratio = self.nodes.len() as f64 / self.terminals.len() as f64 - 1.0;
        if ratio > self.options.max_nodes_ratio {
            return Err(ActionError::NodeRatioExceeded);
        }
        Ok(())
    }

    /// Applies `action`, which must already have passed [`State::assert_valid`].
    #[cfg_attr(feature = "trace", tracing::instrument(level = "trace", skip(self), fields(stack_height = self.stack.len(), buffer_len = self.buffer.len())))]
    pub fn transition(&mut self, action: &Action) -> Result<(), StructuralFault> {
        self.log.clear();
        match action {
            Action::Shift => {
                let head = self.buffer.pop_front().expect("validated: buffer non-empty");
                self.stack.push(head);
            }
            Action::Node { tag, gold } => {
                let s0 = *self.stack.last().expect("validated: stack non-empty");
                let parent = self.new_node(None, *gold, false);
                self.apply_swap_index(parent, s0);
                self.create_edge(parent, s0, *tag, false)?;
                self.buffer.push_front(parent);
            }
            Action::Implicit { tag, gold } => {
                let s0 = *self.stack.last().expect("validated: stack non-empty");
                let child = self.new_node(None, *gold, true);
                self.apply_swap_index(child, s0);
                self.create_edge(s0, child, *tag, false)?;
                self.buffer.push_front(child);
            }
            Action::Reduce => {
                self.stack.pop();
            }
            Action::LeftEdge(tag) | Action::RightEdge(tag) => {
                let (parent, child) = self.parent_child(action);
                self.create_edge(parent, child, *tag, false)?;
            }
            Action::LeftRemote(tag) | Action::RightRemote(tag) => {
                let (parent, child) = self.parent_child(action);
                self.create_edge(parent, child, *tag, true)?;
            }
            Action::Swap(distance) => {
                let d = *distance as usize;
                let n = self.stack.len();
                let start = n - d - 1;
                let end = n - 1;
                let moved: Vec<NodeIndex> = self.stack.drain(start..end).collect();
                self.log.push(format!(
                    "{} <--> {}",
                    moved
                        .iter()
                        .map(|n| format!("{:?}", n))
                        .collect::<Vec<_>>()
                        .join(", "),
                    self.stack.last().map(|n| format!("{:?}", n)).unwrap_or_default()
                ));
                for n in moved.into_iter().rev() {
                    self.buffer.push_front(n);
                }
            }
            Action::Finish => {
                self.finished = true;
            }
        }
        if self.options.verify {
            let overlap: Vec<u32> = self
                .stack
                .iter()
                .filter(|s| self.buffer.contains(s))
                .map(|n| n.index() as u32)
                .collect();
            if !overlap.is_empty() {
                return Err(StructuralFault::StackBufferOverlap(overlap));
            }
        }
        Ok(())
    }

    /// Runs the swap-index update rule for a node just created above `stack_top`, immediately
    /// after creation (see [`crate::node::Node::update_swap_index`]).
    fn apply_swap_index(&mut self, fresh: NodeIndex, stack_top: NodeIndex) {
        let stack_top_swap_index = self.node(stack_top).swap_index;
        let buffer_head = self
            .buffer
            .front()
            .map(|&i| (self.node(i).swap_index, self.node(i).is_terminal()));
        let own_index = self.node(fresh).swap_index;
        self.nodes[fresh.index()].swap_index =
            crate::node::averaged_swap_index(own_index, stack_top_swap_index, buffer_head);
    }

    fn new_node(&mut self, text: Option<String>, gold: Option<GoldRef>, implicit: bool) -> NodeIndex {
        let index = NodeIndex::new(self.nodes.len());
        let node = match text {
            Some(text) => Node::terminal(index, text, gold, None),
            None => Node::non_terminal(index, gold, implicit),
        };
        self.log.push(format!("node: {:?}", index));
        self.nodes.push(node);
        index
    }

    /// Creates and records an edge, enforcing the acyclicity/no-duplicate invariants when
    /// [`Options::verify`] is set.
    fn create_edge(
        &mut self,
        parent: NodeIndex,
        child: NodeIndex,
        tag: EdgeTag,
        remote: bool,
    ) -> Result<(), StructuralFault> {
        if parent == child {
            return Err(StructuralFault::DuplicateEdgeRecord {
                parent: parent.index() as u32,
                child: child.index() as u32,
            });
        }
        if self.options.verify {
            if self.node(parent).children(&self.edges).any(|c| c == child) {
                return Err(StructuralFault::DuplicateEdgeRecord {
                    parent: parent.index() as u32,
                    child: child.index() as u32,
                });
            }
            if self
                .node(child)
                .descendants(&self.nodes, &self.edges)
                .contains(&parent)
            {
                return Err(StructuralFault::CycleDetected {
                    parent: parent.index() as u32,
                    child: child.index() as u32,
                    through: child.index() as u32,
                });
            }
        }
        let edge_index = EdgeIndex::new(self.edges.len());
        self.edges.push(Edge::new(parent, child, tag, remote));
        self.nodes[parent.index()].outgoing.push(edge_index);
        self.nodes[child.index()].incoming.push(edge_index);
        self.log.push(format!("edge: {:?}", self.edges[edge_index.index()]));
        Ok(())
    }

    /// Drives `source` until it yields no more actions or [`State::finished`] becomes true.
    #[cfg_attr(feature = "trace", tracing::instrument(level = "debug", skip(self, source)))]
    pub fn run(&mut self, source: &mut impl ActionSource) -> Result<(), ActionError> {
        while !self.finished {
            let Some(action) = source.next_action(self) else {
                break;
            };
            self.assert_valid(&action)?;
            self.transition(&action)
                .unwrap_or_else(|fault| panic!("structural fault after validated action: {fault}"));
        }
        Ok(())
    }

    /// A one-line trace of the current stack/buffer contents, in the reference implementation's
    /// `"stack: [...] buffer: [...]"` format.
    pub fn describe(&self) -> String {
        let describe_node = |i: &NodeIndex| {
            let node = self.node(*i);
            match &node.text {
                Some(text) => format!("\"{text}\""),
                None => format!("{:?}", node.index),
            }
        };
        format!(
            "stack: [{}] buffer: [{}]",
            self.stack.iter().map(describe_node).collect::<Vec<_>>().join(" "),
            self.buffer.iter().map(describe_node).collect::<Vec<_>>().join(" ")
        )
    }

    /// Materializes the final layered passage from the working graph. See
    /// [`crate::passage::builder`] for the algorithm.
    pub fn create_passage(&self) -> Result<(Passage, Vec<crate::error::ParserWarning>), StructuralFault> {
        builder::build(self)
    }
}
