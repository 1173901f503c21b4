//! Materializes the final layered [`Passage`] from a finished [`State`]'s working graph.

use std::collections::HashMap;

use ucca_graph::{DiGraph, NodeIndex};

use crate::error::{ParserWarning, StructuralFault};
use crate::passage::graph::{Linkage, OutputEdge, OutputNode, OutputNodeId, OutputTarget, Passage, Terminal};
use crate::state::State;
use crate::tag::{EdgeTag, TerminalTag};

/// Runs the seven-step construction pipeline described for [`State::create_passage`].
#[cfg_attr(feature = "trace", tracing::instrument(level = "debug", skip(state), fields(passage_id = state.passage_id())))]
pub fn build(state: &State) -> Result<(Passage, Vec<ParserWarning>), StructuralFault> {
    let mut warnings = Vec::new();

    // 1. Reconstruct paragraphs and allocate the terminals layer.
    let paragraphs: Vec<String> = state.tokens.iter().map(|p| p.join(" ")).collect();
    let mut terminal_paragraph = Vec::with_capacity(state.terminals.len());
    for (p_idx, paragraph) in state.tokens.iter().enumerate() {
        terminal_paragraph.resize(terminal_paragraph.len() + paragraph.len(), p_idx);
    }

    let gold_tags = state.gold.as_ref().map(|g| &g.terminal_tags);
    let mut terminals = Vec::with_capacity(state.terminals.len());
    for (i, &node_idx) in state.terminals.iter().enumerate() {
        let node = state.node(node_idx);
        let text = node.text.clone().expect("terminal node must carry text");
        let constructed = TerminalTag::classify(&text);
        // 2. Fix terminal tags against the gold graph, when training.
        let tag = match gold_tags {
            Some(gold) => {
                let expected = gold[i];
                if expected != constructed && state.options.verbose {
                    warnings.push(ParserWarning::TerminalTagCorrected {
                        index: i,
                        found: constructed,
                        expected,
                    });
                }
                expected
            }
            None => constructed,
        };
        terminals.push(Terminal {
            id: crate::passage::graph::TerminalId(i as u32),
            text,
            paragraph: terminal_paragraph[i],
            tag,
        });
    }

    // 3. Topological sort, breaking ties by gold index (falling back to arena index).
    let order = materialization_order(state)?;
    let position: HashMap<NodeIndex, usize> =
        order.iter().enumerate().map(|(pos, &n)| (n, pos)).collect();
    let sort_key = |n: NodeIndex| -> u32 {
        state
            .node(n)
            .gold_id
            .map(|g| g.0)
            .unwrap_or_else(|| position[&n] as u32)
    };
    let sorted_children = |n: NodeIndex| -> Vec<crate::edge::EdgeIndex> {
        let mut edges: Vec<_> = state.node(n).outgoing.clone();
        edges.sort_by_key(|&e| sort_key(state.edge(e).child));
        edges
    };

    let mut passage = Passage {
        id: state.passage_id().to_owned(),
        paragraphs,
        terminals,
        nodes: vec![OutputNode {
            id: OutputNodeId(0),
            implicit: false,
            orig_id: state.gold.as_ref().map(|g| g.root_id),
            outgoing: Vec::new(),
        }],
        edges: Vec::new(),
        root: OutputNodeId(0),
        linkages: Vec::new(),
        orig_root_id: state.gold.as_ref().map(|g| g.root_id),
    };

    let mut materialized: HashMap<NodeIndex, OutputTarget> = HashMap::new();
    materialized.insert(state.root(), OutputTarget::Node(passage.root));
    // A punctuation collapse consumes its grandchild terminal ahead of the main loop reaching
    // it; track which working-graph nodes have already been fully handled so the outer loop
    // does not try to re-materialize them.
    let mut consumed: std::collections::HashSet<NodeIndex> = std::collections::HashSet::new();

    let mut linkage_nodes = Vec::new();
    let mut remotes: Vec<(NodeIndex, crate::edge::EdgeIndex)> = Vec::new();

    // 4. First pass: materialize every non-linkage node's non-remote children.
    for &node_idx in &order {
        if consumed.contains(&node_idx) {
            continue;
        }
        let node = state.node(node_idx);
        if node.is_linkage(&state.edges) {
            linkage_nodes.push(node_idx);
            continue;
        }
        let Some(OutputTarget::Node(parent_out)) = materialized.get(&node_idx).copied() else {
            // A non-root node with no materialized parent is either unreachable from the root
            // (dead code in the working graph) or a genuine orphan; either way it contributes
            // nothing to the output passage.
            continue;
        };
        for edge_idx in sorted_children(node_idx) {
            let edge = state.edge(edge_idx);
            if edge.remote {
                remotes.push((node_idx, edge_idx));
                continue;
            }
            if materialized.contains_key(&edge.child) {
                continue;
            }
            materialize_child(state, &mut passage, &mut materialized, &mut consumed, parent_out, edge.child, edge.tag)?;
        }
    }

    // 5. Second pass: remote edges.
    for (node_idx, edge_idx) in remotes {
        let edge = state.edge(edge_idx);
        let parent_out = match materialized.get(&node_idx) {
            Some(OutputTarget::Node(id)) => *id,
            _ => continue,
        };
        let Some(&child_target) = materialized.get(&edge.child) else {
            continue;
        };
        add_edge(&mut passage, parent_out, child_target, edge.tag, true);
    }

    // 6. Third pass: linkages.
    for node_idx in linkage_nodes {
        let node = state.node(node_idx);
        let mut relation = None;
        let mut arguments = Vec::new();
        for &edge_idx in &node.outgoing {
            let edge = state.edge(edge_idx);
            let Some(&target) = materialized.get(&edge.child) else {
                continue;
            };
            match edge.tag {
                EdgeTag::LinkRelation => {
                    if relation.is_some() {
                        return Err(StructuralFault::MultipleLinkRelations(node_idx.index() as u32));
                    }
                    relation = Some(target);
                }
                EdgeTag::LinkArgument => arguments.push(target),
                _ => {}
            }
        }
        let relation = relation.ok_or(StructuralFault::MissingLinkRelation(node_idx.index() as u32))?;
        if arguments.len() < 2 {
            warnings.push(ParserWarning::FewLinkageArguments(node_idx.index() as u32));
        }
        // 7. Carry forward the originating gold id, for traceability.
        passage.linkages.push(Linkage {
            relation,
            arguments,
            orig_id: node.gold_id,
        });
    }

    #[cfg(feature = "trace")]
    for warning in &warnings {
        tracing::warn!(%warning, "parser warning during passage construction");
    }

    Ok((passage, warnings))
}

/// Computes a materialization order over the working graph: ascending by distance from the
/// root (root first), ties broken by gold index or arena index. Equivalent to the reference
/// implementation's node-level computation, but verified against a generic topological sort
/// first so a genuine cycle is reported as a [`StructuralFault`] rather than looping forever.
fn materialization_order(state: &State) -> Result<Vec<NodeIndex>, StructuralFault> {
    let mut graph = DiGraph::<NodeIndex>::default();
    for i in 0..state.node_count() {
        graph.add_node(NodeIndex::new(i));
    }
    for edge in state.edges_slice() {
        graph.add_edge(edge.parent, edge.child);
    }
    ucca_graph::topological_sort(&graph)
        .map_err(|e| StructuralFault::NotADag(format!("{e}")))?;

    let mut level_by_index: HashMap<NodeIndex, usize> = HashMap::new();
    let mut levels: HashMap<usize, Vec<NodeIndex>> = HashMap::new();
    let mut stack: Vec<NodeIndex> = (0..state.node_count())
        .map(NodeIndex::new)
        .filter(|&n| state.node(n).outgoing.is_empty())
        .collect();

    while let Some(node_idx) = stack.pop() {
        if level_by_index.contains_key(&node_idx) {
            continue;
        }
        let parents: Vec<NodeIndex> = state.node(node_idx).parents(state.edges_slice()).collect();
        if parents.is_empty() {
            level_by_index.insert(node_idx, 0);
            levels.entry(0).or_default().push(node_idx);
            continue;
        }
        let unexplored: Vec<NodeIndex> = parents
            .iter()
            .copied()
            .filter(|p| !level_by_index.contains_key(p))
            .collect();
        if !unexplored.is_empty() {
            stack.push(node_idx);
            stack.extend(unexplored);
            continue;
        }
        let level = 1 + parents.iter().map(|p| level_by_index[p]).max().unwrap();
        level_by_index.insert(node_idx, level);
        levels.entry(level).or_default().push(node_idx);
    }

    let mut sorted_levels: Vec<usize> = levels.keys().copied().collect();
    sorted_levels.sort_unstable();
    let mut order = Vec::with_capacity(state.node_count());
    for level in sorted_levels {
        let mut nodes = levels.remove(&level).unwrap();
        nodes.sort_by_key(|&n| state.node(n).gold_id.map(|g| g.0).unwrap_or(n.index() as u32));
        order.extend(nodes);
    }
    Ok(order)
}

/// Materializes `child` under `parent_out`, applying the narrow punctuation-collapse special
/// case: only when `child` has exactly one outgoing edge and that edge's target is a
/// punctuation terminal.
fn materialize_child(
    state: &State,
    passage: &mut Passage,
    materialized: &mut HashMap<NodeIndex, OutputTarget>,
    consumed: &mut std::collections::HashSet<NodeIndex>,
    parent_out: OutputNodeId,
    child_idx: NodeIndex,
    tag: EdgeTag,
) -> Result<(), StructuralFault> {
    let child = state.node(child_idx);
    if child.text.is_some() {
        let terminal_id = crate::passage::graph::TerminalId(child_idx.index() as u32);
        add_edge(passage, parent_out, OutputTarget::Terminal(terminal_id), tag, false);
        materialized.insert(child_idx, OutputTarget::Terminal(terminal_id));
        return Ok(());
    }

    if child.outgoing.len() == 1 {
        let only_edge = state.edge(child.outgoing[0]);
        let grandchild = state.node(only_edge.child);
        if !only_edge.remote {
            if let Some(gc_text) = &grandchild.text {
                if matches!(TerminalTag::classify(gc_text), TerminalTag::Punctuation) {
                    let group = new_output_node(passage, child.implicit, child.gold_id);
                    add_edge(passage, parent_out, OutputTarget::Node(group), EdgeTag::Punctuation, false);
                    let terminal_id = crate::passage::graph::TerminalId(only_edge.child.index() as u32);
                    add_edge(passage, group, OutputTarget::Terminal(terminal_id), EdgeTag::Terminal, false);
                    materialized.insert(child_idx, OutputTarget::Node(group));
                    materialized.insert(only_edge.child, OutputTarget::Terminal(terminal_id));
                    consumed.insert(only_edge.child);
                    return Ok(());
                }
            }
        }
    }

    let new_node = new_output_node(passage, child.implicit, child.gold_id);
    add_edge(passage, parent_out, OutputTarget::Node(new_node), tag, false);
    materialized.insert(child_idx, OutputTarget::Node(new_node));
    Ok(())
}

fn new_output_node(passage: &mut Passage, implicit: bool, orig_id: Option<crate::action::GoldRef>) -> OutputNodeId {
    let id = OutputNodeId(passage.nodes.len() as u32);
    passage.nodes.push(OutputNode {
        id,
        implicit,
        orig_id,
        outgoing: Vec::new(),
    });
    id
}

fn add_edge(passage: &mut Passage, parent: OutputNodeId, child: OutputTarget, tag: EdgeTag, remote: bool) {
    let edge_index = passage.edges.len();
    passage.edges.push(OutputEdge {
        parent,
        child,
        tag,
        remote,
    });
    passage.nodes[parent.0 as usize].outgoing.push(edge_index);
}
