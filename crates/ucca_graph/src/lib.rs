//! A small, reusable directed-graph engine: adjacency storage, strongly-connected-component
//! discovery and cycle-checked topological sorting over an opaque node-id type.
//!
//! This crate carries no domain vocabulary of its own. It is infrastructure that a dependency
//! graph of any kind (build steps, execution order, grammatical structure, ...) can be built on
//! top of, the same way a scheduler's internal dependency graph is just a `DiGraph` with
//! scheduler-specific ids layered on top.

mod graph_map;
mod tarjan_scc;

pub use graph_map::{DiGraph, Direction, Graph, GraphNodeId, UnGraph};

use std::fmt;
use std::hash::BuildHasher;

use smallvec::SmallVec;

/// A directed acyclic graph: a [`DiGraph`] together with a cached topological ordering.
pub struct Dag<N: GraphNodeId, S: BuildHasher = std::collections::hash_map::RandomState> {
    /// The underlying directed graph.
    pub graph: DiGraph<N, S>,
    /// A cached topological ordering of the graph, valid as of the last call to
    /// [`Dag::retopologize`].
    pub topsort: Vec<N>,
}

impl<N: GraphNodeId, S: BuildHasher + Default> Default for Dag<N, S> {
    fn default() -> Self {
        Self {
            graph: DiGraph::default(),
            topsort: Vec::new(),
        }
    }
}

impl<N: GraphNodeId, S: BuildHasher + Default> Dag<N, S> {
    /// Recomputes [`Dag::topsort`] from the current graph, or reports the cycle that prevents one.
    pub fn retopologize(&mut self) -> Result<(), CycleError<N>> {
        self.topsort = topological_sort(&self.graph)?;
        Ok(())
    }
}

/// The graph could not be linearized because it contains a cycle.
#[derive(Debug, Clone)]
pub struct CycleError<N: GraphNodeId> {
    /// One strongly connected component of size greater than one, i.e. a set of nodes that
    /// are mutually reachable from each other and therefore cannot be ordered.
    pub cycle: SmallVec<[N; 4]>,
}

impl<N: GraphNodeId> fmt::Display for CycleError<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "graph contains a cycle among nodes {:?}", self.cycle)
    }
}

impl<N: GraphNodeId> std::error::Error for CycleError<N> {}

/// Computes a topological order of `graph`: every parent appears before every child.
///
/// Internally runs Tarjan's strongly-connected-components algorithm, which naturally yields a
/// reverse topological order for a DAG and also tells us, for free, whether the graph *is* a
/// DAG (every non-trivial SCC is a cycle).
pub fn topological_sort<N: GraphNodeId, S: BuildHasher>(
    graph: &DiGraph<N, S>,
) -> Result<Vec<N>, CycleError<N>> {
    if let Some((a, _)) = graph.all_edges().find(|(a, b)| a == b) {
        return Err(CycleError {
            cycle: SmallVec::from_slice(&[a]),
        });
    }

    // Tarjan's SCC algorithm returns components in *reverse* topological order.
    let mut top_sorted_nodes = Vec::with_capacity(graph.node_count());
    for scc in tarjan_scc::new_tarjan_scc(graph) {
        if scc.len() > 1 {
            return Err(CycleError { cycle: scc });
        }
        top_sorted_nodes.extend_from_slice(&scc);
    }
    top_sorted_nodes.reverse();
    Ok(top_sorted_nodes)
}

/// Returns `true` if `target` is reachable from `source` by following outgoing edges, including
/// `source == target` only if there is an actual cycle back to it.
pub fn is_reachable<N: GraphNodeId, S: BuildHasher>(
    graph: &DiGraph<N, S>,
    source: N,
    target: N,
) -> bool {
    let mut stack = vec![source];
    let mut seen = std::collections::HashSet::new();
    while let Some(node) = stack.pop() {
        if node == target {
            return true;
        }
        if !seen.insert(node) {
            continue;
        }
        stack.extend(graph.neighbors_directed(node, Direction::Outgoing));
    }
    false
}

/// A dense, arena-style node identifier: a plain index assigned in insertion order.
///
/// Unlike a scheduler that must distinguish several *kinds* of node sharing one id space (e.g.
/// systems and system sets) and therefore packs a discriminant into [`GraphNodeId::Adjacent`]
/// and [`GraphNodeId::Edge`], a graph with a single node kind needs no packing: the id itself
/// is the payload.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIndex(u32);

impl NodeIndex {
    /// Constructs a `NodeIndex` from a raw position.
    pub const fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// The raw position this id was constructed from.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeIndex({})", self.0)
    }
}

impl GraphNodeId for NodeIndex {
    type Adjacent = (NodeIndex, Direction);
    type Edge = (NodeIndex, NodeIndex);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(i: usize) -> NodeIndex {
        NodeIndex::new(i)
    }

    #[test]
    fn topological_sort_orders_parents_before_children() {
        let mut g = DiGraph::<NodeIndex>::default();
        for i in 0..4 {
            g.add_node(n(i));
        }
        g.add_edge(n(0), n(1));
        g.add_edge(n(0), n(2));
        g.add_edge(n(1), n(3));
        g.add_edge(n(2), n(3));

        let order = topological_sort(&g).unwrap();
        let pos = |x: NodeIndex| order.iter().position(|&y| y == x).unwrap();
        assert!(pos(n(0)) < pos(n(1)));
        assert!(pos(n(0)) < pos(n(2)));
        assert!(pos(n(1)) < pos(n(3)));
        assert!(pos(n(2)) < pos(n(3)));
    }

    #[test]
    fn topological_sort_rejects_cycles() {
        let mut g = DiGraph::<NodeIndex>::default();
        for i in 0..3 {
            g.add_node(n(i));
        }
        g.add_edge(n(0), n(1));
        g.add_edge(n(1), n(2));
        g.add_edge(n(2), n(0));

        let err = topological_sort(&g).unwrap_err();
        assert_eq!(err.cycle.len(), 3);
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let mut g = DiGraph::<NodeIndex>::default();
        g.add_node(n(0));
        g.add_edge(n(0), n(0));

        assert!(topological_sort(&g).is_err());
    }

    #[test]
    fn is_reachable_follows_outgoing_edges() {
        let mut g = DiGraph::<NodeIndex>::default();
        for i in 0..3 {
            g.add_node(n(i));
        }
        g.add_edge(n(0), n(1));
        g.add_edge(n(1), n(2));

        assert!(is_reachable(&g, n(0), n(2)));
        assert!(!is_reachable(&g, n(2), n(0)));
    }
}
