use crate::schema::{EdgeData, EdgeKind, NodeData, NodeKind};
use codegraph_protocol::{GraphPayload, GraphStats};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;

/// One directed code graph for one repository.
///
/// Built once per full index; never mutated afterwards. Node iteration order
/// is insertion order, which keeps rebuilds from an unchanged element stream
/// byte-for-byte stable.
pub struct CodeGraph {
    graph: DiGraph<NodeData, EdgeData>,
    /// Node id -> index for O(1) lookup.
    id_index: HashMap<String, NodeIndex>,
}

impl CodeGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            id_index: HashMap::new(),
        }
    }

    /// Add a node, replacing the stored data if the id is already present
    /// (same file path + qualified name parsed twice).
    pub fn add_node(&mut self, node: NodeData) -> NodeIndex {
        if let Some(&idx) = self.id_index.get(&node.id) {
            self.graph[idx] = node;
            return idx;
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.id_index.insert(id, idx);
        idx
    }

    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, edge: EdgeData) {
        self.graph.add_edge(from, to, edge);
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.id_index.contains_key(node_id)
    }

    pub fn index_of(&self, node_id: &str) -> Option<NodeIndex> {
        self.id_index.get(node_id).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &NodeData {
        &self.graph[idx]
    }

    pub fn node_by_id(&self, node_id: &str) -> Option<&NodeData> {
        self.index_of(node_id).map(|idx| self.node(idx))
    }

    /// True if an edge of `kind` already connects the ordered pair.
    pub fn has_edge_of_kind(&self, from: NodeIndex, to: NodeIndex, kind: EdgeKind) -> bool {
        self.graph
            .edges(from)
            .any(|e| e.target() == to && e.weight().kind == kind)
    }

    /// Outgoing neighbors with their edge data, in edge insertion order.
    pub fn outgoing(&self, idx: NodeIndex) -> Vec<(NodeIndex, &EdgeData)> {
        let mut out: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.target(), e.weight()))
            .collect();
        // petgraph yields the most recently added edge first.
        out.reverse();
        out
    }

    /// Incoming neighbors with their edge data, in edge insertion order.
    pub fn incoming(&self, idx: NodeIndex) -> Vec<(NodeIndex, &EdgeData)> {
        let mut out: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| (e.source(), e.weight()))
            .collect();
        out.reverse();
        out
    }

    pub fn in_degree(&self, idx: NodeIndex) -> usize {
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .count()
    }

    pub fn out_degree(&self, idx: NodeIndex) -> usize {
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .count()
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &NodeData)> {
        self.graph
            .node_indices()
            .map(move |idx| (idx, &self.graph[idx]))
    }

    /// All edges as (source, target, data), in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&NodeData, &NodeData, &EdgeData)> {
        self.graph.edge_indices().map(move |idx| {
            let (from, to) = self
                .graph
                .edge_endpoints(idx)
                .expect("edge index from iteration is valid");
            (&self.graph[from], &self.graph[to], &self.graph[idx])
        })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Full inspection payload: every node and edge plus aggregate counts.
    pub fn to_payload(&self) -> GraphPayload {
        let nodes: Vec<_> = self.nodes().map(|(_, n)| n.to_payload()).collect();
        let edges: Vec<_> = self
            .edges()
            .map(|(from, to, e)| e.to_payload(&from.id, &to.id))
            .collect();

        let stats = GraphStats {
            node_count: nodes.len(),
            edge_count: edges.len(),
            module_count: self.count_kind(&[NodeKind::Module]),
            function_count: self.count_kind(&[NodeKind::Function, NodeKind::Method]),
            class_count: self.count_kind(&[NodeKind::Class]),
        };

        GraphPayload {
            nodes,
            edges,
            stats,
        }
    }

    fn count_kind(&self, kinds: &[NodeKind]) -> usize {
        self.nodes()
            .filter(|(_, n)| kinds.contains(&n.kind))
            .count()
    }
}

impl Default for CodeGraph {
    fn default() -> Self {
        Self::new()
    }
}
