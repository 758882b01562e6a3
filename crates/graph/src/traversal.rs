use crate::graph::CodeGraph;
use crate::schema::{EdgeKind, NodeData, NodeKind};
use petgraph::graph::NodeIndex;
use std::collections::{HashSet, VecDeque};

/// One visited-node record yielded by a graph walk.
#[derive(Debug, Clone, PartialEq)]
pub struct TraversalStep {
    pub node_id: String,
    pub node: NodeData,
    /// Distance from the walk's start node, in edges.
    pub depth: usize,
    /// Node ids from the start node to this node, inclusive.
    pub path: Vec<String>,
    /// Type of the edge used to arrive here; `None` for the start node.
    pub edge_kind: Option<EdgeKind>,
}

/// One direct neighbor of a node, with the edge that connects them.
#[derive(Debug, Clone)]
pub struct NeighborRef {
    pub node_id: String,
    pub node: NodeData,
    pub edge_kind: EdgeKind,
}

/// One-hop context around a node.
#[derive(Debug, Clone)]
pub struct NodeContext {
    pub node: NodeData,
    pub predecessors: Vec<NeighborRef>,
    pub successors: Vec<NeighborRef>,
    pub in_degree: usize,
    pub out_degree: usize,
}

/// One keyword-search match.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub node_id: String,
    pub node: NodeData,
    /// 1.0 for an exact (case-insensitive) name match, else 0.5.
    pub score: f64,
}

/// Read-only multi-hop query layer over one [`CodeGraph`].
pub struct GraphTraversal<'g> {
    graph: &'g CodeGraph,
}

struct Pending {
    idx: NodeIndex,
    depth: usize,
    path: Vec<String>,
    edge_kind: Option<EdgeKind>,
}

/// Lazy breadth-first walk. Nodes are recorded as visited when enqueued, so
/// each is yielded at most once.
pub struct BfsWalk<'g> {
    graph: &'g CodeGraph,
    queue: VecDeque<Pending>,
    visited: HashSet<NodeIndex>,
    max_depth: usize,
    edge_filter: Option<Vec<EdgeKind>>,
    node_filter: Option<Vec<NodeKind>>,
}

impl Iterator for BfsWalk<'_> {
    type Item = TraversalStep;

    fn next(&mut self) -> Option<TraversalStep> {
        while let Some(pending) = self.queue.pop_front() {
            let node = self.graph.node(pending.idx);

            // A node that fails the filter already counts as visited: it is
            // neither yielded nor expanded, a traversal dead end.
            if let Some(kinds) = &self.node_filter {
                if !kinds.contains(&node.kind) {
                    continue;
                }
            }

            // Depth bound is inclusive: nodes at exactly max_depth are
            // yielded but never expanded.
            if pending.depth < self.max_depth {
                for (succ, edge) in self.graph.outgoing(pending.idx) {
                    if self.visited.contains(&succ) {
                        continue;
                    }
                    if let Some(kinds) = &self.edge_filter {
                        if !kinds.contains(&edge.kind) {
                            continue;
                        }
                    }
                    self.visited.insert(succ);
                    let mut path = pending.path.clone();
                    path.push(self.graph.node(succ).id.clone());
                    self.queue.push_back(Pending {
                        idx: succ,
                        depth: pending.depth + 1,
                        path,
                        edge_kind: Some(edge.kind),
                    });
                }
            }

            return Some(TraversalStep {
                node_id: node.id.clone(),
                node: node.clone(),
                depth: pending.depth,
                path: pending.path,
                edge_kind: pending.edge_kind,
            });
        }
        None
    }
}

/// Lazy depth-first walk over an explicit stack. Visited state is checked at
/// pop time, so a node pushed twice is still yielded once.
pub struct DfsWalk<'g> {
    graph: &'g CodeGraph,
    stack: Vec<Pending>,
    visited: HashSet<NodeIndex>,
    max_depth: usize,
    edge_filter: Option<Vec<EdgeKind>>,
}

impl Iterator for DfsWalk<'_> {
    type Item = TraversalStep;

    fn next(&mut self) -> Option<TraversalStep> {
        while let Some(pending) = self.stack.pop() {
            if !self.visited.insert(pending.idx) {
                continue;
            }
            let node = self.graph.node(pending.idx);

            if pending.depth < self.max_depth {
                for (succ, edge) in self.graph.outgoing(pending.idx) {
                    if self.visited.contains(&succ) {
                        continue;
                    }
                    if let Some(kinds) = &self.edge_filter {
                        if !kinds.contains(&edge.kind) {
                            continue;
                        }
                    }
                    let mut path = pending.path.clone();
                    path.push(self.graph.node(succ).id.clone());
                    self.stack.push(Pending {
                        idx: succ,
                        depth: pending.depth + 1,
                        path,
                        edge_kind: Some(edge.kind),
                    });
                }
            }

            return Some(TraversalStep {
                node_id: node.id.clone(),
                node: node.clone(),
                depth: pending.depth,
                path: pending.path,
                edge_kind: pending.edge_kind,
            });
        }
        None
    }
}

impl<'g> GraphTraversal<'g> {
    pub fn new(graph: &'g CodeGraph) -> Self {
        Self { graph }
    }

    /// Breadth-first walk from `start`, at most `max_depth` edges out.
    ///
    /// An unknown start node yields an empty walk.
    pub fn bfs(
        &self,
        start: &str,
        max_depth: usize,
        edge_filter: Option<&[EdgeKind]>,
        node_filter: Option<&[NodeKind]>,
    ) -> BfsWalk<'g> {
        let mut queue = VecDeque::new();
        let mut visited = HashSet::new();
        if let Some(idx) = self.graph.index_of(start) {
            visited.insert(idx);
            queue.push_back(Pending {
                idx,
                depth: 0,
                path: vec![start.to_string()],
                edge_kind: None,
            });
        }
        BfsWalk {
            graph: self.graph,
            queue,
            visited,
            max_depth,
            edge_filter: edge_filter.map(<[_]>::to_vec),
            node_filter: node_filter.map(<[_]>::to_vec),
        }
    }

    /// Depth-first walk from `start`, at most `max_depth` edges out.
    pub fn dfs(
        &self,
        start: &str,
        max_depth: usize,
        edge_filter: Option<&[EdgeKind]>,
    ) -> DfsWalk<'g> {
        let mut stack = Vec::new();
        if let Some(idx) = self.graph.index_of(start) {
            stack.push(Pending {
                idx,
                depth: 0,
                path: vec![start.to_string()],
                edge_kind: None,
            });
        }
        DfsWalk {
            graph: self.graph,
            stack,
            visited: HashSet::new(),
            max_depth,
            edge_filter: edge_filter.map(<[_]>::to_vec),
        }
    }

    /// All simple directed paths from `source` to `target` with at most
    /// `max_depth` edges. Unknown or unreachable endpoints give an empty
    /// result, never an error.
    pub fn find_paths(&self, source: &str, target: &str, max_depth: usize) -> Vec<Vec<String>> {
        let (Some(src), Some(dst)) = (self.graph.index_of(source), self.graph.index_of(target))
        else {
            return Vec::new();
        };

        let mut paths = Vec::new();
        let mut on_path = HashSet::new();
        on_path.insert(src);
        let mut path = vec![source.to_string()];
        self.collect_paths(src, dst, max_depth, &mut on_path, &mut path, &mut paths);
        paths
    }

    fn collect_paths(
        &self,
        current: NodeIndex,
        target: NodeIndex,
        remaining: usize,
        on_path: &mut HashSet<NodeIndex>,
        path: &mut Vec<String>,
        out: &mut Vec<Vec<String>>,
    ) {
        if current == target {
            out.push(path.clone());
            return;
        }
        if remaining == 0 {
            return;
        }
        for (succ, _) in self.graph.outgoing(current) {
            if on_path.contains(&succ) {
                continue;
            }
            on_path.insert(succ);
            path.push(self.graph.node(succ).id.clone());
            self.collect_paths(succ, target, remaining - 1, on_path, path, out);
            path.pop();
            on_path.remove(&succ);
        }
    }

    /// Breadth-first walk over the reverse adjacency, restricted to edges
    /// whose forward-direction type is Calls. Steps carry the
    /// caller-to-target path; the target itself is not included.
    pub fn find_callers(&self, node_id: &str, max_depth: usize) -> Vec<TraversalStep> {
        let Some(start) = self.graph.index_of(node_id) else {
            return Vec::new();
        };

        let mut callers = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(start);
        let mut queue: VecDeque<(NodeIndex, usize, Vec<String>)> = VecDeque::new();
        queue.push_back((start, 0, vec![node_id.to_string()]));

        while let Some((current, depth, path)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            for (pred, edge) in self.graph.incoming(current) {
                if visited.contains(&pred) {
                    continue;
                }
                if edge.kind != EdgeKind::Calls {
                    continue;
                }
                visited.insert(pred);
                let pred_node = self.graph.node(pred);
                let mut new_path = Vec::with_capacity(path.len() + 1);
                new_path.push(pred_node.id.clone());
                new_path.extend(path.iter().cloned());

                callers.push(TraversalStep {
                    node_id: pred_node.id.clone(),
                    node: pred_node.clone(),
                    depth: depth + 1,
                    path: new_path.clone(),
                    edge_kind: Some(EdgeKind::Calls),
                });
                queue.push_back((pred, depth + 1, new_path));
            }
        }
        callers
    }

    /// Everything reachable from `node_id` over Calls edges, excluding the
    /// start node itself.
    pub fn find_callees(&self, node_id: &str, max_depth: usize) -> Vec<TraversalStep> {
        self.bfs(node_id, max_depth, Some(&[EdgeKind::Calls]), None)
            .filter(|step| step.node_id != node_id)
            .collect()
    }

    /// Depth-first trace along Calls edges with a single global visited set
    /// and a single global step budget shared across all branches: diamonds
    /// and cycles are flattened into one linear record rather than a call
    /// tree. Runs on an explicit work stack.
    pub fn trace_execution_flow(&self, entry: &str, max_steps: usize) -> Vec<TraversalStep> {
        let Some(start) = self.graph.index_of(entry) else {
            return Vec::new();
        };

        let mut flow = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![(start, 0usize, vec![entry.to_string()])];

        while let Some((idx, depth, path)) = stack.pop() {
            if flow.len() >= max_steps {
                break;
            }
            if !visited.insert(idx) {
                continue;
            }
            let node = self.graph.node(idx);
            flow.push(TraversalStep {
                node_id: node.id.clone(),
                node: node.clone(),
                depth,
                path: path.clone(),
                edge_kind: None,
            });

            let callees: Vec<NodeIndex> = self
                .graph
                .outgoing(idx)
                .into_iter()
                .filter(|(_, edge)| edge.kind == EdgeKind::Calls)
                .map(|(succ, _)| succ)
                .collect();
            // Reversed push so the first callee is traced first.
            for succ in callees.into_iter().rev() {
                let mut next_path = path.clone();
                next_path.push(self.graph.node(succ).id.clone());
                stack.push((succ, depth + 1, next_path));
            }
        }
        flow
    }

    /// One-hop predecessors and successors plus degrees.
    ///
    /// `_context_depth` is accepted for API compatibility but does not affect
    /// the result: context is always a single hop. Known inconsistency.
    pub fn node_context(&self, node_id: &str, _context_depth: usize) -> Option<NodeContext> {
        let idx = self.graph.index_of(node_id)?;
        let node = self.graph.node(idx);

        let predecessors = self
            .graph
            .incoming(idx)
            .into_iter()
            .map(|(pred, edge)| NeighborRef {
                node_id: self.graph.node(pred).id.clone(),
                node: self.graph.node(pred).clone(),
                edge_kind: edge.kind,
            })
            .collect();
        let successors = self
            .graph
            .outgoing(idx)
            .into_iter()
            .map(|(succ, edge)| NeighborRef {
                node_id: self.graph.node(succ).id.clone(),
                node: self.graph.node(succ).clone(),
                edge_kind: edge.kind,
            })
            .collect();

        Some(NodeContext {
            node: node.clone(),
            predecessors,
            successors,
            in_degree: self.graph.in_degree(idx),
            out_degree: self.graph.out_degree(idx),
        })
    }

    /// Case-insensitive substring search over name, qualified name,
    /// signature, and docstring.
    ///
    /// The scan runs in graph node order and stops once `limit` matches are
    /// collected; only that subset is then sorted by score (stable on ties).
    /// An exact-name match that appears after the cap is never seen, so the
    /// result is the first `limit` matches in structural order, not the
    /// globally best-scoring `limit`.
    pub fn search_nodes(
        &self,
        query: &str,
        node_filter: Option<&[NodeKind]>,
        limit: usize,
    ) -> Vec<SearchHit> {
        let query_lower = query.to_lowercase();
        let mut hits: Vec<SearchHit> = Vec::new();

        for (_, node) in self.graph.nodes() {
            if hits.len() >= limit {
                break;
            }
            if let Some(kinds) = node_filter {
                if !kinds.contains(&node.kind) {
                    continue;
                }
            }
            let haystack = format!(
                "{} {} {} {}",
                node.name,
                node.qualified_name,
                node.signature.as_deref().unwrap_or(""),
                node.docstring.as_deref().unwrap_or("")
            )
            .to_lowercase();
            if haystack.contains(&query_lower) {
                let score = if node.name.to_lowercase() == query_lower {
                    1.0
                } else {
                    0.5
                };
                hits.push(SearchHit {
                    node_id: node.id.clone(),
                    node: node.clone(),
                    score,
                });
            }
        }

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits
    }
}
