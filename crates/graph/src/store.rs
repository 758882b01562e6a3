use crate::graph::CodeGraph;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Keyed storage of completed graphs, one per repository id.
///
/// `put` replaces the whole graph for an id in one step: readers holding an
/// `Arc` from an earlier `get` keep their snapshot, and nobody ever observes
/// a half-built graph under a stored id. There is no finer-grained mutation.
pub trait GraphStore: Send + Sync {
    fn get(&self, repo_id: &str) -> Option<Arc<CodeGraph>>;
    fn put(&self, repo_id: &str, graph: CodeGraph);
    fn delete(&self, repo_id: &str) -> bool;
    fn list(&self) -> Vec<String>;
}

/// Default process-local store. A durable backend can be substituted behind
/// the same trait without touching callers.
pub struct InMemoryGraphStore {
    graphs: RwLock<HashMap<String, Arc<CodeGraph>>>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self {
            graphs: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore for InMemoryGraphStore {
    fn get(&self, repo_id: &str) -> Option<Arc<CodeGraph>> {
        self.graphs
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(repo_id)
            .cloned()
    }

    fn put(&self, repo_id: &str, graph: CodeGraph) {
        self.graphs
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(repo_id.to_string(), Arc::new(graph));
    }

    fn delete(&self, repo_id: &str) -> bool {
        self.graphs
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(repo_id)
            .is_some()
    }

    fn list(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .graphs
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .cloned()
            .collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{node_id, NodeData, NodeKind};

    fn one_node_graph(name: &str) -> CodeGraph {
        let mut graph = CodeGraph::new();
        graph.add_node(NodeData {
            id: node_id("a.py", name),
            kind: NodeKind::Function,
            name: name.to_string(),
            qualified_name: name.to_string(),
            file_path: "a.py".to_string(),
            start_line: 1,
            end_line: 1,
            signature: None,
            docstring: None,
            source: None,
            metadata: serde_json::Map::new(),
        });
        graph
    }

    #[test]
    fn put_replaces_but_readers_keep_their_snapshot() {
        let store = InMemoryGraphStore::new();
        store.put("repo", one_node_graph("old"));

        let snapshot = store.get("repo").expect("first graph");
        store.put("repo", one_node_graph("new"));

        let replaced = store.get("repo").expect("second graph");
        assert_eq!(snapshot.nodes().next().expect("node").1.name, "old");
        assert_eq!(replaced.nodes().next().expect("node").1.name, "new");
    }

    #[test]
    fn delete_and_list() {
        let store = InMemoryGraphStore::new();
        store.put("b", one_node_graph("x"));
        store.put("a", one_node_graph("y"));

        assert_eq!(store.list(), vec!["a".to_string(), "b".to_string()]);
        assert!(store.delete("a"));
        assert!(!store.delete("a"));
        assert!(store.get("a").is_none());
    }
}
