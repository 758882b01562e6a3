use crate::graph::CodeGraph;
use crate::schema::{module_id, node_id, EdgeData, EdgeKind, NodeData, NodeKind};
use codegraph_protocol::ParsedElement;
use once_cell::sync::Lazy;
use petgraph::graph::NodeIndex;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Lexical pattern for "identifier immediately followed by an opening
/// parenthesis". No scope resolution, no shadowing or overload handling.
static CALL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)\s*\(").expect("valid call pattern"));

/// Keyword-anchored pattern for "from X" / "import X".
static IMPORT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:from|import)\s+(\w+)").expect("valid import pattern"));

/// Builds one [`CodeGraph`] per repository from a parsed-element stream.
///
/// Construction is single-pass over the elements, followed by two heuristic
/// inference passes (calls, imports). Unreadable files cost a module its line
/// count but never abort the build.
#[derive(Clone)]
pub struct GraphBuilder {
    /// Repository root used to resolve relative file paths for line counts.
    root: Option<PathBuf>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self { root: None }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Build a complete code graph from parsed elements.
    pub fn build(&self, repo_id: &str, elements: &[ParsedElement]) -> CodeGraph {
        log::info!("Building graph for repository: {repo_id}");

        let mut graph = CodeGraph::new();

        // Group elements by file, preserving first-seen file order so that
        // rebuilds from an unchanged stream produce identical graphs.
        let mut file_order: Vec<String> = Vec::new();
        let mut by_file: HashMap<String, Vec<&ParsedElement>> = HashMap::new();
        for element in elements {
            if !by_file.contains_key(&element.file_path) {
                file_order.push(element.file_path.clone());
            }
            by_file
                .entry(element.file_path.clone())
                .or_default()
                .push(element);
        }

        for file_path in &file_order {
            let module_idx = self.add_module_node(&mut graph, file_path);

            for element in &by_file[file_path] {
                let idx = graph.add_node(NodeData {
                    id: node_id(file_path, &element.qualified_name),
                    kind: map_kind(&element.kind),
                    name: element.name.clone(),
                    qualified_name: element.qualified_name.clone(),
                    file_path: file_path.clone(),
                    start_line: element.start_line,
                    end_line: element.end_line,
                    signature: element.signature.clone(),
                    docstring: element.docstring.clone(),
                    source: element.source.clone(),
                    metadata: serde_json::Map::new(),
                });

                graph.add_edge(module_idx, idx, EdgeData::new(EdgeKind::Contains));

                // Single-pass construction: the enclosing scope's node must
                // already exist at this point, or the edge is skipped.
                if let Some(scope) = &element.enclosing_scope {
                    if let Some(parent_idx) = graph.index_of(&node_id(file_path, scope)) {
                        graph.add_edge(parent_idx, idx, EdgeData::new(EdgeKind::Contains));
                    }
                }
            }
        }

        self.infer_call_edges(&mut graph);
        self.infer_import_edges(&mut graph);

        log::info!(
            "Built graph with {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        graph
    }

    fn add_module_node(&self, graph: &mut CodeGraph, file_path: &str) -> NodeIndex {
        let name = Path::new(file_path)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_path.to_string());

        graph.add_node(NodeData {
            id: module_id(file_path),
            kind: NodeKind::Module,
            name,
            qualified_name: file_path.to_string(),
            file_path: file_path.to_string(),
            start_line: 1,
            end_line: self.count_lines(file_path),
            signature: None,
            docstring: None,
            source: None,
            metadata: serde_json::Map::new(),
        })
    }

    fn count_lines(&self, file_path: &str) -> usize {
        let resolved = match &self.root {
            Some(root) => root.join(file_path),
            None => PathBuf::from(file_path),
        };
        match std::fs::read_to_string(&resolved) {
            Ok(text) => text.lines().count(),
            Err(err) => {
                log::warn!(
                    "Failed to count lines in {}: {err}",
                    resolved.display()
                );
                0
            }
        }
    }

    /// Scan Function/Method source text for call-shaped identifiers and link
    /// them to known functions by bare name. A name collision resolves to
    /// whichever node was registered last for that name.
    fn infer_call_edges(&self, graph: &mut CodeGraph) {
        let mut by_name: HashMap<String, NodeIndex> = HashMap::new();
        for (idx, node) in graph.nodes() {
            if matches!(node.kind, NodeKind::Function | NodeKind::Method) {
                by_name.insert(node.name.clone(), idx);
            }
        }

        let mut candidates: Vec<(NodeIndex, NodeIndex)> = Vec::new();
        for (idx, node) in graph.nodes() {
            if !matches!(node.kind, NodeKind::Function | NodeKind::Method) {
                continue;
            }
            let Some(source) = node.source.as_deref() else {
                continue;
            };
            for caps in CALL_PATTERN.captures_iter(source) {
                let callee = &caps[1];
                if callee == node.name {
                    continue;
                }
                if let Some(&target) = by_name.get(callee) {
                    candidates.push((idx, target));
                }
            }
        }

        for (from, to) in candidates {
            // At most one Calls edge per ordered pair.
            if !graph.has_edge_of_kind(from, to, EdgeKind::Calls) {
                graph.add_edge(from, to, EdgeData::new(EdgeKind::Calls));
            }
        }
    }

    /// Link importing modules to imported modules by base name, using each
    /// Import node's signature text.
    fn infer_import_edges(&self, graph: &mut CodeGraph) {
        let mut modules: HashMap<String, NodeIndex> = HashMap::new();
        for (idx, node) in graph.nodes() {
            if node.kind == NodeKind::Module {
                modules.insert(node.name.clone(), idx);
            }
        }

        let mut candidates: Vec<(NodeIndex, NodeIndex)> = Vec::new();
        for (idx, node) in graph.nodes() {
            if node.kind != NodeKind::Import {
                continue;
            }
            let Some(signature) = node.signature.as_deref() else {
                continue;
            };
            for caps in IMPORT_PATTERN.captures_iter(signature) {
                let Some(&target) = modules.get(&caps[1]) else {
                    continue;
                };
                if let Some(source_module) = enclosing_module(graph, idx) {
                    candidates.push((source_module, target));
                }
            }
        }

        for (from, to) in candidates {
            graph.add_edge(from, to, EdgeData::new(EdgeKind::Imports));
        }
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn map_kind(kind: &str) -> NodeKind {
    match kind {
        "function" => NodeKind::Function,
        "class" => NodeKind::Class,
        "method" => NodeKind::Method,
        "import" => NodeKind::Import,
        "variable" => NodeKind::Variable,
        // Explicit fallback, not an error.
        _ => NodeKind::Function,
    }
}

/// The Module directly containing a node: a single hop over incoming
/// Contains edges, not a recursive ancestor search.
fn enclosing_module(graph: &CodeGraph, idx: NodeIndex) -> Option<NodeIndex> {
    graph
        .incoming(idx)
        .into_iter()
        .find(|(pred, edge)| {
            edge.kind == EdgeKind::Contains && graph.node(*pred).kind == NodeKind::Module
        })
        .map(|(pred, _)| pred)
}
