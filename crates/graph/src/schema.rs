use codegraph_protocol::{EdgePayload, NodePayload};
use sha2::{Digest, Sha256};

pub use codegraph_protocol::{EdgeKind, NodeKind};

/// Hex length of a node identifier: 16 hex chars = 64 bits of hash space.
/// Collisions are accepted as statistically negligible, not eliminated.
const ID_HEX_LEN: usize = 16;

fn hex_encode_lower(bytes: &[u8]) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(bytes.len().saturating_mul(2));
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

fn truncated_sha256(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let mut hex = hex_encode_lower(&hasher.finalize());
    hex.truncate(ID_HEX_LEN);
    hex
}

/// Derive the identifier of a code entity node.
///
/// Pure function of `(file_path, qualified_name)`: the same inputs always
/// yield the same identifier across rebuilds.
pub fn node_id(file_path: &str, qualified_name: &str) -> String {
    truncated_sha256(&format!("{file_path}::{qualified_name}"))
}

/// Derive the identifier of a synthetic per-file Module node from the file
/// path alone.
pub fn module_id(file_path: &str) -> String {
    truncated_sha256(file_path)
}

/// One code entity stored in the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub id: String,
    pub kind: NodeKind,
    pub name: String,
    /// Dotted path within enclosing scopes; for Module nodes, the file's
    /// relative path.
    pub qualified_name: String,
    pub file_path: String,
    /// 1-indexed, inclusive.
    pub start_line: usize,
    pub end_line: usize,
    pub signature: Option<String>,
    pub docstring: Option<String>,
    pub source: Option<String>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl NodeData {
    /// Wire shape for node inspection. Source text stays internal.
    pub fn to_payload(&self) -> NodePayload {
        NodePayload {
            id: self.id.clone(),
            kind: self.kind,
            name: self.name.clone(),
            file_path: self.file_path.clone(),
            start_line: self.start_line,
            end_line: self.end_line,
            signature: self.signature.clone(),
            docstring: self.docstring.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

/// One directed relationship stored on a graph edge. Endpoints live in the
/// graph structure itself.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeData {
    pub kind: EdgeKind,
    pub weight: f64,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl EdgeData {
    pub fn new(kind: EdgeKind) -> Self {
        Self {
            kind,
            weight: 1.0,
            metadata: serde_json::Map::new(),
        }
    }

    pub fn to_payload(&self, source: &str, target: &str) -> EdgePayload {
        EdgePayload {
            source: source.to_string(),
            target: target.to_string(),
            kind: self.kind,
            metadata: self.metadata.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn node_id_is_deterministic() {
        let a = node_id("src/auth.py", "AuthService.login");
        let b = node_id("src/auth.py", "AuthService.login");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn node_id_varies_with_either_input() {
        let base = node_id("src/auth.py", "login");
        assert_ne!(base, node_id("src/auth.py", "logout"));
        assert_ne!(base, node_id("src/users.py", "login"));
    }

    #[test]
    fn module_id_ignores_qualified_name() {
        assert_eq!(module_id("src/auth.py"), module_id("src/auth.py"));
        assert_ne!(module_id("src/auth.py"), node_id("src/auth.py", ""));
    }
}
