//! # CodeGraph Protocol
//!
//! Shared wire types for the code graph pipeline:
//!
//! - [`ParsedElement`] — one entry in the parsed-element stream consumed by
//!   the graph builder (the parsing layer that produces it lives upstream).
//! - [`NodePayload`] / [`EdgePayload`] / [`GraphPayload`] — JSON shapes for
//!   node/edge inspection.
//! - [`Citation`] / [`ReasoningStep`] / [`QueryResponse`] — the answer
//!   payload produced by the reasoning agent.
//!
//! Everything here is plain data: no behavior beyond serialization.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Kind of a code entity node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Module,
    Class,
    Function,
    Method,
    Variable,
    Import,
    Parameter,
}

impl NodeKind {
    /// Lowercase label, matching the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Module => "module",
            NodeKind::Class => "class",
            NodeKind::Function => "function",
            NodeKind::Method => "method",
            NodeKind::Variable => "variable",
            NodeKind::Import => "import",
            NodeKind::Parameter => "parameter",
        }
    }
}

/// Kind of a directed relationship between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Module/class contains a function/class
    Contains,
    /// Function calls another function
    Calls,
    /// Module imports another module
    Imports,
    /// Class inherits from another class
    Inherits,
    /// Code references a variable/function
    References,
    /// Scope defines a variable
    Defines,
    /// Function returns a type
    Returns,
    /// Parameter belongs to a function
    ParameterOf,
}

/// One parsed code element, as emitted by the upstream parsing layer.
///
/// `kind` is an open string on purpose: the builder maps known kinds to
/// [`NodeKind`] and falls back to `Function` for anything it does not
/// recognize, so an unknown kind is never a protocol error.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ParsedElement {
    pub kind: String,
    pub name: String,
    pub qualified_name: String,
    pub file_path: String,
    pub start_line: usize,
    pub end_line: usize,
    pub signature: Option<String>,
    pub docstring: Option<String>,
    pub source: Option<String>,
    /// Qualified name of the enclosing scope (e.g. the class a method
    /// belongs to), when the parser knows it.
    pub enclosing_scope: Option<String>,
}

/// JSON shape of one graph node.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NodePayload {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub name: String,
    pub file_path: String,
    pub start_line: usize,
    pub end_line: usize,
    pub signature: Option<String>,
    pub docstring: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// JSON shape of one graph edge.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EdgePayload {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Aggregate counts attached to a full graph payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub module_count: usize,
    /// Functions plus methods.
    pub function_count: usize,
    pub class_count: usize,
}

/// Full graph inspection payload for one repository.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GraphPayload {
    pub nodes: Vec<NodePayload>,
    pub edges: Vec<EdgePayload>,
    pub stats: GraphStats,
}

/// A grounding reference attached to an answer: where in the repository the
/// evidence came from.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Citation {
    pub file_path: String,
    pub start_line: usize,
    pub end_line: usize,
    /// Source text if the node carried it, else its signature, else empty.
    pub content: String,
    pub node_type: Option<NodeKind>,
    pub node_name: Option<String>,
}

/// One logged action in the agent's reasoning trace.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReasoningStep {
    /// Sequential, starting at 1.
    pub step_number: usize,
    /// One of `search`, `navigate`, `answer`, `done`.
    pub action: String,
    pub node_visited: Option<String>,
    pub observation: Option<String>,
}

/// Final payload for one answered question.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QueryResponse {
    pub answer: String,
    pub citations: Vec<Citation>,
    pub reasoning_steps: Vec<ReasoningStep>,
    /// In `[0, 1]`.
    pub confidence: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_payload_uses_literal_field_names() {
        let payload = NodePayload {
            id: "abc123".to_string(),
            kind: NodeKind::Function,
            name: "foo".to_string(),
            file_path: "src/lib.rs".to_string(),
            start_line: 1,
            end_line: 4,
            signature: Some("fn foo()".to_string()),
            docstring: None,
            metadata: serde_json::Map::new(),
        };

        let value = serde_json::to_value(&payload).expect("serialize");
        assert_eq!(value["type"], "function");
        assert_eq!(value["file_path"], "src/lib.rs");
        assert_eq!(value["start_line"], 1);
        assert_eq!(value["end_line"], 4);
        assert!(value.get("kind").is_none());
    }

    #[test]
    fn edge_kind_round_trips_snake_case() {
        let raw = serde_json::to_string(&EdgeKind::ParameterOf).expect("serialize");
        assert_eq!(raw, "\"parameter_of\"");
        let back: EdgeKind = serde_json::from_str(&raw).expect("deserialize");
        assert_eq!(back, EdgeKind::ParameterOf);
    }
}
