//! # CodeGraph
//!
//! Turns a stream of parsed code elements into a navigable graph of code
//! entities and answers structural queries over it.
//!
//! ## Architecture
//!
//! ```text
//! ParsedElement[]
//!     │
//!     ├──> Graph Builder
//!     │      ├─ One Module node per file
//!     │      ├─ One node per code element (Contains edges)
//!     │      ├─ Heuristic call-edge inference (lexical)
//!     │      └─ Heuristic import-edge inference (lexical)
//!     │
//!     ├──> Code Graph (petgraph)
//!     │      ├─ Nodes: code entities with deterministic ids
//!     │      └─ Edges: typed relationships (contains, calls, imports, ...)
//!     │
//!     └──> Traversal Engine (read-only)
//!            ├─ BFS / DFS walks with depth and type filters
//!            ├─ Caller / callee search, path enumeration
//!            ├─ Execution-flow tracing
//!            └─ Keyword search over node text
//! ```
//!
//! The call/import edges are best-effort lexical inference, not semantic
//! analysis: false positives and false negatives are expected.

mod builder;
mod graph;
mod schema;
mod store;
mod traversal;

pub use builder::GraphBuilder;
pub use graph::CodeGraph;
pub use schema::{module_id, node_id, EdgeData, EdgeKind, NodeData, NodeKind};
pub use store::{GraphStore, InMemoryGraphStore};
pub use traversal::{
    BfsWalk, DfsWalk, GraphTraversal, NeighborRef, NodeContext, SearchHit, TraversalStep,
};
