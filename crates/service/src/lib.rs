//! # CodeGraph Service
//!
//! Owns the build/replace lifecycle of repository graphs and fronts the two
//! read paths: full-graph inspection and agent-backed questions.
//!
//! Graph construction is CPU-bound and runs on the blocking pool; queries
//! only await the oracle. A status gate keeps queries away from repositories
//! whose graph is being rebuilt, since the graph core itself does no locking.

mod error;
mod service;

pub use error::{Result, ServiceError};
pub use service::CodeGraphService;
