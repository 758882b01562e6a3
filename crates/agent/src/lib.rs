//! # CodeGraph Agent
//!
//! A bounded multi-hop reasoning loop over a code graph:
//!
//! ```text
//! Planning ──> Navigating (loop) ──> Answering ──> Done
//!    │              │                    │
//!    │ keyword      │ one-hop context    │ synthesis over
//!    │ search       │ + oracle decision  │ accumulated citations
//! ```
//!
//! The agent's only evidence source is the traversal engine; its only
//! decision source is the [`ChatOracle`](codegraph_oracle::ChatOracle). Each
//! pass consults the oracle once, so a run issues at most
//! `max_iterations + 1` oracle calls.

mod agent;
mod error;
mod prompts;

pub use agent::{ReasoningAgent, DEFAULT_MAX_ITERATIONS, NO_ANSWER_SENTINEL};
pub use error::{AgentError, Result};
