//! # CodeGraph Oracle
//!
//! The uniform chat capability consumed by the reasoning agent: an ordered
//! message exchange returning free text. Which backend answers (and how it is
//! wired, authenticated, or rate limited) is a deployment concern that lives
//! behind the [`ChatOracle`] trait.

mod error;

pub use error::{OracleError, Result};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Chat message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// A language-reasoning backend.
///
/// Implementations must be usable from multiple tasks; the agent issues at
/// most one call at a time per query, but separate queries may overlap.
#[async_trait]
pub trait ChatOracle: Send + Sync {
    /// Send an ordered message exchange and return the reply text.
    ///
    /// Errors propagate unmodified out of the agent loop and abort the whole
    /// query; there is no retry or graceful degradation at this layer.
    async fn chat(&self, messages: &[Message]) -> Result<String>;
}
