use codegraph_agent::AgentError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Error, Debug)]
pub enum ServiceError {
    /// Unknown repository id: a client-visible not-found condition.
    #[error("repository not found: {0}")]
    NotFound(String),

    /// A rebuild for this repository id is in progress; retry later.
    #[error("repository is being indexed: {0}")]
    RepositoryIndexing(String),

    #[error("graph build failed for {repo_id}: {reason}")]
    BuildFailed { repo_id: String, reason: String },

    /// Agent/oracle failures propagate unmodified.
    #[error(transparent)]
    Agent(#[from] AgentError),
}
