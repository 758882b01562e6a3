use codegraph_oracle::OracleError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AgentError>;

#[derive(Error, Debug)]
pub enum AgentError {
    /// Oracle failures abort the whole query unmodified; the agent does not
    /// retry or degrade.
    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("query deadline exceeded")]
    DeadlineExceeded,
}
