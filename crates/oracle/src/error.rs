use thiserror::Error;

pub type Result<T> = std::result::Result<T, OracleError>;

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("oracle request failed: {0}")]
    RequestFailed(String),

    #[error("{0}")]
    Other(String),
}
