use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid WHERE clause: {0}")]
    InvalidWhereClause(String),

    #[error("Invalid limit: {0}")]
    InvalidLimit(String),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}
