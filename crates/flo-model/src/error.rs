use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("concurrency limit must be a positive integer, got 0")]
    ZeroLimit,
    #[error("invalid concurrency limit: {0} (expected: positive integer|unbounded)")]
    InvalidLimit(String),
    #[error("environment variable {var} is not valid unicode")]
    NonUnicodeEnv { var: String },
}
