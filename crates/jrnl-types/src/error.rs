use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("title must not be empty")]
    EmptyTitle,

    #[error("title is {len} bytes (max {max})")]
    TitleTooLong { len: usize, max: usize },

    #[error("message is {len} bytes (max {max})")]
    MessageTooLong { len: usize, max: usize },

    #[error("unknown cluster: {0}")]
    UnknownCluster(String),

    #[error("unknown commitment level: {0}")]
    UnknownCommitment(String),
}
