use thiserror::Error;

pub type FlagResult<T> = Result<T, FlagError>;

#[derive(Error, Debug)]
pub enum FlagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Catalog parse error: {0}")]
    Parse(String),

    #[error("Allocation store error: {0}")]
    Store(String),

    #[error("Sync pass superseded by a visitor identity change")]
    StaleIdentity,

    #[error("Engine is in panic mode")]
    PanicMode,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
