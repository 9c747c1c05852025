use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Self-loop on issue {0:?}")]
    SelfLoop(String),

    #[error("Phase 2 unavailable: {0}")]
    Phase2Unavailable(String),

    #[error("{0}")]
    Other(String),
}
