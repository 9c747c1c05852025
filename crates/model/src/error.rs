use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid snapshot: {0}")]
    SnapshotInvalid(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
