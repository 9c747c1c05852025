use thiserror::Error;

pub type Result<T> = std::result::Result<T, VectorStoreError>;

#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("Index dimension mismatch: expected {expected}, got {actual}")]
    DimMismatch { expected: usize, actual: usize },

    #[error("Index IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Corrupt index file: {0}")]
    Corrupt(String),

    #[error("Unsupported index version {0}")]
    UnsupportedVersion(u32),

    #[error("Embedder error: {0}")]
    EmbedderError(String),

    #[error("Sync budget exhausted")]
    Timeout,

    #[error("Sync cancelled")]
    Cancelled,
}
