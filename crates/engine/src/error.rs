use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Snapshot error: {0}")]
    Model(#[from] beads_model::ModelError),

    #[error("Graph error: {0}")]
    Graph(#[from] beads_graph::GraphError),

    #[error("Search error: {0}")]
    Search(#[from] beads_search::SearchError),

    #[error("Vector store error: {0}")]
    VectorStore(#[from] beads_vector_store::VectorStoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Query embedding timed out")]
    QueryTimeout,
}
