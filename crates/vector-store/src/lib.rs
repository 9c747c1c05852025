//! # Beads Vector Store
//!
//! Content-addressed embedding index for issue documents.
//!
//! ## Architecture
//!
//! ```text
//! Issue[]
//!     │
//!     ├──> documents_from_issues
//!     │      └─> (id, searchable text)
//!     │
//!     ├──> Embedder (hash feature-hashing by default)
//!     │      └─> Vector[dim], L2-normalised once
//!     │
//!     ├──> VectorIndex
//!     │      ├─ id -> (vector, content digest)
//!     │      └─ top-k dot-product search
//!     │
//!     └──> Persistence
//!            └─ versioned binary blob, atomic rename on save
//! ```
//!
//! Sync is incremental: only documents whose content digest changed
//! are re-embedded, vanished IDs are dropped, and a cancellable
//! context bounds the pass.

mod embedder;
mod error;
mod index;
mod sync;

pub use embedder::{
    default_index_path, embedder_from_config, normalize_in_place, Embedder, EmbeddingConfig,
    HashEmbedder, DEFAULT_DIM, DEFAULT_EMBEDDER,
};
pub use error::{Result, VectorStoreError};
pub use index::{IndexEntry, VectorIndex};
pub use sync::{
    content_digest, documents_from_issues, sync_index, Document, SyncContext, SyncStats,
    DEFAULT_SYNC_BATCH, DEFAULT_SYNC_BUDGET,
};
