use crate::embedder::{normalize_in_place, Embedder};
use crate::error::{Result, VectorStoreError};
use crate::index::{IndexEntry, VectorIndex};
use beads_model::Issue;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default wall-clock budget for one sync pass.
pub const DEFAULT_SYNC_BUDGET: Duration = Duration::from_secs(30);

/// Default embedding batch size.
pub const DEFAULT_SYNC_BATCH: usize = 64;

/// Cooperative cancellation and deadline for a sync pass. Checked
/// between embedding batches, never mid-batch, so the embedder
/// contract stays simple.
#[derive(Clone)]
pub struct SyncContext {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl SyncContext {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: None,
        }
    }

    pub fn with_timeout(budget: Duration) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(Instant::now() + budget),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(VectorStoreError::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(VectorStoreError::Timeout);
            }
        }
        Ok(())
    }
}

impl Default for SyncContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    pub unchanged: usize,
}

impl SyncStats {
    /// True iff the pass mutated the index.
    pub fn changed(&self) -> bool {
        self.added > 0 || self.updated > 0 || self.removed > 0
    }
}

/// A document to embed: stable ID plus its searchable content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub content: String,
}

/// Ordered documents for a set of issues, using each issue's
/// searchable text.
pub fn documents_from_issues(issues: &[Issue]) -> Vec<Document> {
    issues
        .iter()
        .map(|issue| Document {
            id: issue.id.clone(),
            content: issue.search_document(),
        })
        .collect()
}

pub fn content_digest(content: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hasher.finalize().into()
}

/// Bring `index` in line with `docs`.
///
/// Unknown IDs are embedded and added; entries whose stored content
/// digest differs are re-embedded; entries whose ID vanished from
/// `docs` are removed. Work is batched through the embedder; the
/// context is consulted between batches. On any error the prior index
/// state is preserved — changes publish only after the pass completes.
pub async fn sync_index(
    ctx: &SyncContext,
    index: &mut VectorIndex,
    embedder: &dyn Embedder,
    docs: &[Document],
    batch_size: usize,
) -> Result<SyncStats> {
    if embedder.dim() != index.dim() {
        return Err(VectorStoreError::DimMismatch {
            expected: index.dim(),
            actual: embedder.dim(),
        });
    }
    let batch_size = batch_size.max(1);

    let mut stats = SyncStats::default();
    let mut staged: BTreeMap<String, IndexEntry> = BTreeMap::new();
    let mut pending: Vec<(&Document, [u8; 32], bool)> = Vec::new();

    for doc in docs {
        let digest = content_digest(&doc.content);
        match index.get(&doc.id) {
            Some(entry) if entry.digest == digest => {
                stats.unchanged += 1;
                staged.insert(doc.id.clone(), entry.clone());
            }
            Some(_) => pending.push((doc, digest, false)),
            None => pending.push((doc, digest, true)),
        }
    }

    let live_ids: std::collections::HashSet<&str> =
        docs.iter().map(|doc| doc.id.as_str()).collect();
    stats.removed = index
        .entries()
        .keys()
        .filter(|id| !live_ids.contains(id.as_str()))
        .count();

    for batch in pending.chunks(batch_size) {
        ctx.check()?;
        let texts: Vec<String> = batch.iter().map(|(doc, _, _)| doc.content.clone()).collect();
        let vectors = embedder.embed(&texts).await?;
        if vectors.len() != batch.len() {
            return Err(VectorStoreError::EmbedderError(format!(
                "embedder returned {} vectors for {} texts",
                vectors.len(),
                batch.len()
            )));
        }
        for ((doc, digest, is_new), mut vector) in batch.iter().zip(vectors) {
            if vector.len() != index.dim() {
                return Err(VectorStoreError::DimMismatch {
                    expected: index.dim(),
                    actual: vector.len(),
                });
            }
            normalize_in_place(&mut vector);
            staged.insert(
                doc.id.clone(),
                IndexEntry {
                    vector,
                    digest: *digest,
                },
            );
            if *is_new {
                stats.added += 1;
            } else {
                stats.updated += 1;
            }
        }
    }

    index.replace_entries(staged);
    if stats.changed() {
        log::info!(
            "Vector index sync: +{} ~{} -{} ={}",
            stats.added,
            stats.updated,
            stats.removed,
            stats.unchanged
        );
    }
    Ok(stats)
}
