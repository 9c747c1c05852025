use crate::error::{Result, VectorStoreError};
use std::collections::BTreeMap;
use std::path::Path;

const MAGIC: &[u8; 4] = b"BVIX";
const FORMAT_VERSION: u32 = 1;

/// One stored embedding: the normalised vector plus the SHA-256
/// digest of the source content it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub vector: Vec<f32>,
    pub digest: [u8; 32],
}

/// Content-addressed map from issue ID to embedding vector, persisted
/// as a single versioned binary blob. The dimension is fixed at
/// creation and never changes.
#[derive(Debug)]
pub struct VectorIndex {
    dim: usize,
    embedder_name: String,
    created_at: i64,
    entries: BTreeMap<String, IndexEntry>,
}

impl VectorIndex {
    pub fn new(dim: usize, embedder_name: &str, created_at: i64) -> Self {
        Self {
            dim,
            embedder_name: embedder_name.to_string(),
            created_at,
            entries: BTreeMap::new(),
        }
    }

    /// Load the index at `path` if it exists and its header matches
    /// `dim`; otherwise create an empty one. The boolean reports
    /// whether an existing file was loaded.
    pub async fn load_or_new(path: &Path, dim: usize, embedder_name: &str) -> Result<(Self, bool)> {
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                let index = Self::decode(&bytes)?;
                if index.dim != dim {
                    return Err(VectorStoreError::DimMismatch {
                        expected: dim,
                        actual: index.dim,
                    });
                }
                log::info!(
                    "Loaded vector index from {} ({} entries, dim {})",
                    path.display(),
                    index.entries.len(),
                    index.dim
                );
                Ok((index, true))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No vector index at {}, starting empty", path.display());
                let created_at = chrono::Utc::now().timestamp();
                Ok((Self::new(dim, embedder_name, created_at), false))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn embedder_name(&self) -> &str {
        &self.embedder_name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&IndexEntry> {
        self.entries.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Insert or replace an entry. The vector must match the index
    /// dimension.
    pub fn upsert(&mut self, id: &str, vector: Vec<f32>, digest: [u8; 32]) -> Result<()> {
        if vector.len() != self.dim {
            return Err(VectorStoreError::DimMismatch {
                expected: self.dim,
                actual: vector.len(),
            });
        }
        self.entries
            .insert(id.to_string(), IndexEntry { vector, digest });
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }

    pub(crate) fn replace_entries(&mut self, entries: BTreeMap<String, IndexEntry>) {
        self.entries = entries;
    }

    pub(crate) fn entries(&self) -> &BTreeMap<String, IndexEntry> {
        &self.entries
    }

    /// Top-k by dot product over the stored (pre-normalised) vectors.
    /// Ties break by ID ascending.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(String, f32)>> {
        if query.len() != self.dim {
            return Err(VectorStoreError::DimMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }
        let mut hits: Vec<(String, f32)> = self
            .entries
            .iter()
            .map(|(id, entry)| {
                let score: f32 = query.iter().zip(&entry.vector).map(|(a, b)| a * b).sum();
                (id.clone(), score)
            })
            .collect();
        hits.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        hits.truncate(k);
        Ok(hits)
    }

    /// Persist atomically: encode, write to a temp sibling, rename
    /// over the target. A failed save leaves the previous file intact.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = self.encode();
        let tmp = path.with_extension("bin.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        log::info!(
            "Saved vector index to {} ({} entries)",
            path.display(),
            self.entries.len()
        );
        Ok(())
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64 + self.entries.len() * (64 + self.dim * 4));
        out.extend_from_slice(MAGIC);
        put_u32(&mut out, FORMAT_VERSION);
        put_u32(&mut out, self.dim as u32);
        put_u64(&mut out, self.entries.len() as u64);
        put_str(&mut out, &self.embedder_name);
        put_i64(&mut out, self.created_at);

        for (id, entry) in &self.entries {
            put_str(&mut out, id);
            out.extend_from_slice(&entry.digest);
            for value in &entry.vector {
                out.extend_from_slice(&value.to_le_bytes());
            }
        }
        out
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        let magic = reader.take(4)?;
        if magic != MAGIC {
            return Err(VectorStoreError::Corrupt("bad magic".to_string()));
        }
        let version = reader.u32()?;
        if version != FORMAT_VERSION {
            return Err(VectorStoreError::UnsupportedVersion(version));
        }
        let dim = reader.u32()? as usize;
        let entry_count = reader.u64()? as usize;
        let embedder_name = reader.string()?;
        let created_at = reader.i64()?;

        let mut entries = BTreeMap::new();
        for _ in 0..entry_count {
            let id = reader.string()?;
            let digest_slice = reader.take(32)?;
            let mut digest = [0u8; 32];
            digest.copy_from_slice(digest_slice);

            let mut vector = Vec::with_capacity(dim);
            for _ in 0..dim {
                vector.push(reader.f32()?);
            }
            entries.insert(id, IndexEntry { vector, digest });
        }

        Ok(Self {
            dim,
            embedder_name,
            created_at,
            entries,
        })
    }
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.pos + n > self.bytes.len() {
            return Err(VectorStoreError::Corrupt("truncated index file".to_string()));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn string(&mut self) -> Result<String> {
        let len = self.u16()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| VectorStoreError::Corrupt("invalid utf-8 string".to_string()))
    }
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_i64(out: &mut Vec<u8>, value: i64) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_str(out: &mut Vec<u8>, value: &str) {
    let bytes = value.as_bytes();
    debug_assert!(bytes.len() <= u16::MAX as usize);
    out.extend_from_slice(&(bytes.len() as u16).to_le_bytes());
    out.extend_from_slice(bytes);
}
