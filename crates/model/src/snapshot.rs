use crate::error::{ModelError, Result};
use crate::issue::Issue;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Immutable view of all issues at a point in time, identified by a
/// content-addressed digest.
///
/// The digest is a pure function of the canonicalised issue bytes:
/// issues are serialized in their snapshot order with the stable field
/// order of [`Issue`], each record terminated by a newline. Producers
/// cannot forge the hash; it is always computed here.
#[derive(Debug, Clone)]
pub struct Snapshot {
    issues: Vec<Issue>,
    data_hash: String,
}

impl Snapshot {
    /// Build a snapshot, validating IDs and computing `data_hash`.
    ///
    /// Empty snapshots are valid. Empty or duplicate IDs are not.
    pub fn new(issues: Vec<Issue>) -> Result<Self> {
        let mut seen: HashSet<&str> = HashSet::with_capacity(issues.len());
        for issue in &issues {
            if issue.id.is_empty() {
                return Err(ModelError::SnapshotInvalid(
                    "issue with empty id".to_string(),
                ));
            }
            if !seen.insert(issue.id.as_str()) {
                return Err(ModelError::SnapshotInvalid(format!(
                    "duplicate issue id {:?}",
                    issue.id
                )));
            }
        }

        let data_hash = compute_data_hash(&issues)?;
        Ok(Self { issues, data_hash })
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn data_hash(&self) -> &str {
        &self.data_hash
    }

    pub fn get(&self, id: &str) -> Option<&Issue> {
        self.issues.iter().find(|issue| issue.id == id)
    }

    /// Counts by status wire name, for report envelopes.
    pub fn status_counts(&self) -> std::collections::BTreeMap<String, usize> {
        let mut counts = std::collections::BTreeMap::new();
        for issue in &self.issues {
            *counts.entry(issue.status.as_str().to_string()).or_insert(0) += 1;
        }
        counts
    }
}

fn compute_data_hash(issues: &[Issue]) -> Result<String> {
    let mut hasher = Sha256::new();
    for issue in issues {
        let bytes = serde_json::to_vec(issue)?;
        hasher.update(&bytes);
        hasher.update(b"\n");
    }
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    Ok(out)
}
