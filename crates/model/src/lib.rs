//! # Beads Model
//!
//! Core data model for the issue dependency graph: issues, typed
//! dependencies, and immutable content-addressed snapshots.
//!
//! A [`Snapshot`] is the unit every analysis and report operates on.
//! Its `data_hash` is a SHA-256 digest over the canonicalised issue
//! bytes, so two snapshots with the same content always carry the same
//! hash regardless of how they were produced.

mod error;
mod issue;
mod snapshot;

pub use error::{ModelError, Result};
pub use issue::{DepKind, Dependency, Issue, IssueKind, Status};
pub use snapshot::Snapshot;
