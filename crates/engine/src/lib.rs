//! # Beads Engine
//!
//! Report engine over the issue dependency graph. A caller hands the
//! engine a snapshot of issues; the engine computes the snapshot's
//! `data_hash`, runs the two-phase graph analysis, keeps the metrics
//! cache and vector index in step with the hash, and emits
//! deterministic machine-readable envelopes:
//!
//! - `insights` — ranked structural findings plus the full stat maps
//! - `plan` — parallel work tracks over actionable issues
//! - `priority` — re-prioritisation recommendations
//! - `triage` — quick-reference top picks
//! - `search` — text, hybrid, or semantic ranking
//!
//! Engines are process-lived and keyed by project root; use
//! [`Engine::for_project`] for the shared instance or [`Engine::new`]
//! for an isolated one (tests).

mod engine;
mod error;
mod reports;
mod search;

pub use engine::{project_root_from_env, Engine};
pub use error::{EngineError, Result};
pub use search::SearchMode;
