//! # Beads Graph
//!
//! Structural analysis of the issue dependency graph.
//!
//! ## Architecture
//!
//! ```text
//! Snapshot
//!     │
//!     ├──> DependencyGraph (petgraph)
//!     │      ├─ Nodes: issue IDs (ascending order)
//!     │      └─ Edges: `blocks` dependencies only
//!     │
//!     ├──> Phase 1 (inline)
//!     │      └─ counts, density, degrees, SCCs, orphans/leaves
//!     │
//!     ├──> Phase 2 (worker + latch)
//!     │      ├─ PageRank, betweenness, eigenvector, HITS
//!     │      ├─ k-cores, articulation points
//!     │      └─ cycles, critical path, slack
//!     │
//!     └──> Insights
//!            └─ ranked lists with deterministic ordering
//! ```
//!
//! Readers of a [`GraphStats`] handle either observe "Phase 2 not
//! ready" or the complete Phase 2 output; there is no torn state.

mod analyzer;
mod centrality;
mod config;
mod critical_path;
mod error;
mod insights;
mod structure;
mod types;

pub use analyzer::{AnalysisMode, AnalysisProfile, Analyzer, GraphStats, Phase2Metrics};
pub use config::{AnalysisConfig, SizeProfile};
pub use error::{GraphError, Result};
pub use insights::{InsightItem, Insights};
pub use types::{CompactGraph, DependencyGraph};
