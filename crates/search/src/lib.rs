//! # Beads Search
//!
//! Hybrid relevance scoring for issues: a caller-supplied text score
//! fused with structural and temporal signals (PageRank, status,
//! impact, priority, recency) under a validated weight vector.
//!
//! The weight presets defined here are the source of truth; the
//! viewer's JS table is cross-checked against them by a parity test.

mod error;
mod lexical;
mod metrics_cache;
mod normalize;
mod query;
mod scorer;
mod text;
mod weights;

pub use error::{Result, SearchError};
pub use lexical::{apply_short_query_lexical_boost, short_query_lexical_boost};
pub use metrics_cache::{IssueMetrics, MetricsCache, MetricsLoader};
pub use normalize::{normalize_impact, normalize_priority, normalize_recency, normalize_status};
pub use query::{
    adjust_weights_for_query, hybrid_candidate_limit, is_short_query, HYBRID_CANDIDATE_MIN,
    HYBRID_CANDIDATE_MIN_SHORT, SHORT_QUERY_MAX_TOKENS, SHORT_QUERY_MIN_TEXT_WEIGHT,
};
pub use scorer::{HybridScorer, SearchResult};
pub use text::text_score;
pub use weights::{get_preset, list_presets, Preset, Weights, WEIGHT_SUM_TOLERANCE};
