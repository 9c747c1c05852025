//! Query-shape adaptation: short queries are overwhelmingly lookups,
//! so they lean on text relevance and widen the candidate pool.

use crate::weights::Weights;

/// Queries of at most this many whitespace tokens count as short.
pub const SHORT_QUERY_MAX_TOKENS: usize = 2;

/// Floor for the text weight on short queries.
pub const SHORT_QUERY_MIN_TEXT_WEIGHT: f64 = 0.5;

/// Candidate-pool floors for the hybrid scorer.
pub const HYBRID_CANDIDATE_MIN: usize = 50;
pub const HYBRID_CANDIDATE_MIN_SHORT: usize = 150;

pub fn is_short_query(query: &str) -> bool {
    query.split_whitespace().count() <= SHORT_QUERY_MAX_TOKENS
}

/// Raise the text weight of short queries to at least
/// [`SHORT_QUERY_MIN_TEXT_WEIGHT`], funding the raise from the
/// pagerank weight, and renormalise. Long queries pass through
/// unchanged.
pub fn adjust_weights_for_query(weights: Weights, query: &str) -> Weights {
    adjust_weights(weights, query, SHORT_QUERY_MAX_TOKENS, SHORT_QUERY_MIN_TEXT_WEIGHT)
}

pub(crate) fn adjust_weights(
    weights: Weights,
    query: &str,
    max_tokens: usize,
    min_text_weight: f64,
) -> Weights {
    if query.split_whitespace().count() > max_tokens {
        return weights;
    }
    if weights.text_relevance >= min_text_weight {
        return weights;
    }

    // Fund the raise from pagerank first; spill any remainder across
    // the other structural components so the text floor always holds.
    let raise = min_text_weight - weights.text_relevance;
    let mut adjusted = weights;
    adjusted.text_relevance = min_text_weight;

    let from_pagerank = adjusted.pagerank.min(raise);
    adjusted.pagerank -= from_pagerank;

    let spill = raise - from_pagerank;
    if spill > 0.0 {
        let others = adjusted.status + adjusted.impact + adjusted.priority + adjusted.recency;
        if others > 0.0 {
            let scale = ((others - spill) / others).max(0.0);
            adjusted.status *= scale;
            adjusted.impact *= scale;
            adjusted.priority *= scale;
            adjusted.recency *= scale;
        }
    }
    adjusted.normalize()
}

/// Candidate pool size for one hybrid query: at least the configured
/// floor for the query shape, never more than `total`.
pub fn hybrid_candidate_limit(limit: usize, total: usize, query: &str) -> usize {
    let floor = if is_short_query(query) {
        HYBRID_CANDIDATE_MIN_SHORT
    } else {
        HYBRID_CANDIDATE_MIN
    };
    limit.max(floor).min(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weights::{get_preset, Preset};

    #[test]
    fn short_query_boosts_text_and_shrinks_pagerank() {
        let weights = Preset::ImpactFirst.weights();
        let adjusted = adjust_weights_for_query(weights, "benchmarks");

        assert!(adjusted.text_relevance >= SHORT_QUERY_MIN_TEXT_WEIGHT);
        assert!(adjusted.text_relevance > weights.text_relevance);
        assert!(adjusted.pagerank < weights.pagerank);
        assert!((adjusted.sum() - 1.0).abs() < 1e-6, "sum={}", adjusted.sum());
    }

    #[test]
    fn long_query_unchanged() {
        let weights = get_preset("default").unwrap();
        let query = "document steps to reproduce oauth login regression in staging";
        assert_eq!(adjust_weights_for_query(weights, query), weights);
    }

    #[test]
    fn already_text_heavy_short_query_unchanged() {
        let mut weights = Preset::Default.weights();
        weights.text_relevance = 0.6;
        weights.pagerank = 0.0;
        weights.status = 0.1;
        weights.impact = 0.1;
        weights.priority = 0.1;
        weights.recency = 0.1;
        assert_eq!(adjust_weights_for_query(weights, "auth"), weights);
    }

    #[test]
    fn candidate_limit_floors_by_query_shape() {
        assert!(hybrid_candidate_limit(5, 1000, "benchmarks") >= HYBRID_CANDIDATE_MIN_SHORT);
        assert!(
            hybrid_candidate_limit(5, 1000, "long descriptive query for hybrid search relevance")
                >= HYBRID_CANDIDATE_MIN
        );
    }

    #[test]
    fn candidate_limit_capped_by_total() {
        assert_eq!(hybrid_candidate_limit(5, 20, "benchmarks"), 20);
    }
}
