use crate::error::Result;
use crate::metrics_cache::MetricsCache;
use crate::normalize::{normalize_impact, normalize_priority, normalize_recency, normalize_status};
use crate::weights::Weights;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// One ranked hit. `component_scores` is present only when the
/// metrics cache knew the issue (hybrid scoring); text-only hits carry
/// just the score.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub issue_id: String,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_scores: Option<BTreeMap<String, f64>>,
}

impl SearchResult {
    pub fn text_only(issue_id: &str, score: f64) -> Self {
        Self {
            issue_id: issue_id.to_string(),
            score,
            component_scores: None,
        }
    }
}

/// Fuses a caller-supplied text score with the structural and temporal
/// signals of the metrics cache under a validated weight vector.
///
/// Scoring never fails: an issue the cache does not know degrades to
/// its text score with no component breakdown.
pub struct HybridScorer {
    weights: RwLock<Weights>,
    cache: Arc<MetricsCache>,
}

impl HybridScorer {
    pub fn new(weights: Weights, cache: Arc<MetricsCache>) -> Result<Self> {
        weights.validate()?;
        Ok(Self {
            weights: RwLock::new(weights),
            cache,
        })
    }

    /// Replace the weight vector. Invalid vectors are rejected without
    /// mutating the current one.
    pub fn configure(&self, weights: Weights) -> Result<()> {
        weights.validate()?;
        *self.weights.write().expect("weights lock poisoned") = weights;
        Ok(())
    }

    pub fn weights(&self) -> Weights {
        *self.weights.read().expect("weights lock poisoned")
    }

    /// Score one candidate given its normalised text score.
    pub fn score(&self, issue_id: &str, text_score: f64) -> SearchResult {
        self.score_with_weights(issue_id, text_score, self.weights())
    }

    /// Score with an explicit (already validated or adjusted) vector,
    /// e.g. after query-shape adaptation.
    pub fn score_with_weights(
        &self,
        issue_id: &str,
        text_score: f64,
        weights: Weights,
    ) -> SearchResult {
        let Some(metrics) = self.cache.get(issue_id) else {
            return SearchResult::text_only(issue_id, text_score);
        };

        let status_score = normalize_status(&metrics.status);
        let impact_score = normalize_impact(metrics.blocker_count, self.cache.max_blocker_count());
        let priority_score = normalize_priority(metrics.priority);
        let recency_score = normalize_recency(metrics.updated_at);

        let final_score = weights.text_relevance * text_score
            + weights.pagerank * metrics.pagerank
            + weights.status * status_score
            + weights.impact * impact_score
            + weights.priority * priority_score
            + weights.recency * recency_score;

        let mut components = BTreeMap::new();
        components.insert("text".to_string(), text_score);
        components.insert("pagerank".to_string(), metrics.pagerank);
        components.insert("status".to_string(), status_score);
        components.insert("impact".to_string(), impact_score);
        components.insert("priority".to_string(), priority_score);
        components.insert("recency".to_string(), recency_score);

        SearchResult {
            issue_id: issue_id.to_string(),
            score: final_score,
            component_scores: Some(components),
        }
    }

    /// Score a batch of candidates and sort (score desc, ID asc).
    pub fn score_all(&self, candidates: &[(String, f64)], weights: Weights) -> Vec<SearchResult> {
        let mut results: Vec<SearchResult> = candidates
            .iter()
            .map(|(id, text)| self.score_with_weights(id, *text, weights))
            .collect();
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.issue_id.cmp(&b.issue_id))
        });
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics_cache::{IssueMetrics, MetricsLoader};
    use chrono::Utc;
    use std::collections::HashMap;

    struct FixtureLoader {
        metrics: HashMap<String, IssueMetrics>,
    }

    impl MetricsLoader for FixtureLoader {
        fn load_metrics(&self) -> crate::error::Result<HashMap<String, IssueMetrics>> {
            Ok(self.metrics.clone())
        }

        fn compute_data_hash(&self) -> crate::error::Result<String> {
            Ok("fixture".to_string())
        }
    }

    fn cache_with(metrics: Vec<IssueMetrics>) -> Arc<MetricsCache> {
        let metrics = metrics
            .into_iter()
            .map(|m| (m.issue_id.clone(), m))
            .collect();
        let cache = Arc::new(MetricsCache::new(Box::new(FixtureLoader { metrics })));
        cache.refresh().unwrap();
        cache
    }

    fn even_weights() -> Weights {
        Weights {
            text_relevance: 0.5,
            pagerank: 0.1,
            status: 0.1,
            impact: 0.1,
            priority: 0.1,
            recency: 0.1,
        }
    }

    #[test]
    fn score_combines_all_components() {
        let updated_at = Some(Utc::now());
        let cache = cache_with(vec![
            IssueMetrics {
                issue_id: "A".to_string(),
                pagerank: 0.8,
                status: "open".to_string(),
                priority: 1,
                blocker_count: 2,
                updated_at,
            },
            IssueMetrics {
                issue_id: "max".to_string(),
                pagerank: 0.0,
                status: "open".to_string(),
                priority: 4,
                blocker_count: 4,
                updated_at: None,
            },
        ]);

        let scorer = HybridScorer::new(even_weights(), cache).unwrap();
        let result = scorer.score("A", 0.6);

        let expected = 0.5 * 0.6
            + 0.1 * 0.8
            + 0.1 * normalize_status("open")
            + 0.1 * normalize_impact(2, 4)
            + 0.1 * normalize_priority(1)
            + 0.1 * normalize_recency(updated_at);
        assert!((result.score - expected).abs() < 1e-6);

        let components = result.component_scores.unwrap();
        assert_eq!(components["pagerank"], 0.8);
        assert_eq!(components["impact"], normalize_impact(2, 4));
    }

    #[test]
    fn missing_metrics_degrade_to_text_only() {
        let cache = cache_with(Vec::new());
        let scorer = HybridScorer::new(even_weights(), cache).unwrap();

        let result = scorer.score("ghost", 0.42);
        assert_eq!(result.score, 0.42);
        assert!(result.component_scores.is_none());
    }

    #[test]
    fn configure_rejects_invalid_and_keeps_old_weights() {
        let cache = cache_with(Vec::new());
        let scorer = HybridScorer::new(even_weights(), cache).unwrap();

        let mut bad = even_weights();
        bad.text_relevance = -1.0;
        assert!(scorer.configure(bad).is_err());
        assert_eq!(scorer.weights(), even_weights());

        let mut good = even_weights();
        good.text_relevance = 0.4;
        good.pagerank = 0.2;
        scorer.configure(good).unwrap();
        assert_eq!(scorer.weights().text_relevance, 0.4);
    }

    #[test]
    fn score_all_ties_break_by_id() {
        let cache = cache_with(Vec::new());
        let scorer = HybridScorer::new(even_weights(), cache).unwrap();
        let results = scorer.score_all(
            &[("z".to_string(), 0.3), ("a".to_string(), 0.3)],
            even_weights(),
        );
        assert_eq!(results[0].issue_id, "a");
        assert_eq!(results[1].issue_id, "z");
    }

    #[test]
    fn invalid_initial_weights_rejected() {
        let cache = cache_with(Vec::new());
        let mut bad = even_weights();
        bad.recency = 0.5;
        assert!(HybridScorer::new(bad, cache).is_err());
    }
}
