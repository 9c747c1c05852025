//! Search reports: text, hybrid, and semantic modes over one
//! snapshot.

use crate::engine::Engine;
use crate::error::{EngineError, Result};
use beads_model::Issue;
use beads_search::{
    adjust_weights_for_query, apply_short_query_lexical_boost, get_preset,
    hybrid_candidate_limit, text_score, HybridScorer, SearchResult,
};
use beads_vector_store::{
    default_index_path, documents_from_issues, embedder_from_config, sync_index, EmbeddingConfig,
    SyncContext, VectorIndex, DEFAULT_SYNC_BATCH, DEFAULT_SYNC_BUDGET,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Budget for embedding one interactive query.
const QUERY_EMBED_BUDGET: Duration = Duration::from_millis(500);

const DEFAULT_SEARCH_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Text,
    Hybrid,
    Semantic,
}

impl SearchMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchMode::Text => "text",
            SearchMode::Hybrid => "hybrid",
            SearchMode::Semantic => "semantic",
        }
    }
}

#[derive(Serialize)]
struct SearchEnvelope {
    mode: &'static str,
    preset: String,
    data_hash: String,
    results: Vec<SearchResult>,
    usage_hints: Vec<String>,
}

impl Engine {
    /// Run one search and wrap it in the report envelope.
    ///
    /// `limit == 0` falls back to the default result count. The
    /// `preset` names the weight vector for hybrid mode; text and
    /// semantic modes record it but score without it.
    pub async fn search_report(
        &self,
        issues: Vec<Issue>,
        query: &str,
        mode: SearchMode,
        preset: &str,
        limit: usize,
    ) -> Result<Value> {
        let limit = if limit == 0 { DEFAULT_SEARCH_LIMIT } else { limit };

        // Validate the preset up front so a bad name fails the whole
        // operation instead of silently degrading.
        let preset_weights = get_preset(preset)?;

        let documents: HashMap<String, String> = issues
            .iter()
            .map(|issue| (issue.id.clone(), issue.search_document()))
            .collect();

        let prepared = self.prepare(issues.clone())?;
        let results = match mode {
            SearchMode::Text => {
                let mut results = lexical_matches(query, &documents, usize::MAX);
                results.truncate(limit);
                results
            }
            SearchMode::Hybrid => {
                let pool = hybrid_candidate_limit(limit, documents.len(), query);
                let candidates: Vec<(String, f64)> = lexical_matches(query, &documents, pool)
                    .into_iter()
                    .map(|result| (result.issue_id, result.score))
                    .collect();

                let weights = adjust_weights_for_query(preset_weights, query);
                let scorer = HybridScorer::new(preset_weights, self.metrics_cache())?;
                let scored = scorer.score_all(&candidates, weights);
                let mut results = apply_short_query_lexical_boost(scored, query, &documents);
                results.truncate(limit);
                results
            }
            SearchMode::Semantic => self.semantic_matches(&issues, query, limit).await?,
        };

        let envelope = SearchEnvelope {
            mode: mode.as_str(),
            preset: preset.to_string(),
            data_hash: prepared.snapshot.data_hash().to_string(),
            results,
            usage_hints: vec![
                "hybrid mode blends text relevance with graph signals".to_string(),
                "short queries lean on literal token matches".to_string(),
            ],
        };
        Ok(serde_json::to_value(envelope)?)
    }

    /// Semantic path: make sure the on-disk index matches the issue
    /// set, then rank by dot product against the embedded query.
    async fn semantic_matches(
        &self,
        issues: &[Issue],
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let config = EmbeddingConfig::from_env();
        let embedder = embedder_from_config(&config)?;
        let index_path = default_index_path(self.project_root(), &config);

        let (mut index, loaded) =
            VectorIndex::load_or_new(&index_path, config.dim, embedder.name()).await?;

        let docs = documents_from_issues(issues);
        let ctx = SyncContext::with_timeout(DEFAULT_SYNC_BUDGET);
        let stats = sync_index(&ctx, &mut index, embedder.as_ref(), &docs, DEFAULT_SYNC_BATCH)
            .await?;
        if !loaded || stats.changed() {
            index.save(&index_path).await?;
        }

        let query_texts = vec![query.to_string()];
        let vectors = tokio::time::timeout(QUERY_EMBED_BUDGET, embedder.embed(&query_texts))
            .await
            .map_err(|_| EngineError::QueryTimeout)??;
        let query_vec = vectors.into_iter().next().ok_or_else(|| {
            beads_vector_store::VectorStoreError::EmbedderError(
                "embedder returned no vector for the query".to_string(),
            )
        })?;

        let hits = index.search(&query_vec, limit)?;
        Ok(hits
            .into_iter()
            .map(|(id, score)| SearchResult::text_only(&id, f64::from(score)))
            .collect())
    }
}

/// Lexical candidates: issues with a non-zero token-overlap score,
/// ordered score descending with ID-ascending tie-breaks.
fn lexical_matches(
    query: &str,
    documents: &HashMap<String, String>,
    pool: usize,
) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = documents
        .iter()
        .filter_map(|(id, document)| {
            let score = text_score(query, document);
            (score > 0.0).then(|| SearchResult::text_only(id, score))
        })
        .collect();
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.issue_id.cmp(&b.issue_id))
    });
    results.truncate(pool);
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexical_matches_filter_and_rank() {
        let documents: HashMap<String, String> = [
            ("A".to_string(), "graph rendering benchmarks".to_string()),
            ("B".to_string(), "rendering only".to_string()),
            ("C".to_string(), "unrelated".to_string()),
        ]
        .into_iter()
        .collect();

        let results = lexical_matches("graph rendering", &documents, 10);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].issue_id, "A");
        assert_eq!(results[1].issue_id, "B");
    }

    #[test]
    fn search_mode_wire_names() {
        assert_eq!(SearchMode::Text.as_str(), "text");
        assert_eq!(SearchMode::Hybrid.as_str(), "hybrid");
        assert_eq!(SearchMode::Semantic.as_str(), "semantic");
    }
}
