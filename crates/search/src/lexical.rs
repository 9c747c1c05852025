//! Short-query lexical booster: literal token hits beat fuzzy
//! relevance when the user typed one or two words.

use crate::query::is_short_query;
use crate::scorer::SearchResult;
use std::collections::HashMap;

/// Additive bonus for a literal whole-token match.
const LEXICAL_BOOST: f64 = 0.4;

/// Positive iff `query` is short and `document` contains every query
/// token as a whole whitespace-separated token, case-insensitively.
/// Long queries never boost.
pub fn short_query_lexical_boost(query: &str, document: &str) -> f64 {
    if !is_short_query(query) {
        return 0.0;
    }
    let needles: Vec<String> = query
        .split_whitespace()
        .map(|t| t.to_lowercase())
        .collect();
    if needles.is_empty() {
        return 0.0;
    }
    let tokens: Vec<String> = document
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .collect();
    let all_present = needles
        .iter()
        .all(|needle| tokens.iter().any(|token| token == needle));
    if all_present {
        LEXICAL_BOOST
    } else {
        0.0
    }
}

/// Fold the lexical boost into each result's final score and re-sort
/// (score descending, issue ID ascending).
pub fn apply_short_query_lexical_boost(
    mut results: Vec<SearchResult>,
    query: &str,
    documents: &HashMap<String, String>,
) -> Vec<SearchResult> {
    if !is_short_query(query) {
        return results;
    }
    for result in results.iter_mut() {
        if let Some(document) = documents.get(&result.issue_id) {
            result.score += short_query_lexical_boost(query, document);
        }
    }
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.issue_id.cmp(&b.issue_id))
    });
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_short_query_match_boosts() {
        let doc = "Performance benchmarks for graph rendering";
        assert!(short_query_lexical_boost("benchmarks", doc) > 0.0);
        assert!(short_query_lexical_boost("Benchmarks", doc) > 0.0);
    }

    #[test]
    fn long_query_never_boosts() {
        let doc = "Performance benchmarks for graph rendering";
        let query = "long descriptive query about rendering performance";
        assert_eq!(short_query_lexical_boost(query, doc), 0.0);
    }

    #[test]
    fn partial_token_does_not_boost() {
        assert_eq!(short_query_lexical_boost("bench", "benchmarks here"), 0.0);
    }

    #[test]
    fn punctuation_around_tokens_is_ignored() {
        assert!(short_query_lexical_boost("benchmarks", "Run (benchmarks).") > 0.0);
    }

    #[test]
    fn boost_resorts_results() {
        let results = vec![
            SearchResult::text_only("a", 0.2),
            SearchResult::text_only("b", 0.5),
        ];
        let docs: HashMap<String, String> = [
            ("a".to_string(), "benchmarks".to_string()),
            ("b".to_string(), "unrelated".to_string()),
        ]
        .into_iter()
        .collect();

        let updated = apply_short_query_lexical_boost(results, "benchmarks", &docs);
        assert_eq!(updated[0].issue_id, "a");
    }

    #[test]
    fn equal_scores_tie_break_by_id() {
        let results = vec![
            SearchResult::text_only("z", 0.4),
            SearchResult::text_only("a", 0.4),
        ];
        let docs = HashMap::new();
        let updated = apply_short_query_lexical_boost(results, "anything", &docs);
        assert_eq!(updated[0].issue_id, "a");
        assert_eq!(updated[1].issue_id, "z");
    }
}
