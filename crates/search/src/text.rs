//! Plain lexical text scorer: normalised token overlap between a
//! query and an issue's searchable document. Supplies the text
//! component the hybrid scorer fuses with structural signals.

use std::collections::HashSet;

/// Fraction of query tokens present in the document, in [0, 1].
/// Title hits get the document tokens from the full document, so a
/// match anywhere counts; scoring stays symmetric across fields.
pub fn text_score(query: &str, document: &str) -> f64 {
    let needles: Vec<String> = tokenize(query);
    if needles.is_empty() {
        return 0.0;
    }
    let haystack: HashSet<String> = tokenize(document).into_iter().collect();
    let hits = needles
        .iter()
        .filter(|needle| haystack.contains(*needle))
        .count();
    hits as f64 / needles.len() as f64
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_match_scores_one() {
        assert_eq!(text_score("graph rendering", "Graph rendering pipeline"), 1.0);
    }

    #[test]
    fn partial_match_scores_fraction() {
        let score = text_score("graph rendering speed", "the graph module");
        assert!((score - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn no_match_scores_zero() {
        assert_eq!(text_score("benchmarks", "unrelated text"), 0.0);
        assert_eq!(text_score("", "anything"), 0.0);
    }

    #[test]
    fn punctuation_splits_tokens() {
        assert_eq!(text_score("login", "fix login/logout flow"), 1.0);
    }
}
