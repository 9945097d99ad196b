//! Keyword tokenization and overlap scoring

use std::collections::BTreeSet;

/// Lowercased tokens with punctuation trimmed from both ends, so
/// "France." matches "france".
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|t| {
            t.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|t| !t.is_empty())
        .collect()
}

/// Fraction of distinct query tokens present in the content, in `[0,1]`.
/// An empty query scores zero against everything.
pub fn overlap(query_tokens: &[String], content_tokens: &BTreeSet<String>) -> f64 {
    let distinct: BTreeSet<&String> = query_tokens.iter().collect();
    if distinct.is_empty() {
        return 0.0;
    }
    let hits = distinct
        .iter()
        .filter(|t| content_tokens.contains(**t))
        .count();
    hits as f64 / distinct.len() as f64
}

/// Tokens of `text` as a set, for repeated overlap checks.
pub fn token_set(text: &str) -> BTreeSet<String> {
    tokenize(text).into_iter().collect()
}
