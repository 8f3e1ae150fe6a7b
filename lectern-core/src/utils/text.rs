//! Tokenization shared by lexical ranking, confidence scoring and the
//! token-overlap similarity fallback.

use std::collections::HashSet;

/// Minimum token length kept by [`tokenize`].
pub const MIN_TOKEN_LENGTH: usize = 2;

/// English stop words dropped by [`tokenize`].
pub const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
    "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once",
    "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she",
    "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.binary_search(&token).is_ok()
}

/// Lowercase, strip punctuation, split on whitespace, then drop stop words and
/// tokens shorter than [`MIN_TOKEN_LENGTH`] characters.
///
/// ```rust
/// use lectern_core::utils::text::tokenize;
///
/// assert_eq!(tokenize("What is a B-Tree?"), vec!["tree"]);
/// assert_eq!(tokenize("Dijkstra's algorithm"), vec!["dijkstra", "algorithm"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() >= MIN_TOKEN_LENGTH && !is_stop_word(token))
        .map(str::to_string)
        .collect()
}

/// Token-set Jaccard similarity of two texts, in `0.0..=1.0`.
///
/// Two texts without any tokens are considered unrelated (0).
pub fn jaccard_similarity(a: &str, b: &str) -> f32 {
    let left: HashSet<String> = tokenize(a).into_iter().collect();
    let right: HashSet<String> = tokenize(b).into_iter().collect();

    let union = left.union(&right).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = left.intersection(&right).count();
    intersection as f32 / union as f32
}
