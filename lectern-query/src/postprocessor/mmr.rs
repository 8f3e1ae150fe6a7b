//! Maximal Marginal Relevance diversification.

use lectern_core::{
    LecternError, Result, RetrievalResult,
    utils::{cosine_similarity, jaccard_similarity},
};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Default relevance/novelty trade-off.
pub const DEFAULT_MMR_LAMBDA: f32 = 0.7;

/// Reorders results to balance relevance against redundancy.
///
/// Each step picks the candidate maximising
/// `λ · relevance − (1 − λ) · max similarity to already selected results`.
/// Relevance is the result score divided by the best score in the input.
///
/// # Examples
///
/// ```rust
/// use lectern_query::postprocessor::MmrDiversifier;
///
/// let mut mmr = MmrDiversifier::default();
/// assert!(mmr.set_lambda(1.5).is_err());
/// assert!(mmr.set_lambda(0.5).is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MmrDiversifier {
    lambda: f32,
}

impl Default for MmrDiversifier {
    fn default() -> Self {
        Self {
            lambda: DEFAULT_MMR_LAMBDA,
        }
    }
}

impl MmrDiversifier {
    /// Create a diversifier. Fails unless `lambda` is within `0.0..=1.0`.
    pub fn new(lambda: f32) -> Result<Self> {
        let mut diversifier = Self::default();
        diversifier.set_lambda(lambda)?;
        Ok(diversifier)
    }

    /// Current λ.
    pub fn lambda(&self) -> f32 {
        self.lambda
    }

    /// Set λ. Fails unless it is within `0.0..=1.0`.
    pub fn set_lambda(&mut self, lambda: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&lambda) {
            return Err(LecternError::configuration(format!(
                "MMR lambda must be between 0.0 and 1.0, got {lambda}"
            )));
        }
        self.lambda = lambda;
        Ok(())
    }

    /// Select up to `limit` diverse results.
    ///
    /// Inputs no longer than `limit` are returned unchanged. Similarity uses
    /// cosine over `embeddings` when both results have one and falls back to
    /// token Jaccard over content otherwise.
    pub fn diversify(
        &self,
        results: Vec<RetrievalResult>,
        limit: usize,
        embeddings: Option<&HashMap<String, Vec<f32>>>,
    ) -> Result<Vec<RetrievalResult>> {
        if results.len() <= limit {
            return Ok(results);
        }

        let mut seen = HashSet::new();
        let candidates: Vec<RetrievalResult> = results
            .into_iter()
            .filter(|result| seen.insert(result.material.id.clone()))
            .collect();

        let target = limit.min(candidates.len());
        if target == 0 {
            return Ok(Vec::new());
        }

        let max_score = candidates
            .iter()
            .map(|result| result.score)
            .fold(f32::NEG_INFINITY, f32::max);
        let relevance: Vec<f32> = candidates
            .iter()
            .map(|result| {
                if max_score > 0.0 {
                    result.score / max_score
                } else {
                    0.0
                }
            })
            .collect();

        let mut selected: Vec<usize> = Vec::with_capacity(target);
        let mut remaining: Vec<usize> = (0..candidates.len()).collect();

        // First pick: highest relevance, earliest on ties.
        let first = remaining
            .iter()
            .copied()
            .reduce(|best, i| if relevance[i] > relevance[best] { i } else { best })
            .unwrap_or(0);
        selected.push(first);
        remaining.retain(|&i| i != first);

        while selected.len() < target {
            let mut best: Option<(usize, f32)> = None;

            for &candidate in &remaining {
                let mut max_similarity = f32::NEG_INFINITY;
                for &chosen in &selected {
                    let similarity =
                        Self::similarity(&candidates[candidate], &candidates[chosen], embeddings)?;
                    max_similarity = max_similarity.max(similarity);
                }

                let mmr = self.lambda * relevance[candidate] - (1.0 - self.lambda) * max_similarity;
                if best.is_none_or(|(_, best_score)| mmr > best_score) {
                    best = Some((candidate, mmr));
                }
            }

            let Some((pick, _)) = best else { break };
            selected.push(pick);
            remaining.retain(|&i| i != pick);
        }

        debug!(
            "MMR selected {} of {} candidates (lambda={})",
            selected.len(),
            candidates.len(),
            self.lambda
        );

        let mut slots: Vec<Option<RetrievalResult>> = candidates.into_iter().map(Some).collect();
        Ok(selected
            .into_iter()
            .filter_map(|index| slots[index].take())
            .collect())
    }

    fn similarity(
        a: &RetrievalResult,
        b: &RetrievalResult,
        embeddings: Option<&HashMap<String, Vec<f32>>>,
    ) -> Result<f32> {
        if let Some(embeddings) = embeddings {
            if let (Some(ea), Some(eb)) = (
                embeddings.get(&a.material.id),
                embeddings.get(&b.material.id),
            ) {
                return cosine_similarity(ea, eb);
            }
        }
        Ok(jaccard_similarity(&a.material.content, &b.material.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_core::Material;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn result(id: &str, score: f32, content: &str) -> RetrievalResult {
        RetrievalResult::new(Arc::new(Material::new(id, "c", id, content)), score)
    }

    fn ids(results: &[RetrievalResult]) -> Vec<&str> {
        results.iter().map(RetrievalResult::id).collect()
    }

    #[test]
    fn test_small_input_unchanged() {
        let input = vec![result("b", 0.2, "x"), result("a", 0.9, "y")];
        let output = MmrDiversifier::default().diversify(input, 5, None).unwrap();
        assert_eq!(ids(&output), vec!["b", "a"]);
    }

    #[test]
    fn test_first_pick_is_most_relevant() {
        let input = vec![
            result("low", 0.1, "apples oranges"),
            result("top", 0.9, "binary search trees"),
            result("mid", 0.5, "hash tables buckets"),
        ];
        let output = MmrDiversifier::default().diversify(input, 2, None).unwrap();
        assert_eq!(output[0].id(), "top");
        assert_eq!(output.len(), 2);
    }

    #[test]
    fn test_near_duplicate_is_demoted() {
        let input = vec![
            result("a", 1.0, "recursion base case stack frames"),
            result("a-copy", 0.95, "recursion base case stack frames"),
            result("b", 0.8, "hash tables collisions buckets"),
        ];
        let output = MmrDiversifier::new(0.5).unwrap().diversify(input, 2, None).unwrap();
        assert_eq!(ids(&output), vec!["a", "b"]);
    }

    #[test]
    fn test_duplicates_removed() {
        let input = vec![
            result("a", 1.0, "one"),
            result("a", 1.0, "one"),
            result("b", 0.5, "two"),
        ];
        let output = MmrDiversifier::default().diversify(input, 2, None).unwrap();
        assert_eq!(ids(&output), vec!["a", "b"]);
    }

    #[test]
    fn test_uses_embeddings_when_available() {
        let input = vec![
            result("a", 1.0, "same words"),
            result("b", 0.9, "same words"),
            result("c", 0.5, "same words"),
        ];
        let embeddings = HashMap::from([
            ("a".to_string(), vec![1.0, 0.0]),
            ("b".to_string(), vec![1.0, 0.0]),
            ("c".to_string(), vec![0.0, 1.0]),
        ]);
        let output = MmrDiversifier::default()
            .diversify(input, 2, Some(&embeddings))
            .unwrap();
        assert_eq!(ids(&output), vec!["a", "c"]);
    }

    #[test]
    fn test_embedding_dimension_mismatch_errors() {
        let input = vec![
            result("a", 1.0, "x"),
            result("b", 0.9, "y"),
            result("c", 0.5, "z"),
        ];
        let embeddings = HashMap::from([
            ("a".to_string(), vec![1.0, 0.0]),
            ("b".to_string(), vec![1.0, 0.0, 0.0]),
        ]);
        let err = MmrDiversifier::default()
            .diversify(input, 2, Some(&embeddings))
            .unwrap_err();
        assert!(matches!(err, LecternError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_invalid_lambda() {
        assert!(MmrDiversifier::new(-0.1).is_err());
    }
}
