//! Reciprocal Rank Fusion.
//!
//! RRF merges ranked lists using only ranks, so lexical and dense scores on
//! incomparable scales can be combined.
//! Formula: `RRF_score(d) = Σ w_s / (k + rank_s(d))` with 1-based ranks.

use lectern_core::{RankSource, RankedResult, RetrievalResult};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Default smoothing constant.
pub const DEFAULT_RRF_K: f32 = 60.0;

/// Reciprocal Rank Fusion with optional per-source weights.
#[derive(Debug, Clone)]
pub struct ReciprocalRankFusion {
    /// Smoothing constant damping the influence of top ranks.
    pub k: f32,

    weights: HashMap<RankSource, f32>,
}

impl Default for ReciprocalRankFusion {
    fn default() -> Self {
        Self::new(DEFAULT_RRF_K)
    }
}

struct FusedEntry {
    result: RetrievalResult,
    score: f32,
    sources: Vec<String>,
}

impl ReciprocalRankFusion {
    /// Create a fuser with smoothing constant `k`.
    #[must_use]
    pub fn new(k: f32) -> Self {
        Self {
            k,
            weights: HashMap::new(),
        }
    }

    /// Weight the contributions of `source`. Unweighted sources count 1.0.
    #[must_use]
    pub fn with_weight(mut self, source: RankSource, weight: f32) -> Self {
        self.weights.insert(source, weight);
        self
    }

    /// Weight applied to `source`.
    pub fn weight_for(&self, source: &RankSource) -> f32 {
        self.weights.get(source).copied().unwrap_or(1.0)
    }

    /// Contribution of a single 1-based rank.
    #[must_use]
    pub fn rrf_score(&self, rank: usize, weight: f32) -> f32 {
        weight / (self.k + rank as f32)
    }

    /// Fuse rank lists into `(id, score)` pairs, best first.
    ///
    /// An id appearing twice in one list only counts at its best rank.
    pub fn fuse_ranked(&self, lists: &[Vec<RankedResult>]) -> Vec<(String, f32)> {
        let mut scores: HashMap<String, f32> = HashMap::new();

        for list in lists {
            let mut seen = HashSet::new();
            for item in list {
                if !seen.insert(item.id.as_str()) {
                    continue;
                }
                *scores.entry(item.id.clone()).or_insert(0.0) +=
                    self.rrf_score(item.rank, self.weight_for(&item.source));
            }
        }

        let mut fused: Vec<(String, f32)> = scores.into_iter().collect();
        fused.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        fused
    }

    /// Fuse retrieval result lists, one per source.
    ///
    /// Each output carries the union of matched terms across sources. Its
    /// metadata records `fused_sources` plus `<source>_rank` for every list
    /// the material appeared in.
    pub fn fuse(&self, lists: Vec<(RankSource, Vec<RetrievalResult>)>) -> Vec<RetrievalResult> {
        let list_sizes: Vec<usize> = lists.iter().map(|(_, results)| results.len()).collect();
        let mut entries: HashMap<String, FusedEntry> = HashMap::new();

        for (source, results) in lists {
            let weight = self.weight_for(&source);
            let label = source.label().to_string();

            for (index, result) in results.into_iter().enumerate() {
                let rank = index + 1;
                let contribution = self.rrf_score(rank, weight);
                let id = result.material.id.clone();

                match entries.get_mut(&id) {
                    Some(entry) if entry.sources.contains(&label) => {}
                    Some(entry) => {
                        entry.score += contribution;
                        entry.sources.push(label.clone());
                        entry
                            .result
                            .metadata
                            .insert(format!("{label}_rank"), rank.into());
                        for term in result.matched_terms {
                            if !entry.result.matched_terms.contains(&term) {
                                entry.result.matched_terms.push(term);
                            }
                        }
                    }
                    None => {
                        let mut merged = RetrievalResult::new(result.material, 0.0)
                            .with_matched_terms(result.matched_terms)
                            .with_metadata(format!("{label}_rank"), rank);
                        merged.metadata.insert("retriever".to_string(), "hybrid".into());
                        entries.insert(
                            id,
                            FusedEntry {
                                result: merged,
                                score: contribution,
                                sources: vec![label.clone()],
                            },
                        );
                    }
                }
            }
        }

        let mut fused: Vec<FusedEntry> = entries.into_values().collect();
        fused.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.result.material.id.cmp(&b.result.material.id))
        });

        debug!(
            "RRF fused {} unique results from lists of sizes {:?} (k={})",
            fused.len(),
            list_sizes,
            self.k
        );

        fused
            .into_iter()
            .map(|entry| {
                let mut result = entry.result;
                result.score = entry.score;
                result
                    .metadata
                    .insert("fused_sources".to_string(), entry.sources.into());
                result
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use lectern_core::Material;
    use std::sync::Arc;

    fn result(id: &str, score: f32, terms: &[&str]) -> RetrievalResult {
        RetrievalResult::new(Arc::new(Material::new(id, "c", id, "text")), score)
            .with_matched_terms(terms.iter().map(ToString::to_string).collect())
    }

    #[test]
    fn test_document_in_both_lists_ranks_first() {
        let fusion = ReciprocalRankFusion::default();
        let lexical = vec![result("a", 9.0, &["x"]), result("b", 5.0, &[])];
        let dense = vec![result("c", 0.9, &[]), result("b", 0.8, &["y"])];

        let fused = fusion.fuse(vec![
            (RankSource::Lexical, lexical),
            (RankSource::Dense, dense),
        ]);

        assert_eq!(fused.len(), 3);
        assert_eq!(fused[0].id(), "b");
        assert_relative_eq!(fused[0].score, 2.0 / 62.0);
        assert_eq!(fused[0].matched_terms, vec!["y".to_string()]);
        assert_eq!(
            fused[0].metadata.get("fused_sources"),
            Some(&serde_json::json!(["lexical", "dense"]))
        );
        assert_eq!(fused[0].metadata.get("dense_rank"), Some(&serde_json::json!(2)));
    }

    #[test]
    fn test_single_list_contribution() {
        let fusion = ReciprocalRankFusion::new(60.0);
        let fused = fusion.fuse(vec![(RankSource::Lexical, vec![result("a", 1.0, &[])])]);
        assert_relative_eq!(fused[0].score, 1.0 / 61.0);
    }

    #[test]
    fn test_matched_terms_are_unioned() {
        let fusion = ReciprocalRankFusion::default();
        let fused = fusion.fuse(vec![
            (RankSource::Lexical, vec![result("a", 1.0, &["x", "y"])]),
            (RankSource::Dense, vec![result("a", 1.0, &["y", "z"])]),
        ]);
        assert_eq!(fused[0].matched_terms, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_weights_shift_ranking() {
        let fusion = ReciprocalRankFusion::default().with_weight(RankSource::Dense, 3.0);
        let fused = fusion.fuse(vec![
            (RankSource::Lexical, vec![result("a", 1.0, &[])]),
            (RankSource::Dense, vec![result("b", 1.0, &[])]),
        ]);
        assert_eq!(fused[0].id(), "b");
    }

    #[test]
    fn test_fuse_ranked_deduplicates_within_list() {
        let fusion = ReciprocalRankFusion::default();
        let ranked = vec![
            RankedResult {
                id: "a".into(),
                rank: 1,
                score: 1.0,
                source: RankSource::Lexical,
            },
            RankedResult {
                id: "a".into(),
                rank: 2,
                score: 0.5,
                source: RankSource::Lexical,
            },
        ];
        let fused = fusion.fuse_ranked(&[ranked]);
        assert_eq!(fused.len(), 1);
        assert_relative_eq!(fused[0].1, 1.0 / 61.0);
    }
}
