//! Heuristic query confidence scoring.

use async_trait::async_trait;
use lectern_core::{
    ConfidenceFactor, ConfidenceScore, Material, Result,
    config::ConfidenceThresholds,
    traits::ConfidenceScorer,
    utils::tokenize,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

const BASE_SCORE: f32 = 50.0;
const MAX_VOCABULARY_BONUS: f32 = 30.0;
const VAGUE_TERM_PENALTY: f32 = 8.0;
const MAX_VAGUE_PENALTY: f32 = 24.0;

/// Openers marking a direct question.
const INTERROGATIVES: &[&str] = &[
    "are", "can", "define", "describe", "does", "explain", "how", "is", "what", "when", "where",
    "which", "who", "why",
];

/// Words signalling an under-specified query.
const VAGUE_TERMS: &[&str] = &[
    "anything", "etc", "somehow", "something", "stuff", "thing", "things", "whatever",
];

/// Pronouns that only make sense with prior conversation.
const FOLLOW_UP_PRONOUNS: &[&str] = &["it", "that", "them", "these", "they", "this", "those"];

/// Number of leading words inspected for an unresolved pronoun.
const FOLLOW_UP_WINDOW: usize = 3;

/// Scores queries by length, form, course vocabulary coverage and vagueness.
///
/// The score starts at 50 and each applicable heuristic adds or subtracts a
/// fixed amount; every applied adjustment is reported as a
/// [`ConfidenceFactor`]. The final score is clamped to `0..=100`.
#[derive(Debug, Clone)]
pub struct HeuristicConfidenceScorer {
    thresholds: ConfidenceThresholds,
    vocabulary: HashSet<String>,
}

impl HeuristicConfidenceScorer {
    /// Create a scorer with no course vocabulary.
    pub fn new(thresholds: ConfidenceThresholds) -> Result<Self> {
        thresholds.validate()?;
        Ok(Self {
            thresholds,
            vocabulary: HashSet::new(),
        })
    }

    /// Build the course vocabulary from material titles and keywords.
    pub fn from_materials(
        materials: &[Arc<Material>],
        thresholds: ConfidenceThresholds,
    ) -> Result<Self> {
        let terms = materials.iter().flat_map(|material| {
            let mut terms = tokenize(&material.title);
            for keyword in &material.keywords {
                terms.extend(tokenize(keyword));
            }
            terms
        });
        Ok(Self::new(thresholds)?.with_vocabulary(terms))
    }

    /// Add terms to the course vocabulary. Terms are tokenized first.
    #[must_use]
    pub fn with_vocabulary<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for term in terms {
            self.vocabulary.extend(tokenize(term.as_ref()));
        }
        self
    }

    /// Number of distinct vocabulary terms.
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Score `query` synchronously.
    pub fn evaluate(&self, query: &str, history: &[String]) -> ConfidenceScore {
        let words: Vec<String> = query
            .split_whitespace()
            .map(|word| {
                word.trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase()
            })
            .filter(|word| !word.is_empty())
            .collect();

        let mut factors = Vec::new();
        let mut push = |name: &str, delta: f32| {
            factors.push(ConfidenceFactor {
                name: name.to_string(),
                delta,
            });
        };

        let word_count = words.len();
        if word_count < 3 {
            push("too_short", -20.0);
        } else if word_count > 80 {
            push("too_long", -10.0);
        } else if (5..=40).contains(&word_count) {
            push("good_length", 10.0);
        }

        let is_question = query.trim_end().ends_with('?')
            || words
                .first()
                .is_some_and(|first| INTERROGATIVES.contains(&first.as_str()));
        if is_question {
            push("question_form", 5.0);
        }

        let tokens = tokenize(query);
        if !self.vocabulary.is_empty() && !tokens.is_empty() {
            let covered = tokens
                .iter()
                .filter(|token| self.vocabulary.contains(*token))
                .count();
            if covered > 0 {
                let coverage = covered as f32 / tokens.len() as f32;
                push("course_vocabulary", MAX_VOCABULARY_BONUS * coverage);
            }
        }

        let vague = words
            .iter()
            .filter(|word| VAGUE_TERMS.contains(&word.as_str()))
            .count();
        if vague > 0 {
            let penalty = (vague as f32 * VAGUE_TERM_PENALTY).min(MAX_VAGUE_PENALTY);
            push("vague_terms", -penalty);
        }

        let unresolved_pronoun = words
            .iter()
            .take(FOLLOW_UP_WINDOW)
            .any(|word| FOLLOW_UP_PRONOUNS.contains(&word.as_str()));
        if history.is_empty() && unresolved_pronoun {
            push("missing_context", -10.0);
        }

        let raw: f32 = BASE_SCORE + factors.iter().map(|f| f.delta).sum::<f32>();
        let score = raw.clamp(0.0, 100.0);
        let level = self.thresholds.level_for(score);

        debug!("Confidence {:.1} ({}) for query: {}", score, level, query);
        ConfidenceScore {
            score,
            level,
            factors,
        }
    }
}

#[async_trait]
impl ConfidenceScorer for HeuristicConfidenceScorer {
    async fn score(&self, query: &str, history: &[String]) -> Result<ConfidenceScore> {
        Ok(self.evaluate(query, history))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use lectern_core::ConfidenceLevel;

    fn scorer() -> HeuristicConfidenceScorer {
        HeuristicConfidenceScorer::new(ConfidenceThresholds::default())
            .unwrap()
            .with_vocabulary(["recursion", "base case", "stack frame"])
    }

    fn factor(score: &ConfidenceScore, name: &str) -> Option<f32> {
        score.factors.iter().find(|f| f.name == name).map(|f| f.delta)
    }

    #[test]
    fn test_specific_question_scores_high() {
        let score = scorer().evaluate("What is the base case in recursion?", &[]);
        assert_relative_eq!(score.score, 95.0);
        assert_eq!(score.level, ConfidenceLevel::High);
    }

    #[test]
    fn test_short_query_penalized() {
        let score = scorer().evaluate("help", &[]);
        assert_eq!(factor(&score, "too_short"), Some(-20.0));
        assert_eq!(score.level, ConfidenceLevel::Low);
    }

    #[test]
    fn test_vague_penalty_is_capped() {
        let score = scorer().evaluate(
            "something about stuff and things or whatever else matters",
            &[],
        );
        assert_eq!(factor(&score, "vague_terms"), Some(-24.0));
    }

    #[test]
    fn test_pronoun_without_history() {
        let query = "explain it again please with more detail";
        let without = scorer().evaluate(query, &[]);
        let with = scorer().evaluate(query, &["What is recursion?".to_string()]);

        assert_eq!(factor(&without, "missing_context"), Some(-10.0));
        assert_eq!(factor(&with, "missing_context"), None);
        assert!(with.score > without.score);
    }

    #[test]
    fn test_score_is_clamped() {
        let long_vague = "something stuff things ".repeat(30);
        let score = scorer().evaluate(&long_vague, &[]);
        assert!(score.score >= 0.0);
        assert!(score.score <= 100.0);
    }

    #[test]
    fn test_vocabulary_from_materials() {
        let materials = vec![Arc::new(
            Material::new("m", "c", "Dynamic Programming", "")
                .with_keywords(["memoization"]),
        )];
        let scorer =
            HeuristicConfidenceScorer::from_materials(&materials, ConfidenceThresholds::default())
                .unwrap();
        assert_eq!(scorer.vocabulary_size(), 3);
    }
}
