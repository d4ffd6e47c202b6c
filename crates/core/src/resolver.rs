//! Semantic product resolution.
//!
//! The decision procedure is pure: given a query embedding and a candidate
//! slice it either commits to a single confident match, returns an explicit
//! disambiguation set, or reports no match. It never auto-picks among
//! near-ties; that choice always goes back to the caller.

use serde::{Deserialize, Serialize};

use crate::domain::product::Product;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Minimum cosine similarity for a candidate to survive at all.
    pub similarity_threshold: f32,
    /// Maximum rank1-rank2 score margin that still counts as a near-tie.
    pub ambiguity_gap: f32,
    /// Maximum number of candidates returned in an ambiguous set.
    pub limit: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { similarity_threshold: 0.50, ambiguity_gap: 0.08, limit: 5 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredProduct {
    pub product: Product,
    pub score: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Resolution {
    Found { product: Product, score: f32 },
    Ambiguous { candidates: Vec<ScoredProduct> },
    NotFound,
}

/// Cosine similarity over two vectors. Mismatched lengths and zero-norm
/// vectors score 0 rather than dividing by zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Score every candidate with a stored embedding, keep those at or above the
/// threshold, and decide FOUND / AMBIGUOUS / NOT_FOUND. The caller is
/// expected to have pre-filtered by stock and category; candidates without an
/// embedding score 0 and drop below any sane threshold.
pub fn resolve(query_embedding: &[f32], candidates: &[Product], config: &ResolverConfig) -> Resolution {
    let mut scored: Vec<ScoredProduct> = candidates
        .iter()
        .map(|product| {
            let score = product
                .embedding
                .as_deref()
                .map(|embedding| cosine_similarity(query_embedding, embedding))
                .unwrap_or(0.0);
            ScoredProduct { product: product.clone(), score }
        })
        .filter(|scored| scored.score >= config.similarity_threshold)
        .collect();

    // Stable sort keeps input order for tied scores.
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(config.limit);

    match scored.len() {
        0 => Resolution::NotFound,
        1 => {
            let best = scored.remove(0);
            Resolution::Found { product: best.product, score: best.score }
        }
        _ => {
            let gap = scored[0].score - scored[1].score;
            if gap <= config.ambiguity_gap {
                Resolution::Ambiguous { candidates: scored }
            } else {
                let best = scored.remove(0);
                Resolution::Found { product: best.product, score: best.score }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::product::{Product, ProductId, ProductKind};

    use super::{cosine_similarity, resolve, Resolution, ResolverConfig};

    fn product(id: &str, embedding: Option<Vec<f32>>) -> Product {
        Product {
            id: ProductId(id.to_string()),
            name: id.to_string(),
            kind: ProductKind::Beverage,
            price: 2000,
            description: None,
            stock_quantity: 10,
            embedding,
        }
    }

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v = vec![0.2, 0.4, 0.8];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_of_zero_norm_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn clear_winner_resolves_to_found() {
        let candidates = vec![
            product("cola", Some(vec![1.0, 0.0])),
            product("cider", Some(vec![0.0, 1.0])),
        ];

        let resolution = resolve(&[1.0, 0.1], &candidates, &ResolverConfig::default());
        match resolution {
            Resolution::Found { product, score } => {
                assert_eq!(product.id.0, "cola");
                assert!(score > 0.9);
            }
            other => panic!("expected FOUND, got {other:?}"),
        }
    }

    #[test]
    fn near_ties_resolve_to_ambiguous_with_all_survivors() {
        let candidates = vec![
            product("cola-regular", Some(vec![1.0, 0.05])),
            product("cola-zero", Some(vec![1.0, 0.0])),
            product("cola-large", Some(vec![1.0, 0.08])),
        ];

        let resolution = resolve(&[1.0, 0.04], &candidates, &ResolverConfig::default());
        match resolution {
            Resolution::Ambiguous { candidates } => {
                assert_eq!(candidates.len(), 3);
                assert!(candidates[0].score - candidates[1].score <= 0.08);
                // Descending by score.
                assert!(candidates[0].score >= candidates[2].score);
            }
            other => panic!("expected AMBIGUOUS, got {other:?}"),
        }
    }

    #[test]
    fn nothing_above_threshold_resolves_to_not_found() {
        let candidates = vec![
            product("cola", Some(vec![1.0, 0.0])),
            product("no-embedding", None),
        ];

        let resolution = resolve(&[0.0, 1.0], &candidates, &ResolverConfig::default());
        assert_eq!(resolution, Resolution::NotFound);
    }

    #[test]
    fn missing_embeddings_never_match() {
        let candidates = vec![product("no-embedding", None)];
        let resolution = resolve(&[1.0, 0.0], &candidates, &ResolverConfig::default());
        assert_eq!(resolution, Resolution::NotFound);
    }

    #[test]
    fn ambiguous_set_respects_candidate_limit() {
        let candidates: Vec<_> =
            (0..8).map(|i| product(&format!("cola-{i}"), Some(vec![1.0, 0.0]))).collect();

        let config = ResolverConfig { limit: 5, ..ResolverConfig::default() };
        match resolve(&[1.0, 0.0], &candidates, &config) {
            Resolution::Ambiguous { candidates } => {
                assert_eq!(candidates.len(), 5);
                // Stable sort: ties keep catalog order.
                assert_eq!(candidates[0].product.id.0, "cola-0");
            }
            other => panic!("expected AMBIGUOUS, got {other:?}"),
        }
    }

    #[test]
    fn single_survivor_is_found_even_inside_the_gap() {
        let candidates = vec![
            product("cola", Some(vec![1.0, 0.0])),
            product("far-away", Some(vec![-1.0, 0.0])),
        ];

        let resolution = resolve(&[1.0, 0.0], &candidates, &ResolverConfig::default());
        assert!(matches!(resolution, Resolution::Found { .. }));
    }
}
