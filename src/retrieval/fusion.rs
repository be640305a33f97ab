//! Weighted reciprocal rank fusion
//!
//! Combines the lexical and dense ranked lists into one ordering. Each list
//! contributes `weight / (rrf_k + rank + 1)` per hit; a chunk present in
//! both lists accumulates both contributions. Ties are broken by first-seen
//! order with the lexical list processed first.

use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FusionError {
    #[error("Invalid weight configuration: weights must be positive")]
    InvalidWeights,
}

/// Configuration for rank fusion
#[derive(Debug, Clone)]
pub struct FusionConfig {
    /// RRF constant (typically 60)
    pub rrf_k: f32,
    /// Weight for the lexical list
    pub lexical_weight: f32,
    /// Weight for the dense list
    pub dense_weight: f32,
}

impl FusionConfig {
    pub fn new(rrf_k: f32, lexical_weight: f32, dense_weight: f32) -> Result<Self, FusionError> {
        if lexical_weight <= 0.0 || dense_weight <= 0.0 {
            return Err(FusionError::InvalidWeights);
        }
        Ok(Self {
            rrf_k,
            lexical_weight,
            dense_weight,
        })
    }
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            rrf_k: 60.0,
            lexical_weight: 0.4,
            dense_weight: 0.6,
        }
    }
}

/// Fuse two ranked `(ordinal, score)` lists into one de-duplicated ordering.
///
/// Input scores are rank-normalized away; only positions matter. The fused
/// list is sorted by accumulated score descending and is not truncated: the
/// per-list `k` bounds the inputs, not the output.
pub fn weighted_rank_fusion(
    lexical: &[(usize, f32)],
    dense: &[(usize, f32)],
    config: &FusionConfig,
) -> Vec<(usize, f32)> {
    let mut first_seen: Vec<usize> = Vec::new();
    let mut scores: HashMap<usize, f32> = HashMap::new();

    let mut accumulate = |list: &[(usize, f32)], weight: f32| {
        for (rank, (ordinal, _)) in list.iter().enumerate() {
            let contribution = weight / (config.rrf_k + rank as f32 + 1.0);
            scores
                .entry(*ordinal)
                .and_modify(|s| *s += contribution)
                .or_insert_with(|| {
                    first_seen.push(*ordinal);
                    contribution
                });
        }
    };
    accumulate(lexical, config.lexical_weight);
    accumulate(dense, config.dense_weight);

    let mut fused: Vec<(usize, f32)> = first_seen
        .into_iter()
        .map(|ordinal| (ordinal, scores[&ordinal]))
        .collect();
    // Stable sort keeps first-seen order for equal scores.
    fused.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    fused
}
