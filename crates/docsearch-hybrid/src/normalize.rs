//! Display percentages for raw engine scores.

use docsearch_core::config::SearchMode;
use docsearch_core::types::SearchHit;

fn round2(x: f32) -> f32 {
    (x * 100.0).round() / 100.0
}

/// Pure semantic scores are `cosine + 1`; maps them onto `-100..=100`.
pub fn semantic_percent(score: f32) -> f32 {
    round2((score - 1.0) * 100.0)
}

/// Min-max scaling over one result batch. A batch of equal scores maps to 100.
pub fn min_max_percent(scores: &[f32]) -> Vec<f32> {
    let min = scores.iter().copied().fold(f32::INFINITY, f32::min);
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = max - min;
    scores
        .iter()
        .map(|s| if range > f32::EPSILON { round2((s - min) / range * 100.0) } else { 100.0 })
        .collect()
}

/// Percentages aligned with `hits`, using the scale that fits `mode`.
pub fn percentages(mode: SearchMode, hits: &[SearchHit]) -> Vec<f32> {
    match mode {
        SearchMode::Fanout => hits.iter().map(|h| semantic_percent(h.score)).collect(),
        SearchMode::Hybrid => min_max_percent(&hits.iter().map(|h| h.score).collect::<Vec<_>>()),
    }
}
