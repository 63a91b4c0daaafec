// 🎯 Scorer - keyword hits → confidence

use super::dictionary::KeywordSet;
use serde::{Deserialize, Serialize};

/// Confidence thresholds. Defaults reproduce the production weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Floor of any keyword-derived confidence
    pub base_confidence: f64,

    /// Added per distinct matched keyword
    pub per_match: f64,

    /// Upper cap for keyword-derived confidence
    pub max_confidence: f64,

    /// How many alternatives to offer
    pub max_alternatives: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            base_confidence: 0.3,
            per_match: 0.15,
            max_confidence: 0.95,
            max_alternatives: 3,
        }
    }
}

impl ScoringConfig {
    /// `min(base + n * per_match, max)`
    pub fn confidence_for(&self, match_count: usize) -> f64 {
        (self.base_confidence + match_count as f64 * self.per_match).min(self.max_confidence)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCategory {
    pub label: String,
    pub confidence: f64,
}

/// Number of distinct keywords contained in `lowered`.
///
/// Plain substring containment: "gas" matches "las vegas".
pub fn match_count(lowered: &str, keywords: &[String]) -> usize {
    keywords
        .iter()
        .filter(|keyword| lowered.contains(keyword.as_str()))
        .count()
}

/// Score every label, dropping the ones with no hits.
/// Output keeps dictionary order.
pub fn score_all(description: &str, sets: &[KeywordSet], config: &ScoringConfig) -> Vec<ScoredCategory> {
    let lowered = description.to_lowercase();

    sets.iter()
        .filter_map(|set| {
            let hits = match_count(&lowered, &set.keywords);
            (hits > 0).then(|| ScoredCategory {
                label: set.label.clone(),
                confidence: config.confidence_for(hits),
            })
        })
        .collect()
}

/// Highest confidence first. Stable, so equal scores stay in dictionary order.
pub fn rank(mut scored: Vec<ScoredCategory>) -> Vec<ScoredCategory> {
    scored.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    scored
}
