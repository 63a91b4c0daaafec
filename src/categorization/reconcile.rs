// 🔗 Reconciler - map dictionary labels onto the user's own categories

use super::dictionary::OTHER_LABEL;
use super::scorer::ScoredCategory;
use crate::entities::UserCategory;

/// Confidence of any fallback pick, independent of the scoring weights
pub const FALLBACK_CONFIDENCE: f64 = 0.3;

/// Pick the category to suggest.
///
/// `ranked` is highest-confidence first. The first ranked label that is also
/// a candidate name (exact, case-sensitive) wins with its own confidence.
/// When no label matched at all, "Other" is kept if the user owns a category
/// with that name. Everything else falls back to the first candidate at
/// [`FALLBACK_CONFIDENCE`].
pub fn reconcile(ranked: &[ScoredCategory], candidates: &[UserCategory]) -> (String, f64) {
    let owns = |name: &str| candidates.iter().any(|c| c.name == name);

    if ranked.is_empty() {
        if owns(OTHER_LABEL) {
            return (OTHER_LABEL.to_string(), FALLBACK_CONFIDENCE);
        }
    } else if let Some(hit) = ranked.iter().find(|scored| owns(scored.label.as_str())) {
        return (hit.label.clone(), hit.confidence);
    }

    match candidates.first() {
        Some(first) => (first.name.clone(), FALLBACK_CONFIDENCE),
        None => (OTHER_LABEL.to_string(), FALLBACK_CONFIDENCE),
    }
}

/// Other candidate names for manual override: original order, without the
/// chosen category or repeats, at most `limit`.
pub fn alternatives(candidates: &[UserCategory], chosen: &str, limit: usize) -> Vec<String> {
    let mut picked: Vec<String> = Vec::with_capacity(limit);

    for candidate in candidates {
        if picked.len() == limit {
            break;
        }
        if candidate.name == chosen || picked.contains(&candidate.name) {
            continue;
        }
        picked.push(candidate.name.clone());
    }

    picked
}
